// src/board/store.rs
//
// Snapshot canônico em memória da view ativa. Toda mutação passa por uma
// operação nomeada daqui; ninguém escreve campos direto na lista.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use crate::board::entity::{BoardEntity, InsertAt};

pub type SharedStore<E> = Arc<RwLock<EntityStore<E>>>;

/// Cópia imutável para rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<E> {
    items: Vec<E>,
}

impl<E> Snapshot<E> {
    pub fn items(&self) -> &[E] {
        &self.items
    }
}

/// O que uma operação em voo fez no store. Um `replace` (refetch) reaplica
/// estas mudanças por cima das linhas do servidor.
pub enum PendingChange<E: BoardEntity> {
    Create(E),
    Update(E::Patch),
    Delete,
    Reorder(E::Patch),
}

/// Registro de uma mutação otimista ainda sem confirmação do servidor.
pub struct PendingOp<E: BoardEntity> {
    pub token: u64,
    pub change: PendingChange<E>,
    /// O servidor recusou, mas o estado otimista foi mantido (reorder
    /// parcial). Fica até um `refresh` explícito ou uma nova escrita no id.
    pub rejected: bool,
}

pub struct EntityStore<E: BoardEntity> {
    items: Vec<E>,
    // id -> posição em `items`
    index: HashMap<Uuid, usize>,
    // id (provisório, no caso de criação) -> operação em voo
    pending: HashMap<Uuid, PendingOp<E>>,
    next_token: u64,
    last_error: Option<String>,
    is_loading: bool,
    revision: watch::Sender<u64>,
}

impl<E: BoardEntity> Default for EntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BoardEntity> EntityStore<E> {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            items: Vec::new(),
            index: HashMap::new(),
            pending: HashMap::new(),
            next_token: 0,
            last_error: None,
            is_loading: false,
            revision,
        }
    }

    pub fn shared() -> SharedStore<E> {
        Arc::new(RwLock::new(Self::new()))
    }

    // --- leitura ---

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn get(&self, id: Uuid) -> Option<&E> {
        self.index.get(&id).map(|&position| &self.items[position])
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Recebe um novo número de revisão a cada mutação.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // --- mutação ---

    /// Troca a coleção inteira (resultado de um fetch) e reaplica por cima
    /// as operações ainda pendentes. Idempotente.
    pub fn replace(&mut self, items: Vec<E>) {
        self.items = items;
        self.reindex();
        self.overlay_pending();
        self.is_loading = false;
        self.bump();
    }

    /// Mescla campos na entidade; no-op se o id não existe.
    pub fn apply_patch(&mut self, id: Uuid, patch: &E::Patch) -> bool {
        let Some(&position) = self.index.get(&id) else {
            return false;
        };
        self.items[position].apply(patch);
        self.bump();
        true
    }

    pub fn insert(&mut self, entity: E, at: InsertAt) {
        self.place(entity, at);
        self.bump();
    }

    /// Remove mantendo a ordem relativa dos demais.
    pub fn remove(&mut self, id: Uuid) -> Option<E> {
        let removed = self.take(id)?;
        self.bump();
        Some(removed)
    }

    /// Troca a entidade `id` pela versão confirmada, na mesma posição.
    /// Serve tanto para trocar o id provisório pelo definitivo quanto para
    /// absorver campos calculados pelo servidor. Se um refetch já trouxe a
    /// linha definitiva, a provisória sai e a definitiva é atualizada.
    pub fn confirm(&mut self, id: Uuid, confirmed: E) -> bool {
        let final_id = confirmed.id();
        if final_id != id && self.index.contains_key(&final_id) {
            self.take(id);
            return self.confirm(final_id, confirmed);
        }

        let Some(position) = self.index.remove(&id) else {
            return false;
        };
        self.items[position] = confirmed;
        self.index.insert(final_id, position);
        self.bump();
        true
    }

    pub fn snapshot(&self) -> Snapshot<E> {
        Snapshot { items: self.items.clone() }
    }

    pub fn restore(&mut self, snapshot: Snapshot<E>) {
        self.items = snapshot.items;
        self.reindex();
        self.bump();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        self.bump();
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.bump();
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    // --- operações pendentes ---

    pub fn begin(&mut self, id: Uuid, change: PendingChange<E>) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        self.pending.insert(id, PendingOp { token, change, rejected: false });
        token
    }

    /// Encerra o registro, a menos que outra operação mais nova já tenha
    /// assumido o mesmo id.
    pub fn finish(&mut self, id: Uuid, token: u64) {
        if self.pending.get(&id).is_some_and(|op| op.token == token) {
            self.pending.remove(&id);
        }
    }

    /// Mantém o registro como recusado: o estado otimista continua valendo
    /// sobre os próximos refetches.
    pub fn reject(&mut self, id: Uuid, token: u64) {
        if let Some(op) = self.pending.get_mut(&id).filter(|op| op.token == token) {
            op.rejected = true;
        }
    }

    /// Descarta os registros recusados (o usuário pediu o estado do servidor).
    pub fn discard_rejected(&mut self) {
        self.pending.retain(|_, op| !op.rejected);
    }

    pub fn pending(&self, id: Uuid) -> Option<&PendingOp<E>> {
        self.pending.get(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn overlay_pending(&mut self) {
        let mut creates = Vec::new();
        let mut deletes = Vec::new();
        for (id, op) in &self.pending {
            match &op.change {
                PendingChange::Create(entity) => {
                    if !self.index.contains_key(id) {
                        creates.push(entity.clone());
                    }
                }
                PendingChange::Update(patch) | PendingChange::Reorder(patch) => {
                    if let Some(&position) = self.index.get(id) {
                        self.items[position].apply(patch);
                    }
                }
                PendingChange::Delete => deletes.push(*id),
            }
        }
        for id in deletes {
            self.take(id);
        }
        for entity in creates {
            self.place(entity, E::INSERT_AT);
        }
    }

    fn place(&mut self, entity: E, at: InsertAt) {
        match at {
            InsertAt::Front => {
                self.items.insert(0, entity);
                self.reindex();
            }
            InsertAt::Back => {
                self.index.insert(entity.id(), self.items.len());
                self.items.push(entity);
            }
        }
    }

    fn take(&mut self, id: Uuid) -> Option<E> {
        let position = self.index.remove(&id)?;
        let removed = self.items.remove(position);
        if position < self.items.len() {
            self.reindex();
        }
        Some(removed)
    }

    fn reindex(&mut self) {
        self.index = self.items.iter().enumerate().map(|(position, e)| (e.id(), position)).collect();
    }

    fn bump(&mut self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::task::{NewTask, Task, TaskPatch, TaskPosition, TaskStatus};

    fn task(process_id: Uuid, title: &str) -> Task {
        Task::provisional(
            Uuid::new_v4(),
            &NewTask::titled(process_id, title, TaskStatus::Todo),
            Utc::now(),
        )
    }

    #[test]
    fn patch_on_missing_id_is_a_no_op() {
        let mut store = EntityStore::<Task>::new();
        store.replace(vec![task(Uuid::new_v4(), "a")]);
        let before = store.snapshot();

        assert!(!store.apply_patch(Uuid::new_v4(), &TaskPatch::status(TaskStatus::Done)));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn remove_preserves_relative_order() {
        let p = Uuid::new_v4();
        let (a, b, c) = (task(p, "a"), task(p, "b"), task(p, "c"));
        let mut store = EntityStore::new();
        store.replace(vec![a.clone(), b.clone(), c.clone()]);

        assert_eq!(store.remove(b.id), Some(b));
        let ids: Vec<Uuid> = store.items().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[test]
    fn insert_front_and_back() {
        let p = Uuid::new_v4();
        let (a, b, c) = (task(p, "a"), task(p, "b"), task(p, "c"));
        let mut store = EntityStore::new();
        store.insert(a.clone(), InsertAt::Back);
        store.insert(b.clone(), InsertAt::Front);
        store.insert(c.clone(), InsertAt::Back);
        let titles: Vec<&str> = store.items().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a", "c"]);
    }

    #[test]
    fn snapshot_restores_structurally_equal_state() {
        let p = Uuid::new_v4();
        let a = task(p, "a");
        let mut store = EntityStore::new();
        store.replace(vec![a.clone(), task(p, "b")]);
        let snapshot = store.snapshot();

        store.apply_patch(a.id, &TaskPatch::status(TaskStatus::Done));
        store.remove(a.id);
        store.insert(task(p, "c"), InsertAt::Front);
        assert_ne!(store.snapshot(), snapshot);

        store.restore(snapshot.clone());
        assert_eq!(store.snapshot(), snapshot);
    }

    #[test]
    fn confirm_swaps_provisional_in_place() {
        let p = Uuid::new_v4();
        let provisional = task(p, "a");
        let other = task(p, "b");
        let mut store = EntityStore::new();
        store.replace(vec![provisional.clone(), other.clone()]);

        let mut persisted = provisional.clone();
        persisted.id = Uuid::new_v4();
        assert!(store.confirm(provisional.id, persisted.clone()));
        assert_eq!(store.items()[0].id, persisted.id);
        assert!(!store.contains(provisional.id));

        // Já sumiu: nada a fazer.
        assert!(!store.confirm(provisional.id, persisted));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn newer_pending_op_survives_older_finish() {
        let mut store = EntityStore::<Task>::new();
        let id = Uuid::new_v4();
        let first = store.begin(id, PendingChange::Delete);
        let second = store.begin(id, PendingChange::Delete);

        store.finish(id, first);
        assert_eq!(store.pending(id).map(|op| op.token), Some(second));

        store.finish(id, second);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn refetch_keeps_in_flight_changes_on_top() {
        let p = Uuid::new_v4();
        let (a, b, gone) = (task(p, "a"), task(p, "b"), task(p, "gone"));
        let provisional = task(p, "nova");
        let mut store = EntityStore::new();
        store.replace(vec![a.clone(), b.clone(), gone.clone()]);

        store.begin(a.id, PendingChange::Update(TaskPatch::status(TaskStatus::Done)));
        store.begin(gone.id, PendingChange::Delete);
        store.begin(provisional.id, PendingChange::Create(provisional.clone()));

        // O servidor ainda não viu nenhuma das três escritas.
        store.replace(vec![a.clone(), b.clone(), gone.clone()]);

        assert_eq!(store.get(a.id).map(|t| t.status), Some(TaskStatus::Done));
        assert!(!store.contains(gone.id));
        assert!(store.contains(provisional.id));
        assert_eq!(store.get(b.id), Some(&b));
    }

    #[test]
    fn rejected_changes_survive_until_discarded() {
        let p = Uuid::new_v4();
        let a = task(p, "a");
        let mut store = EntityStore::new();
        store.replace(vec![a.clone()]);

        let token = store.begin(a.id, PendingChange::Reorder(TaskPatch::from(TaskPosition { id: a.id, order_index: 3, status: TaskStatus::Todo })));
        store.reject(a.id, token);
        store.replace(vec![a.clone()]);
        assert_eq!(store.get(a.id).map(|t| t.order_index), Some(3));

        store.discard_rejected();
        store.replace(vec![a.clone()]);
        assert_eq!(store.get(a.id).map(|t| t.order_index), Some(a.order_index));
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn confirm_after_refetch_drops_the_provisional_copy() {
        let p = Uuid::new_v4();
        let provisional = task(p, "a");
        let mut persisted = provisional.clone();
        persisted.id = Uuid::new_v4();

        let mut store = EntityStore::new();
        store.begin(provisional.id, PendingChange::Create(provisional.clone()));
        // Refetch trouxe a linha definitiva antes da resposta do insert.
        store.replace(vec![persisted.clone()]);
        assert_eq!(store.len(), 2);

        assert!(store.confirm(provisional.id, persisted.clone()));
        assert_eq!(store.items(), &[persisted]);
    }

    #[test]
    fn loading_transition_is_observable() {
        let mut store = EntityStore::<Task>::new();
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.set_loading(true);
        assert!(rx.has_changed().unwrap_or(false));
        assert!(store.is_loading());
    }

    #[test]
    fn every_mutation_bumps_the_revision() {
        let mut store = EntityStore::<Task>::new();
        let rx = store.subscribe();
        store.replace(vec![]);
        store.insert(task(Uuid::new_v4(), "a"), InsertAt::Back);
        assert_eq!(*rx.borrow(), 2);
    }
}
