// src/board/reconciler.rs
//
// Mantém o store montado em sincronia com mudanças externas (outras abas,
// outros usuários). Não faz merge de eventos: qualquer sinal no escopo
// dispara um refetch completo. Sinais que chegam durante um refetch viram
// no máximo UM refetch extra. Mutações ainda em voo não bloqueiam o
// refetch: o `replace` do store reaplica as operações pendentes por cima.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use uuid::Uuid;

use crate::board::coordinator::Coordinator;
use crate::board::entity::{BoardEntity, ProcessScope};
use crate::realtime::{ChangeHub, ChangeSubscription, RowFilter, Table, Topic};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Refetching,
}

/// Inscrição ativa de uma view. Soltar o valor (ou chamar `unmount`)
/// encerra a tarefa e libera a inscrição no hub.
pub struct ViewSubscription {
    handle: JoinHandle<()>,
    state: watch::Receiver<SyncState>,
    refetches: Arc<AtomicU64>,
}

impl ViewSubscription {
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Quantos refetches esta inscrição já disparou.
    pub fn refetch_count(&self) -> u64 {
        self.refetches.load(Ordering::Relaxed)
    }

    pub fn unmount(self) {}
}

impl Drop for ViewSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Inscreve a view nos tópicos dados. A inscrição no hub acontece aqui,
/// antes do spawn, então nada publicado depois do retorno se perde.
///
/// Não faz o fetch inicial; a view chama `refresh` ao montar.
pub fn mount<E: BoardEntity>(coordinator: Coordinator<E>, hub: &ChangeHub, topics: Vec<Topic>) -> ViewSubscription {
    let subscription = hub.subscribe(topics);
    let (state_tx, state_rx) = watch::channel(SyncState::Idle);
    let refetches = Arc::new(AtomicU64::new(0));

    let handle = tokio::spawn(run(coordinator, subscription, state_tx, refetches.clone()));

    ViewSubscription { handle, state: state_rx, refetches }
}

async fn run<E: BoardEntity>(
    coordinator: Coordinator<E>,
    mut subscription: ChangeSubscription,
    state: watch::Sender<SyncState>,
    refetches: Arc<AtomicU64>,
) {
    while subscription.recv().await.is_some() {
        // Tudo que já está na fila é coberto por este refetch.
        subscription.drain();
        loop {
            state.send_replace(SyncState::Refetching);
            refetches.fetch_add(1, Ordering::Relaxed);
            // `resync` mantém o erro sinalizado por uma mutação recente; as
            // notificações das nossas próprias escritas também chegam aqui.
            if let Err(err) = coordinator.resync().await {
                // O store já guardou a mensagem; o próximo sinal tenta de novo.
                tracing::warn!(entity = E::LABEL, error = %err, "refetch por notificação falhou");
            }
            if !subscription.drain() {
                break;
            }
        }
        state.send_replace(SyncState::Idle);
    }
    tracing::debug!(entity = E::LABEL, "hub encerrado, reconciliação parada");
}

// --- Tópicos de cada view ---

pub fn company_topics() -> Vec<Topic> {
    vec![Topic::table(Table::Companies)]
}

/// Progresso vem das tarefas, então a lista de processos também escuta
/// `tasks` (sem filtro: o evento de tarefa não carrega a empresa).
pub fn process_topics(scope: &ProcessScope) -> Vec<Topic> {
    let processes = match scope.company_id {
        Some(company_id) => Topic::filtered(Table::Processes, RowFilter::Company(company_id)),
        None => Topic::table(Table::Processes),
    };
    vec![processes, Topic::table(Table::Tasks)]
}

pub fn task_topics(process_id: Uuid) -> Vec<Topic> {
    vec![Topic::filtered(Table::Tasks, RowFilter::Process(process_id))]
}

impl<E: BoardEntity> Coordinator<E> {
    pub fn watch(&self, hub: &ChangeHub, topics: Vec<Topic>) -> ViewSubscription {
        mount(self.clone(), hub, topics)
    }
}
