// src/board/coordinator.rs
//
// Coordenador de mutações otimistas. Mesmo roteiro para toda escrita:
// validar -> capturar snapshot -> aplicar no store -> persistir ->
// confirmar (sucesso) ou restaurar o snapshot (falha).

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::board::entity::{BoardEntity, HasStatus};
use crate::board::ordering::{self, Move, Placement};
use crate::board::source::DataSource;
use crate::board::store::{EntityStore, PendingChange, SharedStore, Snapshot};
use crate::common::error::AppError;
use crate::models::task::{Task, TaskPatch, TaskPosition, TaskStatus};

pub struct Coordinator<E: BoardEntity> {
    store: SharedStore<E>,
    source: Arc<dyn DataSource<E>>,
    scope: E::Scope,
}

impl<E: BoardEntity> Clone for Coordinator<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            source: self.source.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl<E: BoardEntity> Coordinator<E> {
    pub fn new(source: Arc<dyn DataSource<E>>, scope: E::Scope) -> Self {
        Self { store: EntityStore::shared(), source, scope }
    }

    pub fn store(&self) -> &SharedStore<E> {
        &self.store
    }

    pub fn scope(&self) -> &E::Scope {
        &self.scope
    }

    /// Busca o escopo inteiro e substitui o store. Chamado pela view: limpa
    /// o erro e descarta o estado otimista que o servidor recusou.
    pub async fn refresh(&self) -> Result<(), AppError> {
        {
            let mut store = self.store.write().await;
            store.clear_error();
            store.discard_rejected();
        }
        self.load().await
    }

    /// Refetch disparado de fora (notificação de mudança, 404): o erro
    /// pendente continua visível e as operações em voo ficam por cima.
    pub async fn resync(&self) -> Result<(), AppError> {
        self.load().await
    }

    async fn load(&self) -> Result<(), AppError> {
        self.store.write().await.set_loading(true);

        match self.source.list(&self.scope).await {
            Ok(items) => {
                tracing::debug!(entity = E::LABEL, count = items.len(), "store recarregado");
                self.store.write().await.replace(items);
                Ok(())
            }
            Err(err) => {
                let mut store = self.store.write().await;
                store.set_loading(false);
                store.set_error(err.user_message());
                Err(err)
            }
        }
    }

    pub async fn create(&self, mut new: E::New) -> Result<E, AppError> {
        // Validação sempre antes de qualquer aplicação otimista.
        new.validate()?;

        let provisional_id = Uuid::new_v4();
        let (snapshot, token) = {
            let mut store = self.store.write().await;
            E::prepare_new(&mut new, store.items());
            let snapshot = store.snapshot();
            let provisional = E::provisional(provisional_id, &new, Utc::now());
            store.insert(provisional.clone(), E::INSERT_AT);
            (snapshot, store.begin(provisional_id, PendingChange::Create(provisional)))
        };

        let result = self.source.insert(&new).await;

        let mut store = self.store.write().await;
        store.finish(provisional_id, token);
        match result {
            Ok(created) => {
                store.confirm(provisional_id, created.clone());
                Ok(created)
            }
            Err(err) => {
                drop(store);
                Err(self.fail(snapshot, err, "criar").await)
            }
        }
    }

    pub async fn update(&self, id: Uuid, patch: E::Patch) -> Result<E, AppError> {
        patch.validate()?;

        let (snapshot, token) = {
            let mut store = self.store.write().await;
            let snapshot = store.snapshot();
            store.apply_patch(id, &patch);
            (snapshot, store.begin(id, PendingChange::Update(patch.clone())))
        };

        let result = self.source.update(id, &patch).await;

        let mut store = self.store.write().await;
        store.finish(id, token);
        match result {
            Ok(updated) => {
                // Absorve o que o servidor recalculou (updated_at etc).
                store.confirm(id, updated.clone());
                Ok(updated)
            }
            Err(err) => {
                drop(store);
                Err(self.fail(snapshot, err, "atualizar").await)
            }
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let (snapshot, token) = {
            let mut store = self.store.write().await;
            let snapshot = store.snapshot();
            store.remove(id);
            (snapshot, store.begin(id, PendingChange::Delete))
        };

        let result = self.source.delete(id).await;

        self.store.write().await.finish(id, token);
        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(snapshot, err, "excluir").await),
        }
    }

    /// Rollback + mensagem no store. Registro inexistente também dispara um
    /// refetch para ressincronizar.
    async fn fail(&self, snapshot: Snapshot<E>, err: AppError, action: &str) -> AppError {
        tracing::warn!(entity = E::LABEL, action, error = %err, "mutação desfeita");
        {
            let mut store = self.store.write().await;
            store.restore(snapshot);
            store.set_error(err.user_message());
        }

        if err.is_not_found() {
            if let Err(refetch_err) = self.resync().await {
                tracing::warn!(entity = E::LABEL, error = %refetch_err, "refetch após 404 falhou");
            }
            // Um refetch que falhou troca a mensagem; a falha original é a notícia.
            self.store.write().await.set_error(err.user_message());
        }
        err
    }
}

impl<E: HasStatus> Coordinator<E> {
    /// Troca de coluna (drag entre status ou edição de status).
    pub async fn update_status(&self, id: Uuid, status: E::Status) -> Result<E, AppError> {
        self.update(id, E::status_patch(status)).await
    }
}

// --- Tarefas: ordem densa por coluna ---

impl Coordinator<Task> {
    /// Realiza um arraste no quadro: calcula as posições com o motor de
    /// ordenação e envia o lote.
    pub async fn move_task(&self, mv: Move<TaskStatus>) -> Result<(), AppError> {
        let placements = {
            let store = self.store.read().await;
            let columns = ordering::task_columns(store.items());
            ordering::plan_move(&columns, &mv)
        };
        self.reorder(placements).await
    }

    /// Aplica o lote localmente e persiste cada linha concorrentemente.
    ///
    /// - todas ok: confirmado;
    /// - todas falharam: nada mudou no servidor, o snapshot é restaurado;
    /// - falha parcial: o store mantém o reorder otimista completo (sem
    ///   desfazer só o item que falhou) e o erro é sinalizado. As linhas que
    ///   passaram não são revertidas no servidor; um reorder completo
    ///   corrige a ordem persistida e um `refresh` da view passa a mostrá-la.
    pub async fn reorder(&self, placements: Vec<Placement<TaskStatus>>) -> Result<(), AppError> {
        if placements.is_empty() {
            return Ok(());
        }

        let positions: Vec<TaskPosition> = placements.into_iter().map(TaskPosition::from).collect();
        for position in &positions {
            position.validate()?;
        }
        let batch: Vec<(Uuid, TaskPatch)> =
            positions.iter().map(|p| (p.id, TaskPatch::from(*p))).collect();

        let (snapshot, tokens) = {
            let mut store = self.store.write().await;
            let snapshot = store.snapshot();
            let mut tokens = Vec::with_capacity(batch.len());
            for (id, patch) in &batch {
                store.apply_patch(*id, patch);
                tokens.push((*id, store.begin(*id, PendingChange::Reorder(patch.clone()))));
            }
            (snapshot, tokens)
        };

        let results = self.source.batch_update(&batch).await;

        let total = results.len();
        let failed = results.iter().filter(|r| r.is_err()).count();
        let mut store = self.store.write().await;

        if failed == total {
            for (id, token) in tokens {
                store.finish(id, token);
            }
            // Reaproveita o primeiro erro concreto (ex: transporte fora do ar).
            let err = results
                .into_iter()
                .find_map(Result::err)
                .unwrap_or(AppError::PartialBatchFailure { failed, total });
            drop(store);
            return Err(self.fail(snapshot, err, "reordenar").await);
        }

        // As linhas recusadas continuam pendentes: um refetch no meio do
        // caminho mostra a ordem otimista, não a duplicata do servidor.
        for ((id, token), result) in tokens.into_iter().zip(&results) {
            match result {
                Ok(_) => store.finish(id, token),
                Err(_) => store.reject(id, token),
            }
        }
        if failed == 0 {
            return Ok(());
        }

        let err = AppError::PartialBatchFailure { failed, total };
        tracing::warn!(failed, total, "reorder parcial: ordem persistida pode ter buracos");
        store.set_error(err.user_message());
        Err(err)
    }
}
