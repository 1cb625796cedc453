// src/board/source.rs
//
// Fronteira de persistência consumida pelo coordenador e pelo reconciliador.
// Não é formato de fio: qualquer colaborador que cumpra isso serve
// (Postgres direto, memória, cliente HTTP).

use async_trait::async_trait;
use futures::future::join_all;
use uuid::Uuid;

use crate::board::entity::BoardEntity;
use crate::common::error::AppError;

#[async_trait]
pub trait DataSource<E: BoardEntity>: Send + Sync {
    /// Lista o escopo na ordem de exibição.
    async fn list(&self, scope: &E::Scope) -> Result<Vec<E>, AppError>;

    async fn get(&self, id: Uuid) -> Result<E, AppError>;

    /// O servidor atribui id e timestamps.
    async fn insert(&self, new: &E::New) -> Result<E, AppError>;

    async fn update(&self, id: Uuid, patch: &E::Patch) -> Result<E, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    /// Um resultado por item, na mesma ordem. Os updates saem todos de uma
    /// vez (não em sequência) e não há transação envolvendo o lote.
    async fn batch_update(&self, items: &[(Uuid, E::Patch)]) -> Vec<Result<E, AppError>> {
        join_all(items.iter().map(|(id, patch)| self.update(*id, patch))).await
    }
}
