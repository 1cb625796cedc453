//! Núcleo do quadro: store em memória, motor de ordenação, coordenador de
//! mutações otimistas e reconciliação por notificações de mudança.
//!
//! Fluxo: ação do usuário -> `ordering` calcula o estado alvo ->
//! `coordinator` aplica no `store` e persiste pela `source` -> sucesso
//! confirma / falha desfaz. Em paralelo o `reconciler` escuta mudanças
//! externas e refaz o fetch do escopo inteiro.

pub mod coordinator;
pub mod entity;
pub mod memory;
pub mod ordering;
pub mod progress;
pub mod reconciler;
pub mod source;
pub mod store;

pub use coordinator::Coordinator;
pub use entity::{BoardEntity, HasStatus, InsertAt, ProcessScope};
pub use memory::MemorySource;
pub use ordering::{Column, Move, Placement};
pub use reconciler::{company_topics, process_topics, task_topics, SyncState, ViewSubscription};
pub use source::DataSource;
pub use store::{EntityStore, Snapshot};
