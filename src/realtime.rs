// src/realtime.rs
//
// Transporte de notificações de mudança. O banco publica em
// `pg_notify('table_changes', ...)`; um listener repassa para o hub em
// memória; quem se inscreve filtra por {tabela, filtro de linha opcional}.
// O conteúdo do evento é só dica de escopo: quem recebe refaz o fetch.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgListener, PgPool};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

pub const PG_CHANNEL: &str = "table_changes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Companies,
    Processes,
    Tasks,
}

/// Payload do NOTIFY. `company_id` vem em linhas de processo,
/// `process_id` em linhas de tarefa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TableChange {
    pub table: Table,
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub company_id: Option<Uuid>,
    #[serde(default)]
    pub process_id: Option<Uuid>,
}

impl TableChange {
    pub fn new(table: Table, id: Uuid) -> Self {
        Self { table, id: Some(id), company_id: None, process_id: None }
    }

    pub fn with_company(mut self, company_id: Option<Uuid>) -> Self {
        self.company_id = company_id;
        self
    }

    pub fn with_process(mut self, process_id: Uuid) -> Self {
        self.process_id = Some(process_id);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFilter {
    Company(Uuid),
    Process(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    pub table: Table,
    pub filter: Option<RowFilter>,
}

impl Topic {
    pub fn table(table: Table) -> Self {
        Self { table, filter: None }
    }

    pub fn filtered(table: Table, filter: RowFilter) -> Self {
        Self { table, filter: Some(filter) }
    }

    pub fn matches(&self, change: &TableChange) -> bool {
        if self.table != change.table {
            return false;
        }
        match self.filter {
            None => true,
            Some(RowFilter::Company(id)) => change.company_id == Some(id),
            Some(RowFilter::Process(id)) => change.process_id == Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Changed(TableChange),
    /// O receptor ficou para trás e perdeu eventos: trate como "mudou tudo".
    Lagged,
}

#[derive(Clone)]
pub struct ChangeHub {
    tx: broadcast::Sender<TableChange>,
}

impl ChangeHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, change: TableChange) {
        // Sem inscritos o envio "falha"; não é erro.
        let _ = self.tx.send(change);
    }

    pub fn subscribe(&self, topics: Vec<Topic>) -> ChangeSubscription {
        ChangeSubscription { rx: self.tx.subscribe(), topics }
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(256)
    }
}

pub struct ChangeSubscription {
    rx: broadcast::Receiver<TableChange>,
    topics: Vec<Topic>,
}

impl ChangeSubscription {
    fn wants(&self, change: &TableChange) -> bool {
        self.topics.iter().any(|t| t.matches(change))
    }

    /// Próximo sinal do escopo. `None` quando o hub foi encerrado.
    pub async fn recv(&mut self) -> Option<Signal> {
        loop {
            match self.rx.recv().await {
                Ok(change) if self.wants(&change) => return Some(Signal::Changed(change)),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "inscrição atrasada, eventos descartados");
                    return Some(Signal::Lagged);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Consome o que já está na fila sem esperar. Retorna se algo do escopo
    /// (ou um atraso) apareceu.
    pub fn drain(&mut self) -> bool {
        let mut relevant = false;
        loop {
            match self.rx.try_recv() {
                Ok(change) => relevant |= self.wants(&change),
                Err(TryRecvError::Lagged(_)) => relevant = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return relevant,
            }
        }
    }
}

/// Liga o LISTEN do Postgres ao hub. Reconecta sozinho se a conexão cair.
pub fn spawn_pg_listener(pool: PgPool, hub: ChangeHub) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = forward_notifications(&pool, &hub).await {
                tracing::error!("🔥 Listener de notificações caiu: {:?}", e);
            }
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    })
}

async fn forward_notifications(pool: &PgPool, hub: &ChangeHub) -> Result<(), AppError> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(PG_CHANNEL).await?;
    tracing::info!("📡 Escutando notificações em '{}'", PG_CHANNEL);

    loop {
        let notification = listener.recv().await?;
        match serde_json::from_str::<TableChange>(notification.payload()) {
            Ok(change) => hub.publish(change),
            Err(e) => tracing::warn!("Payload de notificação inválido: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_filters_by_row_scope() {
        let process = Uuid::new_v4();
        let topic = Topic::filtered(Table::Tasks, RowFilter::Process(process));

        let same = TableChange::new(Table::Tasks, Uuid::new_v4()).with_process(process);
        let other = TableChange::new(Table::Tasks, Uuid::new_v4()).with_process(Uuid::new_v4());
        let wrong_table = TableChange::new(Table::Processes, process);

        assert!(topic.matches(&same));
        assert!(!topic.matches(&other));
        assert!(!topic.matches(&wrong_table));
        assert!(Topic::table(Table::Tasks).matches(&other));
    }

    #[test]
    fn parses_the_notify_payload() {
        let company = Uuid::new_v4();
        let id = Uuid::new_v4();
        let payload = format!(r#"{{"table": "processes", "id": "{id}", "company_id": "{company}"}}"#);
        let change: TableChange = serde_json::from_str(&payload).unwrap();
        assert_eq!(change, TableChange::new(Table::Processes, id).with_company(Some(company)));
    }

    #[tokio::test]
    async fn subscription_skips_out_of_scope_events() {
        let hub = ChangeHub::new(16);
        let mut sub = hub.subscribe(vec![Topic::table(Table::Companies)]);

        hub.publish(TableChange::new(Table::Tasks, Uuid::new_v4()));
        let wanted = TableChange::new(Table::Companies, Uuid::new_v4());
        hub.publish(wanted.clone());

        assert_eq!(sub.recv().await, Some(Signal::Changed(wanted)));
        assert!(!sub.drain());
    }

    #[tokio::test]
    async fn lagging_counts_as_a_change() {
        let hub = ChangeHub::new(2);
        let mut sub = hub.subscribe(vec![Topic::table(Table::Tasks)]);
        for _ in 0..5 {
            hub.publish(TableChange::new(Table::Companies, Uuid::new_v4()));
        }
        assert!(sub.drain());
    }
}
