// src/handlers/changes.rs
//
// Sinais de mudança para o navegador via Server-Sent Events. Cada evento
// `change` só diz QUAL escopo mudou; o cliente refaz o fetch.

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    config::AppState,
    realtime::{RowFilter, Signal, Table, TableChange, Topic},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChangesQuery {
    /// Sem tabela: escuta todas
    pub table: Option<Table>,
    /// Restringe eventos de `processes`
    pub company_id: Option<Uuid>,
    /// Restringe eventos de `tasks`
    pub process_id: Option<Uuid>,
}

impl ChangesQuery {
    pub fn topics(&self) -> Vec<Topic> {
        let tables = match self.table {
            Some(table) => vec![table],
            None => vec![Table::Companies, Table::Processes, Table::Tasks],
        };
        tables
            .into_iter()
            .map(|table| {
                let filter = match table {
                    Table::Companies => None,
                    Table::Processes => self.company_id.map(RowFilter::Company),
                    Table::Tasks => self.process_id.map(RowFilter::Process),
                };
                Topic { table, filter }
            })
            .collect()
    }
}

// GET /api/changes
#[utoipa::path(
    get,
    path = "/api/changes",
    tag = "Realtime",
    params(ChangesQuery),
    responses(
        (status = 200, description = "Stream SSE: eventos `change` e `resync`", content_type = "text/event-stream", body = TableChange)
    )
)]
pub async fn stream_changes(
    State(app_state): State<AppState>,
    Query(query): Query<ChangesQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = app_state.hub.subscribe(query.topics());

    // A inscrição vive dentro do stream: cliente desconecta, stream cai,
    // receptor é liberado.
    let events = stream::unfold(subscription, |mut subscription| async move {
        let event = match subscription.recv().await? {
            Signal::Changed(change) => Event::default()
                .event("change")
                .json_data(&change)
                .unwrap_or_else(|_| Event::default().event("resync")),
            Signal::Lagged => Event::default().event("resync").data("lagged"),
        };
        Some((Ok::<_, Infallible>(event), subscription))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_table_listens_everywhere() {
        let topics = ChangesQuery::default().topics();
        assert_eq!(topics.len(), 3);
        assert!(topics.iter().all(|t| t.filter.is_none()));
    }

    #[test]
    fn row_filter_follows_the_table() {
        let process_id = Uuid::new_v4();
        let query = ChangesQuery { table: Some(Table::Tasks), company_id: None, process_id: Some(process_id) };
        assert_eq!(query.topics(), vec![Topic::filtered(Table::Tasks, RowFilter::Process(process_id))]);
    }
}
