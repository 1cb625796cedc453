// src/board/ordering.rs
//
// Motor de ordenação: função pura sobre listas de ids por coluna.
// Depois de cada movimento as colunas afetadas são renumeradas 0..n-1,
// então nunca há empate nem buraco; a posição de inserção manda.

use std::collections::HashMap;
use std::hash::Hash;

use uuid::Uuid;

use crate::models::process::{ProcessStatus, ProcessWithTaskCounts};
use crate::models::task::{Task, TaskPosition, TaskStatus};

/// Uma coluna do quadro: ids em ordem crescente de `order_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column<S> {
    pub status: S,
    pub items: Vec<Uuid>,
}

impl<S> Column<S> {
    pub fn new(status: S, items: Vec<Uuid>) -> Self {
        Self { status, items }
    }
}

/// Arrastar `item` da coluna `from` para a posição `to_index` da coluna `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move<S> {
    pub item: Uuid,
    pub from: S,
    pub to: S,
    pub to_index: usize,
}

/// Atribuição resultante: {id, order_index, status}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement<S> {
    pub id: Uuid,
    pub order_index: i32,
    pub status: S,
}

impl From<Placement<TaskStatus>> for TaskPosition {
    fn from(p: Placement<TaskStatus>) -> Self {
        TaskPosition { id: p.id, order_index: p.order_index, status: p.status }
    }
}

/// Calcula todas as atribuições necessárias para realizar o movimento.
///
/// O índice de destino é a posição final do item na coluna de destino
/// (a remoção da origem acontece antes da inserção) e é limitado a
/// `[0, len]`. Mover para a mesma coluna e posição não gera nada; item
/// ausente da coluna de origem também não.
///
/// A saída cobre a coluna de destino inteira e, se a coluna mudou, o resto
/// da coluna de origem.
pub fn plan_move<S>(columns: &[Column<S>], mv: &Move<S>) -> Vec<Placement<S>>
where
    S: Copy + Eq,
{
    let Some(source) = columns.iter().find(|c| c.status == mv.from) else {
        return Vec::new();
    };
    let Some(from_index) = source.items.iter().position(|id| *id == mv.item) else {
        return Vec::new();
    };

    let mut source_items = source.items.clone();
    source_items.remove(from_index);

    if mv.from == mv.to {
        let to_index = mv.to_index.min(source_items.len());
        if to_index == from_index {
            return Vec::new();
        }
        source_items.insert(to_index, mv.item);
        return renumber(&source_items, mv.to);
    }

    let mut dest_items = columns
        .iter()
        .find(|c| c.status == mv.to)
        .map(|c| c.items.clone())
        .unwrap_or_default();
    // O item não pode aparecer duas vezes se a entrada vier inconsistente.
    dest_items.retain(|id| *id != mv.item);
    let to_index = mv.to_index.min(dest_items.len());
    dest_items.insert(to_index, mv.item);

    let mut placements = renumber(&dest_items, mv.to);
    placements.extend(renumber(&source_items, mv.from));
    placements
}

/// Posições 0..n-1 na ordem dada.
pub fn renumber<S: Copy>(items: &[Uuid], status: S) -> Vec<Placement<S>> {
    items
        .iter()
        .enumerate()
        .map(|(i, id)| Placement { id: *id, order_index: i as i32, status })
        .collect()
}

/// Agrupa tarefas em colunas, na ordem de `TaskStatus::COLUMNS`.
/// Dentro da coluna ordena por `order_index`; empates (estado não
/// assentado) caem em `created_at` e depois no id, para ser estável.
pub fn task_columns(tasks: &[Task]) -> Vec<Column<TaskStatus>> {
    group_columns(&TaskStatus::COLUMNS, tasks.iter().map(|t| {
        (t.status, (t.order_index, t.created_at, t.id), t.id)
    }))
}

/// Kanban de processos: colunas de `ProcessStatus::COLUMNS`, mantendo a
/// ordem da lista (mais recentes primeiro).
pub fn process_columns(processes: &[ProcessWithTaskCounts]) -> Vec<Column<ProcessStatus>> {
    group_columns(
        &ProcessStatus::COLUMNS,
        processes.iter().enumerate().map(|(position, p)| (p.status, position, p.id)),
    )
}

/// Agrupamento genérico: `(status, chave de ordenação, id)`.
pub fn group_columns<S, K, I>(statuses: &[S], rows: I) -> Vec<Column<S>>
where
    S: Copy + Eq + Hash,
    K: Ord,
    I: IntoIterator<Item = (S, K, Uuid)>,
{
    let mut buckets: HashMap<S, Vec<(K, Uuid)>> = HashMap::new();
    for (status, key, id) in rows {
        buckets.entry(status).or_default().push((key, id));
    }

    statuses
        .iter()
        .map(|status| {
            let mut rows = buckets.remove(status).unwrap_or_default();
            rows.sort_by(|a, b| a.0.cmp(&b.0));
            Column::new(*status, rows.into_iter().map(|(_, id)| id).collect())
        })
        .collect()
}
