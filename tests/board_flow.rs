// tests/board_flow.rs
//
// Fluxos completos do quadro sobre a fonte em memória: criação otimista,
// drag com rollback, progresso derivado, reorder parcial e reconciliação.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use crm_board::board::{ordering, task_topics, Coordinator, DataSource, MemorySource, Move, ProcessScope};
use crm_board::common::error::AppError;
use crm_board::models::company::{CompanyPatch, CompanyStatus, CompanyWithStats, NewCompany};
use crm_board::models::process::{NewProcess, ProcessStatus, ProcessWithTaskCounts};
use crm_board::models::task::{NewTask, Task, TaskStatus};
use crm_board::realtime::ChangeHub;

fn crm_columns(companies: &[CompanyWithStats]) -> Vec<ordering::Column<CompanyStatus>> {
    ordering::group_columns(
        &CompanyStatus::CRM_COLUMNS,
        companies
            .iter()
            .enumerate()
            .map(|(position, c)| (c.company.status, position, c.company.id)),
    )
}

async fn process_board(source: &MemorySource) -> (Uuid, Coordinator<Task>) {
    let process = DataSource::<ProcessWithTaskCounts>::insert(source, &NewProcess::titled(None, "Implantação"))
        .await
        .unwrap();
    let board: Coordinator<Task> = Coordinator::new(Arc::new(source.clone()), process.id);
    (process.id, board)
}

#[tokio::test]
async fn created_company_leads_the_lead_column() {
    let source = MemorySource::new();
    let board: Coordinator<CompanyWithStats> = Coordinator::new(Arc::new(source.clone()), ());
    board.create(NewCompany::named("Beta", CompanyStatus::Lead)).await.unwrap();

    let acme = board.create(NewCompany::named("Acme", CompanyStatus::Lead)).await.unwrap();
    assert_eq!(acme.company.status, CompanyStatus::Lead);
    assert!(!acme.company.id.is_nil());

    let store = board.store().read().await;
    let columns = crm_columns(store.items());
    assert_eq!(columns[0].status, CompanyStatus::Lead);
    assert_eq!(columns[0].items.first(), Some(&acme.company.id));

    // Um refetch devolve a mesma ordem (mais recentes primeiro).
    drop(store);
    board.refresh().await.unwrap();
    let store = board.store().read().await;
    assert_eq!(crm_columns(store.items())[0].items.first(), Some(&acme.company.id));
}

#[tokio::test]
async fn failed_drag_reverts_the_company_to_its_column() {
    let source = MemorySource::new();
    let board: Coordinator<CompanyWithStats> = Coordinator::new(Arc::new(source.clone()), ());
    let acme = board.create(NewCompany::named("Acme", CompanyStatus::Lead)).await.unwrap();

    // O PATCH de um drag carrega só o status.
    assert_eq!(
        serde_json::to_value(CompanyPatch::status(CompanyStatus::Proposal)).unwrap(),
        json!({ "status": "proposal" })
    );

    source.set_offline(true);
    let before = board.store().read().await.snapshot();
    assert!(board.update_status(acme.company.id, CompanyStatus::Proposal).await.is_err());

    let store = board.store().read().await;
    assert_eq!(store.snapshot(), before);
    assert_eq!(store.get(acme.company.id).map(|c| c.company.status), Some(CompanyStatus::Lead));
    assert!(store.last_error().is_some());
}

#[tokio::test]
async fn successful_drag_moves_the_company() {
    let source = MemorySource::new();
    let board: Coordinator<CompanyWithStats> = Coordinator::new(Arc::new(source.clone()), ());
    let acme = board.create(NewCompany::named("Acme", CompanyStatus::Lead)).await.unwrap();

    board.update_status(acme.company.id, CompanyStatus::Proposal).await.unwrap();

    let persisted = DataSource::<CompanyWithStats>::get(&source, acme.company.id).await.unwrap();
    assert_eq!(persisted.company.status, CompanyStatus::Proposal);
    let store = board.store().read().await;
    let proposal = &crm_columns(store.items())[2];
    assert_eq!(proposal.status, CompanyStatus::Proposal);
    assert_eq!(proposal.items, vec![acme.company.id]);
}

#[tokio::test]
async fn progress_is_half_with_two_of_four_done() {
    let source = MemorySource::new();
    let (process_id, board) = process_board(&source).await;

    for (title, status) in [
        ("contrato", TaskStatus::Done),
        ("kickoff", TaskStatus::Done),
        ("treinamento", TaskStatus::InProgress),
        ("go-live", TaskStatus::Todo),
    ] {
        board.create(NewTask::titled(process_id, title, status)).await.unwrap();
    }

    let processes: Coordinator<ProcessWithTaskCounts> = Coordinator::new(Arc::new(source.clone()), ProcessScope::all());
    processes.refresh().await.unwrap();
    let store = processes.store().read().await;
    let process = store.get(process_id).unwrap();
    assert_eq!(process.progress, 50);
    assert_eq!(process.total_tasks, 4);
}

#[tokio::test]
async fn partial_reorder_keeps_the_optimistic_order_and_flags_it() {
    let source = MemorySource::new();
    let (process_id, board) = process_board(&source).await;
    let a = board.create(NewTask::titled(process_id, "a", TaskStatus::Todo)).await.unwrap();
    let b = board.create(NewTask::titled(process_id, "b", TaskStatus::Todo)).await.unwrap();
    let c = board.create(NewTask::titled(process_id, "c", TaskStatus::Todo)).await.unwrap();

    // c vai para o topo: lote [c -> 0, a -> 1, b -> 2]; o 2º (a) falha.
    source.fail_writes_for(a.id);
    let err = board
        .move_task(Move { item: c.id, from: TaskStatus::Todo, to: TaskStatus::Todo, to_index: 0 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PartialBatchFailure { failed: 1, total: 3 }));

    {
        let store = board.store().read().await;
        let column = &ordering::task_columns(store.items())[0];
        assert_eq!(column.items, vec![c.id, a.id, b.id]);
        assert!(store.last_error().is_some());
        assert!(store.pending(a.id).is_some_and(|op| op.rejected));
        assert_eq!(store.pending_count(), 1);
    }

    // No servidor `a` ficou com o índice antigo: duplicata em 0.
    let persisted = DataSource::<Task>::list(&source, &process_id).await.unwrap();
    let zeros = persisted.iter().filter(|t| t.order_index == 0).count();
    assert_eq!(zeros, 2);

    // Um reorder completo depois corrige.
    source.clear_failures();
    let columns = {
        let store = board.store().read().await;
        ordering::task_columns(store.items())
    };
    board.reorder(ordering::renumber(&columns[0].items, columns[0].status)).await.unwrap();
    let persisted = DataSource::<Task>::list(&source, &process_id).await.unwrap();
    let indices: BTreeSet<i32> = persisted.iter().map(|t| t.order_index).collect();
    assert_eq!(indices, BTreeSet::from([0, 1, 2]));
    assert_eq!(board.store().read().await.pending_count(), 0);
}

#[tokio::test]
async fn partial_reorder_stays_flagged_while_the_board_is_watched() {
    let hub = ChangeHub::new(64);
    let source = MemorySource::with_hub(hub.clone());
    let (process_id, board) = process_board(&source).await;
    let a = board.create(NewTask::titled(process_id, "a", TaskStatus::Todo)).await.unwrap();
    let b = board.create(NewTask::titled(process_id, "b", TaskStatus::Todo)).await.unwrap();
    let c = board.create(NewTask::titled(process_id, "c", TaskStatus::Todo)).await.unwrap();
    let view = board.watch(&hub, task_topics(process_id));

    source.fail_writes_for(a.id);
    let err = board
        .move_task(Move { item: c.id, from: TaskStatus::Todo, to: TaskStatus::Todo, to_index: 0 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PartialBatchFailure { failed: 1, total: 3 }));

    // As escritas que passaram notificam e a view refaz o fetch.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(view.refetch_count() >= 1);
    {
        let store = board.store().read().await;
        assert!(store.last_error().is_some());
        let column = &ordering::task_columns(store.items())[0];
        assert_eq!(column.items, vec![c.id, a.id, b.id]);
        let indices: Vec<i32> = column.items.iter().filter_map(|id| store.get(*id)).map(|t| t.order_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    // Um refresh pedido pela view mostra o servidor como ele está.
    board.refresh().await.unwrap();
    let store = board.store().read().await;
    assert!(store.last_error().is_none());
    assert_eq!(store.pending_count(), 0);
    let zeros = store.items().iter().filter(|t| t.order_index == 0).count();
    assert_eq!(zeros, 2);
}

#[tokio::test]
async fn failed_process_drag_reverts_to_its_column() {
    let source = MemorySource::new();
    let board: Coordinator<ProcessWithTaskCounts> = Coordinator::new(Arc::new(source.clone()), ProcessScope::all());
    let implantacao = board.create(NewProcess::titled(None, "Implantação")).await.unwrap();
    board.create(NewProcess::titled(None, "Auditoria")).await.unwrap();

    source.fail_next_writes(1);
    let before = board.store().read().await.snapshot();
    assert!(board.update_status(implantacao.id, ProcessStatus::Paused).await.is_err());

    let store = board.store().read().await;
    assert_eq!(store.snapshot(), before);
    let columns = ordering::process_columns(store.items());
    assert_eq!(columns[0].status, ProcessStatus::Active);
    assert!(columns[0].items.contains(&implantacao.id));
    assert!(columns[1].items.is_empty());
    assert!(store.last_error().is_some());
    drop(store);

    board.update_status(implantacao.id, ProcessStatus::Paused).await.unwrap();
    let store = board.store().read().await;
    assert_eq!(ordering::process_columns(store.items())[1].items, vec![implantacao.id]);
}

#[tokio::test]
async fn columns_stay_dense_after_a_sequence_of_moves() {
    let source = MemorySource::new();
    let (process_id, board) = process_board(&source).await;
    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(board.create(NewTask::titled(process_id, format!("t{i}"), TaskStatus::Todo)).await.unwrap().id);
    }

    let moves = [
        (ids[4], TaskStatus::Todo, TaskStatus::InProgress, 0),
        (ids[0], TaskStatus::Todo, TaskStatus::InProgress, 0),
        (ids[2], TaskStatus::Todo, TaskStatus::Todo, 0),
        (ids[4], TaskStatus::InProgress, TaskStatus::Done, 5),
        (ids[1], TaskStatus::Todo, TaskStatus::InProgress, 1),
    ];
    for (item, from, to, to_index) in moves {
        board.move_task(Move { item, from, to, to_index }).await.unwrap();
    }

    let persisted = DataSource::<Task>::list(&source, &process_id).await.unwrap();
    assert_eq!(persisted.len(), 5);
    for status in TaskStatus::COLUMNS {
        let indices: Vec<i32> = persisted.iter().filter(|t| t.status == status).map(|t| t.order_index).collect();
        let expected: Vec<i32> = (0..indices.len() as i32).collect();
        assert_eq!(indices, expected, "coluna {status:?} não está densa");
    }
}

#[tokio::test]
async fn moving_in_place_sends_nothing() {
    let source = MemorySource::new();
    let (process_id, board) = process_board(&source).await;
    let a = board.create(NewTask::titled(process_id, "a", TaskStatus::Todo)).await.unwrap();
    board.create(NewTask::titled(process_id, "b", TaskStatus::Todo)).await.unwrap();
    let attempts = source.write_attempts();

    board
        .move_task(Move { item: a.id, from: TaskStatus::Todo, to: TaskStatus::Todo, to_index: 0 })
        .await
        .unwrap();
    assert_eq!(source.write_attempts(), attempts);
}

#[tokio::test]
async fn task_changes_elsewhere_refresh_the_process_board() {
    let hub = ChangeHub::new(64);
    let source = MemorySource::with_hub(hub.clone());
    let (process_id, board) = process_board(&source).await;
    let view = board.watch(&hub, task_topics(process_id));

    // Outro usuário cria uma tarefa direto na fonte.
    DataSource::<Task>::insert(&source, &NewTask::titled(process_id, "externa", TaskStatus::Review))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(board.store().read().await.len(), 1);
    assert!(view.refetch_count() >= 1);

    drop(view);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(hub.receiver_count(), 0);
}
