// src/board/memory.rs
//
// DataSource em memória: mesmas regras visíveis do Postgres (views com
// contagens, CNPJ único, cascata, 404) sem precisar de banco. Serve para
// testes e para rodar o quadro offline. Tem injeção de falhas.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::board::entity::{BoardEntity, ProcessScope};
use crate::board::progress::{self, TaskCounts};
use crate::board::source::DataSource;
use crate::common::error::AppError;
use crate::models::company::{Company, CompanyPatch, CompanyWithStats, NewCompany};
use crate::models::process::{NewProcess, ProcessPatch, ProcessStatus, ProcessWithTaskCounts};
use crate::models::task::{NewTask, Task, TaskPatch, TaskStatus};
use crate::realtime::{ChangeHub, Table, TableChange};

#[derive(Default)]
struct MemoryDb {
    // Ordem de inserção; as listagens "mais recentes primeiro" invertem.
    companies: Vec<Company>,
    processes: Vec<ProcessWithTaskCounts>,
    tasks: Vec<Task>,

    offline: bool,
    fail_next_writes: usize,
    failing_ids: HashSet<Uuid>,
    write_attempts: usize,
    latency: Option<Duration>,
}

impl MemoryDb {
    fn process_view(&self, process: &ProcessWithTaskCounts) -> ProcessWithTaskCounts {
        let counts = TaskCounts::from_tasks(self.tasks.iter().filter(|t| t.process_id == process.id));
        ProcessWithTaskCounts {
            progress: counts.progress(),
            total_tasks: counts.total(),
            todo_count: counts.todo,
            in_progress_count: counts.in_progress,
            review_count: counts.review,
            done_count: counts.done,
            ..process.clone()
        }
    }

    fn company_view(&self, company: &Company) -> CompanyWithStats {
        let processes: Vec<ProcessWithTaskCounts> = self
            .processes
            .iter()
            .filter(|p| p.company_id == Some(company.id))
            .map(|p| self.process_view(p))
            .collect();

        let total = processes.len();
        let avg_progress = if total == 0 {
            0
        } else {
            // ROUND(AVG(progress)) da view
            let sum: i64 = processes.iter().map(|p| i64::from(p.progress)).sum();
            progress::derive(sum as usize, total * 100)
        };

        CompanyWithStats {
            company: company.clone(),
            total_processes: total as i32,
            completed_processes: processes.iter().filter(|p| p.status == ProcessStatus::Completed).count() as i32,
            active_processes: processes.iter().filter(|p| p.status == ProcessStatus::Active).count() as i32,
            avg_progress,
            last_activity: processes.iter().map(|p| p.updated_at).max(),
        }
    }

    fn cnpj_taken(&self, cnpj: Option<&str>, except: Option<Uuid>) -> bool {
        let Some(cnpj) = cnpj else { return false };
        self.companies
            .iter()
            .any(|c| Some(c.id) != except && c.cnpj.as_deref() == Some(cnpj))
    }

    /// Portão de toda escrita: conta a tentativa e aplica as falhas injetadas.
    fn admit_write(&mut self, id: Option<Uuid>) -> Result<(), AppError> {
        self.write_attempts += 1;
        if self.offline {
            return Err(offline());
        }
        if self.fail_next_writes > 0 {
            self.fail_next_writes -= 1;
            return Err(AppError::InternalServerError(anyhow!("falha de escrita simulada")));
        }
        if id.is_some_and(|id| self.failing_ids.contains(&id)) {
            return Err(AppError::InternalServerError(anyhow!("falha de escrita simulada")));
        }
        Ok(())
    }

    fn admit_read(&self) -> Result<(), AppError> {
        if self.offline { Err(offline()) } else { Ok(()) }
    }
}

fn offline() -> AppError {
    AppError::InternalServerError(anyhow!("fonte de dados indisponível"))
}

#[derive(Clone, Default)]
pub struct MemorySource {
    db: Arc<Mutex<MemoryDb>>,
    hub: Option<ChangeHub>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publica um `TableChange` a cada escrita bem-sucedida, como o trigger
    /// do banco faz.
    pub fn with_hub(hub: ChangeHub) -> Self {
        Self { db: Arc::default(), hub: Some(hub) }
    }

    fn db(&self) -> MutexGuard<'_, MemoryDb> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, changes: impl IntoIterator<Item = TableChange>) {
        if let Some(hub) = &self.hub {
            for change in changes {
                hub.publish(change);
            }
        }
    }

    async fn simulate_latency(&self) {
        let latency = self.db().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    // --- injeção de falhas ---

    /// As próximas `n` escritas falham.
    pub fn fail_next_writes(&self, n: usize) {
        self.db().fail_next_writes = n;
    }

    /// Toda escrita que mirar esse id falha até `clear_failures`.
    pub fn fail_writes_for(&self, id: Uuid) {
        self.db().failing_ids.insert(id);
    }

    pub fn clear_failures(&self) {
        let mut db = self.db();
        db.fail_next_writes = 0;
        db.failing_ids.clear();
        db.offline = false;
    }

    /// Offline: leituras e escritas falham.
    pub fn set_offline(&self, offline: bool) {
        self.db().offline = offline;
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        self.db().latency = latency;
    }

    pub fn write_attempts(&self) -> usize {
        self.db().write_attempts
    }
}

// --- Empresas ---

#[async_trait]
impl DataSource<CompanyWithStats> for MemorySource {
    async fn list(&self, _scope: &()) -> Result<Vec<CompanyWithStats>, AppError> {
        self.simulate_latency().await;
        let db = self.db();
        db.admit_read()?;
        Ok(db.companies.iter().rev().map(|c| db.company_view(c)).collect())
    }

    async fn get(&self, id: Uuid) -> Result<CompanyWithStats, AppError> {
        let db = self.db();
        db.admit_read()?;
        db.companies
            .iter()
            .find(|c| c.id == id)
            .map(|c| db.company_view(c))
            .ok_or(AppError::NotFound(CompanyWithStats::LABEL))
    }

    async fn insert(&self, new: &NewCompany) -> Result<CompanyWithStats, AppError> {
        self.simulate_latency().await;
        let created = {
            let mut db = self.db();
            db.admit_write(None)?;
            if db.cnpj_taken(new.cnpj.as_deref(), None) {
                return Err(AppError::UniqueConstraintViolation("CNPJ já cadastrado".to_string()));
            }
            let company = CompanyWithStats::provisional(Uuid::new_v4(), new, Utc::now()).company;
            db.companies.push(company.clone());
            CompanyWithStats::without_stats(company)
        };
        self.publish([TableChange::new(Table::Companies, created.company.id)]);
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: &CompanyPatch) -> Result<CompanyWithStats, AppError> {
        self.simulate_latency().await;
        let updated = {
            let mut db = self.db();
            db.admit_write(Some(id))?;
            if let Some(cnpj) = &patch.cnpj {
                if db.cnpj_taken(cnpj.as_deref(), Some(id)) {
                    return Err(AppError::UniqueConstraintViolation("CNPJ já cadastrado".to_string()));
                }
            }
            let company = db
                .companies
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(AppError::NotFound(CompanyWithStats::LABEL))?;
            patch.apply_to(company);
            company.updated_at = Utc::now();
            let company = company.clone();
            db.company_view(&company)
        };
        self.publish([TableChange::new(Table::Companies, id)]);
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.simulate_latency().await;
        let mut changes = vec![TableChange::new(Table::Companies, id)];
        {
            let mut db = self.db();
            db.admit_write(Some(id))?;
            let before = db.companies.len();
            db.companies.retain(|c| c.id != id);
            if db.companies.len() == before {
                return Err(AppError::NotFound(CompanyWithStats::LABEL));
            }

            // ON DELETE CASCADE: processos da empresa e as tarefas deles.
            let (gone, kept): (Vec<_>, Vec<_>) =
                db.processes.drain(..).partition(|p| p.company_id == Some(id));
            db.processes = kept;
            let gone_ids: HashSet<Uuid> = gone.iter().map(|p| p.id).collect();
            for task in db.tasks.iter().filter(|t| gone_ids.contains(&t.process_id)) {
                changes.push(TableChange::new(Table::Tasks, task.id).with_process(task.process_id));
            }
            db.tasks.retain(|t| !gone_ids.contains(&t.process_id));
            changes.extend(gone.iter().map(|p| TableChange::new(Table::Processes, p.id).with_company(Some(id))));
        }
        self.publish(changes);
        Ok(())
    }
}

// --- Processos ---

#[async_trait]
impl DataSource<ProcessWithTaskCounts> for MemorySource {
    async fn list(&self, scope: &ProcessScope) -> Result<Vec<ProcessWithTaskCounts>, AppError> {
        self.simulate_latency().await;
        let db = self.db();
        db.admit_read()?;
        Ok(db
            .processes
            .iter()
            .rev()
            .filter(|p| p.in_scope(scope))
            .map(|p| db.process_view(p))
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<ProcessWithTaskCounts, AppError> {
        let db = self.db();
        db.admit_read()?;
        db.processes
            .iter()
            .find(|p| p.id == id)
            .map(|p| db.process_view(p))
            .ok_or(AppError::NotFound(ProcessWithTaskCounts::LABEL))
    }

    async fn insert(&self, new: &NewProcess) -> Result<ProcessWithTaskCounts, AppError> {
        self.simulate_latency().await;
        let created = {
            let mut db = self.db();
            db.admit_write(None)?;
            if let Some(company_id) = new.company_id {
                if !db.companies.iter().any(|c| c.id == company_id) {
                    return Err(AppError::NotFound(CompanyWithStats::LABEL));
                }
            }
            let process = ProcessWithTaskCounts::provisional(Uuid::new_v4(), new, Utc::now());
            db.processes.push(process.clone());
            process
        };
        self.publish([TableChange::new(Table::Processes, created.id).with_company(created.company_id)]);
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: &ProcessPatch) -> Result<ProcessWithTaskCounts, AppError> {
        self.simulate_latency().await;
        let updated = {
            let mut db = self.db();
            db.admit_write(Some(id))?;
            let process = db
                .processes
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(AppError::NotFound(ProcessWithTaskCounts::LABEL))?;
            patch.apply_to(process);
            process.updated_at = Utc::now();
            let process = process.clone();
            db.process_view(&process)
        };
        self.publish([TableChange::new(Table::Processes, id).with_company(updated.company_id)]);
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.simulate_latency().await;
        let mut changes = Vec::new();
        {
            let mut db = self.db();
            db.admit_write(Some(id))?;
            let position = db
                .processes
                .iter()
                .position(|p| p.id == id)
                .ok_or(AppError::NotFound(ProcessWithTaskCounts::LABEL))?;
            let removed = db.processes.remove(position);
            changes.push(TableChange::new(Table::Processes, id).with_company(removed.company_id));
            for task in db.tasks.iter().filter(|t| t.process_id == id) {
                changes.push(TableChange::new(Table::Tasks, task.id).with_process(id));
            }
            db.tasks.retain(|t| t.process_id != id);
        }
        self.publish(changes);
        Ok(())
    }
}

// --- Tarefas ---

#[async_trait]
impl DataSource<Task> for MemorySource {
    async fn list(&self, process_id: &Uuid) -> Result<Vec<Task>, AppError> {
        self.simulate_latency().await;
        let db = self.db();
        db.admit_read()?;
        let mut tasks: Vec<Task> = db.tasks.iter().filter(|t| t.process_id == *process_id).cloned().collect();
        // ORDER BY status, order_index; estável para empates.
        tasks.sort_by_key(|t| (TaskStatus::COLUMNS.iter().position(|s| *s == t.status), t.order_index));
        Ok(tasks)
    }

    async fn get(&self, id: Uuid) -> Result<Task, AppError> {
        let db = self.db();
        db.admit_read()?;
        db.tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(AppError::NotFound(Task::LABEL))
    }

    async fn insert(&self, new: &NewTask) -> Result<Task, AppError> {
        self.simulate_latency().await;
        let created = {
            let mut db = self.db();
            db.admit_write(None)?;
            if !db.processes.iter().any(|p| p.id == new.process_id) {
                return Err(AppError::NotFound(ProcessWithTaskCounts::LABEL));
            }
            let mut new = new.clone();
            Task::prepare_new(&mut new, &db.tasks);
            let task = Task::provisional(Uuid::new_v4(), &new, Utc::now());
            db.tasks.push(task.clone());
            task
        };
        self.publish([TableChange::new(Table::Tasks, created.id).with_process(created.process_id)]);
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<Task, AppError> {
        self.simulate_latency().await;
        let updated = {
            let mut db = self.db();
            db.admit_write(Some(id))?;
            let task = db
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(AppError::NotFound(Task::LABEL))?;
            patch.apply_to(task);
            task.updated_at = Utc::now();
            task.clone()
        };
        self.publish([TableChange::new(Table::Tasks, id).with_process(updated.process_id)]);
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.simulate_latency().await;
        let removed = {
            let mut db = self.db();
            db.admit_write(Some(id))?;
            let position = db
                .tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or(AppError::NotFound(Task::LABEL))?;
            db.tasks.remove(position)
        };
        self.publish([TableChange::new(Table::Tasks, id).with_process(removed.process_id)]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::company::CompanyStatus;
    use crate::realtime::Topic;

    #[tokio::test]
    async fn process_view_derives_progress_from_tasks() {
        let source = MemorySource::new();
        let process = DataSource::<ProcessWithTaskCounts>::insert(&source, &NewProcess::titled(None, "Onboarding"))
            .await
            .unwrap();

        for (title, status) in [
            ("a", TaskStatus::Done),
            ("b", TaskStatus::Done),
            ("c", TaskStatus::Todo),
            ("d", TaskStatus::Review),
        ] {
            DataSource::<Task>::insert(&source, &NewTask::titled(process.id, title, status)).await.unwrap();
        }

        let view = DataSource::<ProcessWithTaskCounts>::get(&source, process.id).await.unwrap();
        assert_eq!(view.progress, 50);
        assert_eq!(view.total_tasks, 4);
        assert_eq!(view.done_count, 2);
        assert_eq!(view.review_count, 1);
    }

    #[tokio::test]
    async fn duplicate_cnpj_is_a_conflict() {
        let source = MemorySource::new();
        let mut new = NewCompany::named("Acme", CompanyStatus::Lead);
        new.cnpj = Some("12.345.678/0001-90".to_string());
        DataSource::<CompanyWithStats>::insert(&source, &new).await.unwrap();

        new.name = "Outra".to_string();
        let err = DataSource::<CompanyWithStats>::insert(&source, &new).await.unwrap_err();
        assert!(matches!(err, AppError::UniqueConstraintViolation(_)));
    }

    #[tokio::test]
    async fn deleting_a_company_cascades() {
        let source = MemorySource::new();
        let company = DataSource::<CompanyWithStats>::insert(&source, &NewCompany::named("Acme", CompanyStatus::Lead))
            .await
            .unwrap();
        let process = DataSource::<ProcessWithTaskCounts>::insert(
            &source,
            &NewProcess::titled(Some(company.company.id), "Implantação"),
        )
        .await
        .unwrap();
        let task = DataSource::<Task>::insert(&source, &NewTask::titled(process.id, "a", TaskStatus::Todo))
            .await
            .unwrap();

        DataSource::<CompanyWithStats>::delete(&source, company.company.id).await.unwrap();

        assert!(DataSource::<ProcessWithTaskCounts>::get(&source, process.id).await.unwrap_err().is_not_found());
        assert!(DataSource::<Task>::get(&source, task.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn company_stats_follow_their_processes() {
        let source = MemorySource::new();
        let company = DataSource::<CompanyWithStats>::insert(&source, &NewCompany::named("Acme", CompanyStatus::Lead))
            .await
            .unwrap();
        let company_id = company.company.id;

        let open = DataSource::<ProcessWithTaskCounts>::insert(&source, &NewProcess::titled(Some(company_id), "A"))
            .await
            .unwrap();
        let mut finished = NewProcess::titled(Some(company_id), "B");
        finished.status = ProcessStatus::Completed;
        let finished = DataSource::<ProcessWithTaskCounts>::insert(&source, &finished).await.unwrap();

        DataSource::<Task>::insert(&source, &NewTask::titled(finished.id, "x", TaskStatus::Done)).await.unwrap();
        DataSource::<Task>::insert(&source, &NewTask::titled(open.id, "y", TaskStatus::Todo)).await.unwrap();

        let stats = DataSource::<CompanyWithStats>::get(&source, company_id).await.unwrap();
        assert_eq!(stats.total_processes, 2);
        assert_eq!(stats.completed_processes, 1);
        assert_eq!(stats.active_processes, 1);
        assert_eq!(stats.avg_progress, 50);
        assert!(stats.last_activity.is_some());
    }

    #[tokio::test]
    async fn writes_are_announced_on_the_hub() {
        let hub = ChangeHub::new(16);
        let mut sub = hub.subscribe(vec![Topic::table(Table::Companies)]);
        let source = MemorySource::with_hub(hub);

        let created = DataSource::<CompanyWithStats>::insert(&source, &NewCompany::named("Acme", CompanyStatus::Lead))
            .await
            .unwrap();

        assert_eq!(
            sub.recv().await,
            Some(crate::realtime::Signal::Changed(TableChange::new(Table::Companies, created.company.id)))
        );
    }

    #[tokio::test]
    async fn targeted_failures_only_hit_that_row() {
        let source = MemorySource::new();
        let process = DataSource::<ProcessWithTaskCounts>::insert(&source, &NewProcess::titled(None, "P"))
            .await
            .unwrap();
        let a = DataSource::<Task>::insert(&source, &NewTask::titled(process.id, "a", TaskStatus::Todo)).await.unwrap();
        let b = DataSource::<Task>::insert(&source, &NewTask::titled(process.id, "b", TaskStatus::Todo)).await.unwrap();

        source.fail_writes_for(b.id);
        let patch = TaskPatch::status(TaskStatus::Done);
        assert!(DataSource::<Task>::update(&source, a.id, &patch).await.is_ok());
        assert!(DataSource::<Task>::update(&source, b.id, &patch).await.is_err());
        assert_eq!(source.write_attempts(), 5);
    }
}
