// src/board/entity.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::models::company::{Company, CompanyPatch, CompanyStatus, CompanyWithStats, NewCompany};
use crate::models::process::{NewProcess, ProcessPatch, ProcessStatus, ProcessWithTaskCounts};
use crate::models::task::{NewTask, Task, TaskPatch, TaskStatus};

/// Onde uma entidade criada entra na lista do store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    Front,
    Back,
}

/// O que o núcleo precisa saber de cada tipo de linha exibida num quadro.
pub trait BoardEntity: Clone + Send + Sync + 'static {
    type New: Validate + Clone + Send + Sync + 'static;
    type Patch: Validate + Clone + Send + Sync + 'static;
    /// Recorte da view ativa (ex: tarefas de um processo).
    type Scope: Clone + Send + Sync + 'static;

    /// Nome usado em mensagens de erro.
    const LABEL: &'static str;
    const INSERT_AT: InsertAt;

    fn id(&self) -> Uuid;

    /// Entidade provisória montada a partir do payload de criação, com os
    /// campos derivados nos valores iniciais.
    fn provisional(id: Uuid, new: &Self::New, now: DateTime<Utc>) -> Self;

    fn apply(&mut self, patch: &Self::Patch);

    fn in_scope(&self, scope: &Self::Scope) -> bool;

    /// Ajusta o payload de criação olhando o estado atual do store.
    fn prepare_new(_new: &mut Self::New, _current: &[Self]) {}
}

/// Entidades que vivem em colunas de status.
pub trait HasStatus: BoardEntity {
    type Status: Copy + Eq + std::hash::Hash + Send + Sync + std::fmt::Debug + 'static;

    fn status(&self) -> Self::Status;
    fn status_patch(status: Self::Status) -> Self::Patch;
}

// --- Empresas ---

impl BoardEntity for CompanyWithStats {
    type New = NewCompany;
    type Patch = CompanyPatch;
    type Scope = ();

    const LABEL: &'static str = "Empresa";
    const INSERT_AT: InsertAt = InsertAt::Front;

    fn id(&self) -> Uuid {
        self.company.id
    }

    fn provisional(id: Uuid, new: &NewCompany, now: DateTime<Utc>) -> Self {
        CompanyWithStats::without_stats(Company {
            id,
            name: new.name.clone(),
            cnpj: new.cnpj.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            contact_person: new.contact_person.clone(),
            linkedin_url: new.linkedin_url.clone(),
            instagram_url: new.instagram_url.clone(),
            website_url: new.website_url.clone(),
            estimated_value: new.estimated_value,
            expected_close_date: new.expected_close_date,
            lead_source: new.lead_source.clone(),
            status: new.status,
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, patch: &CompanyPatch) {
        patch.apply_to(&mut self.company);
    }

    fn in_scope(&self, _scope: &()) -> bool {
        true
    }
}

impl HasStatus for CompanyWithStats {
    type Status = CompanyStatus;

    fn status(&self) -> CompanyStatus {
        self.company.status
    }

    fn status_patch(status: CompanyStatus) -> CompanyPatch {
        CompanyPatch::status(status)
    }
}

// --- Processos ---

/// `company_id = None` lista todos os processos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessScope {
    pub company_id: Option<Uuid>,
}

impl ProcessScope {
    pub fn all() -> Self {
        Self { company_id: None }
    }

    pub fn company(company_id: Uuid) -> Self {
        Self { company_id: Some(company_id) }
    }
}

impl BoardEntity for ProcessWithTaskCounts {
    type New = NewProcess;
    type Patch = ProcessPatch;
    type Scope = ProcessScope;

    const LABEL: &'static str = "Processo";
    const INSERT_AT: InsertAt = InsertAt::Front;

    fn id(&self) -> Uuid {
        self.id
    }

    fn provisional(id: Uuid, new: &NewProcess, now: DateTime<Utc>) -> Self {
        ProcessWithTaskCounts {
            id,
            company_id: new.company_id,
            title: new.title.clone(),
            description: new.description.clone(),
            status: new.status,
            progress: 0,
            color: new.color.clone(),
            deadline: new.deadline,
            category_id: new.category_id,
            created_at: now,
            updated_at: now,
            total_tasks: 0,
            todo_count: 0,
            in_progress_count: 0,
            review_count: 0,
            done_count: 0,
        }
    }

    fn apply(&mut self, patch: &ProcessPatch) {
        patch.apply_to(self);
    }

    fn in_scope(&self, scope: &ProcessScope) -> bool {
        scope.company_id.is_none_or(|company_id| self.company_id == Some(company_id))
    }
}

impl HasStatus for ProcessWithTaskCounts {
    type Status = ProcessStatus;

    fn status(&self) -> ProcessStatus {
        self.status
    }

    fn status_patch(status: ProcessStatus) -> ProcessPatch {
        ProcessPatch::status(status)
    }
}

// --- Tarefas ---

impl BoardEntity for Task {
    type New = NewTask;
    type Patch = TaskPatch;
    /// id do processo dono
    type Scope = Uuid;

    const LABEL: &'static str = "Tarefa";
    const INSERT_AT: InsertAt = InsertAt::Back;

    fn id(&self) -> Uuid {
        self.id
    }

    fn provisional(id: Uuid, new: &NewTask, now: DateTime<Utc>) -> Self {
        Task {
            id,
            process_id: new.process_id,
            title: new.title.clone(),
            description: new.description.clone(),
            status: new.status,
            priority: new.priority,
            assignee: new.assignee.clone(),
            deadline: new.deadline,
            order_index: new.order_index.unwrap_or(0),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: &TaskPatch) {
        patch.apply_to(self);
    }

    fn in_scope(&self, process_id: &Uuid) -> bool {
        self.process_id == *process_id
    }

    /// Nova tarefa entra no fim da coluna: order_index = tamanho da coluna.
    fn prepare_new(new: &mut NewTask, current: &[Task]) {
        if new.order_index.is_none() {
            let column_len = current
                .iter()
                .filter(|t| t.process_id == new.process_id && t.status == new.status)
                .count();
            new.order_index = Some(column_len as i32);
        }
    }
}

impl HasStatus for Task {
    type Status = TaskStatus;

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn status_patch(status: TaskStatus) -> TaskPatch {
        TaskPatch::status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisional_process_starts_without_progress() {
        let new = NewProcess::titled(None, "Implantação");
        let process = ProcessWithTaskCounts::provisional(Uuid::new_v4(), &new, Utc::now());
        assert_eq!(process.progress, 0);
        assert_eq!(process.total_tasks, 0);
    }

    #[test]
    fn new_task_is_appended_to_its_column() {
        let process_id = Uuid::new_v4();
        let now = Utc::now();
        let existing: Vec<Task> = (0..2)
            .map(|i| {
                let mut new = NewTask::titled(process_id, format!("t{i}"), TaskStatus::Todo);
                new.order_index = Some(i);
                Task::provisional(Uuid::new_v4(), &new, now)
            })
            .collect();

        let mut todo = NewTask::titled(process_id, "nova", TaskStatus::Todo);
        Task::prepare_new(&mut todo, &existing);
        assert_eq!(todo.order_index, Some(2));

        let mut review = NewTask::titled(process_id, "revisar", TaskStatus::Review);
        Task::prepare_new(&mut review, &existing);
        assert_eq!(review.order_index, Some(0));
    }

    #[test]
    fn process_scope_filters_by_company() {
        let company = Uuid::new_v4();
        let new = NewProcess::titled(Some(company), "p");
        let process = ProcessWithTaskCounts::provisional(Uuid::new_v4(), &new, Utc::now());
        assert!(process.in_scope(&ProcessScope::all()));
        assert!(process.in_scope(&ProcessScope::company(company)));
        assert!(!process.in_scope(&ProcessScope::company(Uuid::new_v4())));
    }
}
