// src/board/progress.rs
//
// Derivação do progresso de um processo. Espelha a view
// `processes_with_task_counts` do banco.

use crate::models::task::{Task, TaskStatus};

/// `round(100 * done / total)`, ou 0 quando não há tarefas.
/// Meio ponto arredonda para cima, como o ROUND do Postgres para positivos.
pub fn derive(done: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total);
    ((200 * done + total) / (2 * total)) as i32
}

/// Contagem de tarefas por status de um processo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub todo: i32,
    pub in_progress: i32,
    pub review: i32,
    pub done: i32,
}

impl TaskCounts {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut counts = TaskCounts::default();
        for task in tasks {
            match task.status {
                TaskStatus::Todo => counts.todo += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Review => counts.review += 1,
                TaskStatus::Done => counts.done += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> i32 {
        self.todo + self.in_progress + self.review + self.done
    }

    pub fn progress(&self) -> i32 {
        derive(self.done as usize, self.total() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_tasks_means_zero_progress() {
        assert_eq!(derive(0, 0), 0);
    }

    #[test]
    fn half_done() {
        assert_eq!(derive(2, 4), 50);
    }

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(derive(1, 3), 33);
        assert_eq!(derive(2, 3), 67);
        assert_eq!(derive(1, 8), 13); // 12.5 -> 13
        assert_eq!(derive(3, 3), 100);
    }

    #[test]
    fn matches_float_rounding_for_small_boards() {
        for total in 1..=40usize {
            for done in 0..=total {
                let expected = (100.0 * done as f64 / total as f64).round() as i32;
                assert_eq!(derive(done, total), expected, "{done}/{total}");
            }
        }
    }
}
