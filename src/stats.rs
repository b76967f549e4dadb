use crate::task::{StoredTask, TaskStatus};
use chrono::NaiveDate;
use serde::Serialize;

/// Counts shown at the top of the board and by `taskboard stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub open: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub completed: usize,
}

impl DashboardStats {
    pub fn compute<'a>(tasks: impl IntoIterator<Item = &'a StoredTask>, today: NaiveDate) -> Self {
        let mut stats = Self::default();
        for task in tasks {
            match task.status {
                TaskStatus::New | TaskStatus::Processing => stats.open += 1,
                TaskStatus::Done => stats.completed += 1,
                TaskStatus::Archived => {}
            }
            if task.status == TaskStatus::Done {
                continue;
            }
            match task.due_date {
                Some(due) if due < today => stats.overdue += 1,
                Some(due) if due == today => stats.due_today += 1,
                _ => {}
            }
        }
        stats
    }
}
