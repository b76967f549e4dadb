#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use taskboard::store::{comment_content, group_snapshot};
use taskboard::{
    Board, BoardSnapshot, Comment, NewTask, Priority, StoreError, StoreResult, StoredTask, Task,
    TaskId, TaskStatus, TaskStore,
};
use uuid::Uuid;

/// In-memory store that records every status update and can be told to fail
/// the next N of them.
#[derive(Default)]
pub struct RecordingStore {
    tasks: Mutex<Vec<StoredTask>>,
    comments: Mutex<Vec<Comment>>,
    updates: Mutex<Vec<(TaskId, TaskStatus)>>,
    failures: Mutex<VecDeque<String>>,
}

impl RecordingStore {
    pub fn with_tasks(tasks: Vec<StoredTask>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Default::default()
        }
    }

    pub fn fail_next(&self, message: &str) {
        self.failures.lock().unwrap().push_back(message.to_string());
    }

    pub fn updates(&self) -> Vec<(TaskId, TaskStatus)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn status_of(&self, task: TaskId) -> Option<TaskStatus> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|stored| stored.id == task)
            .map(|stored| stored.status)
    }

    pub fn priority_of(&self, task: TaskId) -> Option<Priority> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|stored| stored.id == task)
            .map(|stored| stored.priority)
    }

    fn exists(&self, task: TaskId) -> StoreResult<()> {
        if self.tasks.lock().unwrap().iter().any(|stored| stored.id == task) {
            Ok(())
        } else {
            Err(StoreError::NotFound(task))
        }
    }
}

impl TaskStore for RecordingStore {
    fn load_board_snapshot(&self, _user: Option<&str>) -> StoreResult<BoardSnapshot> {
        Ok(group_snapshot(self.tasks.lock().unwrap().clone()))
    }

    fn update_task_status(&self, task: TaskId, status: TaskStatus) -> StoreResult<()> {
        self.updates.lock().unwrap().push((task, status));
        if let Some(message) = self.failures.lock().unwrap().pop_front() {
            return Err(StoreError::Unavailable(message));
        }
        let mut tasks = self.tasks.lock().unwrap();
        let stored = tasks
            .iter_mut()
            .find(|stored| stored.id == task)
            .ok_or(StoreError::NotFound(task))?;
        stored.status = status;
        Ok(())
    }

    fn create_task(&self, task: NewTask) -> StoreResult<TaskId> {
        let id = TaskId::new();
        self.tasks.lock().unwrap().push(StoredTask {
            id,
            title: task.title,
            description: task.description,
            status: TaskStatus::New,
            priority: task.priority,
            due_date: task.due_date,
            created_at: Utc::now(),
            assignees: task.assignees,
        });
        Ok(id)
    }

    fn get_task(&self, task: TaskId) -> StoreResult<Option<StoredTask>> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .find(|stored| stored.id == task)
            .cloned())
    }

    fn list_tasks(&self, _user: Option<&str>) -> StoreResult<Vec<StoredTask>> {
        Ok(self.tasks.lock().unwrap().clone())
    }

    fn update_task_priority(&self, task: TaskId, priority: Priority) -> StoreResult<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let stored = tasks
            .iter_mut()
            .find(|stored| stored.id == task)
            .ok_or(StoreError::NotFound(task))?;
        stored.priority = priority;
        Ok(())
    }

    fn delete_task(&self, task: TaskId) -> StoreResult<()> {
        self.exists(task)?;
        self.tasks.lock().unwrap().retain(|stored| stored.id != task);
        self.comments.lock().unwrap().retain(|comment| comment.task != task);
        Ok(())
    }

    fn list_comments(&self, task: TaskId) -> StoreResult<Vec<Comment>> {
        self.exists(task)?;
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|comment| comment.task == task)
            .cloned()
            .collect())
    }

    fn add_comment(
        &self,
        task: TaskId,
        author: Option<&str>,
        content: &str,
    ) -> StoreResult<Comment> {
        let content = comment_content(content)?;
        self.exists(task)?;
        let comment = Comment {
            id: Uuid::new_v4(),
            task,
            author: author.map(str::to_string),
            content,
            created_at: Utc::now(),
        };
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment)
    }
}

/// Stored tasks with strictly decreasing `created_at`, so the canonical
/// order equals the order given here.
pub fn stored_tasks(specs: &[(&str, TaskStatus)]) -> Vec<StoredTask> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    specs
        .iter()
        .enumerate()
        .map(|(i, (title, status))| StoredTask {
            id: TaskId::new(),
            title: title.to_string(),
            description: None,
            status: *status,
            priority: Priority::Normal,
            due_date: None,
            created_at: base - Duration::minutes(i as i64),
            assignees: Vec::new(),
        })
        .collect()
}

pub fn card(title: &str) -> Task {
    Task::new(TaskId::new(), title)
}

pub fn board(new: &[Task], processing: &[Task], done: &[Task]) -> Board {
    Board::new(BoardSnapshot {
        new: new.to_vec(),
        processing: processing.to_vec(),
        done: done.to_vec(),
    })
}
