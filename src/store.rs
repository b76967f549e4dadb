//! Persistence collaborator for the board.
//!
//! The board only needs two calls: a grouped snapshot at mount and a status
//! update per committed cross-column drop. The rest serves the detail view
//! and the CLI. `JsonFileStore` keeps every task and comment in a single
//! pretty-printed JSON document.

use crate::board::columns::{BoardSnapshot, ColumnId};
use crate::task::{Comment, NewTask, Priority, StoredTask, TaskId, TaskStatus};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access task store `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("task store `{path}` is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("{0}")]
    Validation(String),
    #[error("task store unavailable: {0}")]
    Unavailable(String),
}

pub trait TaskStore: Send + Sync {
    /// Tasks visible to `user` (all tasks when `None`), grouped by lane.
    /// Archived tasks are excluded.
    fn load_board_snapshot(&self, user: Option<&str>) -> StoreResult<BoardSnapshot>;

    fn update_task_status(&self, task: TaskId, status: TaskStatus) -> StoreResult<()>;

    fn create_task(&self, task: NewTask) -> StoreResult<TaskId>;

    fn get_task(&self, task: TaskId) -> StoreResult<Option<StoredTask>>;

    /// Newest first.
    fn list_tasks(&self, user: Option<&str>) -> StoreResult<Vec<StoredTask>>;

    fn update_task_priority(&self, task: TaskId, priority: Priority) -> StoreResult<()>;

    /// Takes the task off the board without deleting it.
    fn archive_task(&self, task: TaskId) -> StoreResult<()> {
        self.update_task_status(task, TaskStatus::Archived)
    }

    /// Removes the task and its comments.
    fn delete_task(&self, task: TaskId) -> StoreResult<()>;

    /// Oldest first.
    fn list_comments(&self, task: TaskId) -> StoreResult<Vec<Comment>>;

    /// `content` is trimmed and must not be empty.
    fn add_comment(
        &self,
        task: TaskId,
        author: Option<&str>,
        content: &str,
    ) -> StoreResult<Comment>;
}

/// Trimmed comment text, or the validation error for blank input.
pub fn comment_content(content: &str) -> StoreResult<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(StoreError::Validation("Comment content is required".to_string()));
    }
    Ok(content.to_string())
}

/// Groups tasks into lanes in canonical order: newest `created_at` first,
/// ties broken by id. Lane order is never persisted, so every load yields
/// this order.
pub fn group_snapshot(mut tasks: Vec<StoredTask>) -> BoardSnapshot {
    sort_canonical(&mut tasks);
    let mut snapshot = BoardSnapshot::default();
    for task in &tasks {
        if let Some(column) = ColumnId::for_status(task.status) {
            snapshot.group_mut(column).push(task.to_card());
        }
    }
    snapshot
}

fn sort_canonical(tasks: &mut [StoredTask]) {
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    tasks: Vec<StoredTask>,
    #[serde(default)]
    comments: Vec<Comment>,
}

impl StoreDocument {
    fn task_mut(&mut self, task: TaskId) -> StoreResult<&mut StoredTask> {
        self.tasks
            .iter_mut()
            .find(|stored| stored.id == task)
            .ok_or(StoreError::NotFound(task))
    }

    fn contains(&self, task: TaskId) -> bool {
        self.tasks.iter().any(|stored| stored.id == task)
    }
}

pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes an empty store unless one already exists.
    pub fn init(&self) -> StoreResult<bool> {
        let _guard = self.guard()?;
        if self.path.exists() {
            return Ok(false);
        }
        self.write(&StoreDocument::default())?;
        info!(path = %self.path.display(), "initialized task store");
        Ok(true)
    }

    fn guard(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn read(&self) -> StoreResult<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let data = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        if data.trim().is_empty() {
            return Ok(StoreDocument::default());
        }
        serde_json::from_str(&data).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, document: &StoreDocument) -> StoreResult<()> {
        let data = serde_json::to_string_pretty(document).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).map_err(|source| self.io_error(source))?;
        fs::rename(&tmp, &self.path).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn visible_to(task: &StoredTask, user: Option<&str>) -> bool {
    user.is_none_or(|email| task.is_assigned_to(email))
}

impl TaskStore for JsonFileStore {
    fn load_board_snapshot(&self, user: Option<&str>) -> StoreResult<BoardSnapshot> {
        let _guard = self.guard()?;
        let tasks: Vec<StoredTask> = self
            .read()?
            .tasks
            .into_iter()
            .filter(|task| visible_to(task, user))
            .collect();
        debug!(count = tasks.len(), "loaded board snapshot");
        Ok(group_snapshot(tasks))
    }

    fn update_task_status(&self, task: TaskId, status: TaskStatus) -> StoreResult<()> {
        let _guard = self.guard()?;
        let mut document = self.read()?;
        document.task_mut(task)?.status = status;
        self.write(&document)?;
        debug!(task = %task, status = %status, "stored task status");
        Ok(())
    }

    fn create_task(&self, task: NewTask) -> StoreResult<TaskId> {
        let title = task.title.trim();
        if title.is_empty() {
            return Err(StoreError::Validation("Task title is required".to_string()));
        }
        let _guard = self.guard()?;
        let mut document = self.read()?;
        let id = TaskId::new();
        document.tasks.push(StoredTask {
            id,
            title: title.to_string(),
            description: task
                .description
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            status: TaskStatus::New,
            priority: task.priority,
            due_date: task.due_date,
            created_at: Utc::now(),
            assignees: task.assignees,
        });
        self.write(&document)?;
        info!(task = %id, "created task");
        Ok(id)
    }

    fn get_task(&self, task: TaskId) -> StoreResult<Option<StoredTask>> {
        let _guard = self.guard()?;
        Ok(self.read()?.tasks.into_iter().find(|stored| stored.id == task))
    }

    fn list_tasks(&self, user: Option<&str>) -> StoreResult<Vec<StoredTask>> {
        let _guard = self.guard()?;
        let mut tasks: Vec<StoredTask> = self
            .read()?
            .tasks
            .into_iter()
            .filter(|task| visible_to(task, user))
            .collect();
        sort_canonical(&mut tasks);
        Ok(tasks)
    }

    fn update_task_priority(&self, task: TaskId, priority: Priority) -> StoreResult<()> {
        let _guard = self.guard()?;
        let mut document = self.read()?;
        document.task_mut(task)?.priority = priority;
        self.write(&document)?;
        debug!(task = %task, priority = %priority, "stored task priority");
        Ok(())
    }

    fn delete_task(&self, task: TaskId) -> StoreResult<()> {
        let _guard = self.guard()?;
        let mut document = self.read()?;
        if !document.contains(task) {
            return Err(StoreError::NotFound(task));
        }
        document.tasks.retain(|stored| stored.id != task);
        document.comments.retain(|comment| comment.task != task);
        self.write(&document)?;
        info!(task = %task, "deleted task");
        Ok(())
    }

    fn list_comments(&self, task: TaskId) -> StoreResult<Vec<Comment>> {
        let _guard = self.guard()?;
        let document = self.read()?;
        if !document.contains(task) {
            return Err(StoreError::NotFound(task));
        }
        let mut comments: Vec<Comment> = document
            .comments
            .into_iter()
            .filter(|comment| comment.task == task)
            .collect();
        comments.sort_by_key(|comment| comment.created_at);
        Ok(comments)
    }

    fn add_comment(
        &self,
        task: TaskId,
        author: Option<&str>,
        content: &str,
    ) -> StoreResult<Comment> {
        let content = comment_content(content)?;
        let _guard = self.guard()?;
        let mut document = self.read()?;
        if !document.contains(task) {
            return Err(StoreError::NotFound(task));
        }
        let comment = Comment {
            id: Uuid::new_v4(),
            task,
            author: author.map(str::to_string),
            content,
            created_at: Utc::now(),
        };
        document.comments.push(comment.clone());
        self.write(&document)?;
        debug!(task = %task, comment = %comment.id, "added comment");
        Ok(comment)
    }
}
