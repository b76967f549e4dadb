//! Terminal kanban board with drag-and-drop status changes.

pub mod app;
pub mod board;
pub mod config;
pub mod logging;
pub mod stats;
pub mod store;
pub mod sync;
pub mod task;
pub mod ui;

pub use board::columns::{BoardSnapshot, Column, ColumnId, Columns, Placement};
pub use board::drag::{DragSession, GestureEvent, Point, PointerGesture};
pub use board::{Action, Board, DropTarget, Effect, HoverOutcome, SyncRequest, SyncTicket};
pub use config::{Config, ConfigError};
pub use logging::LoggingError;
pub use stats::DashboardStats;
pub use store::{JsonFileStore, StoreError, StoreResult, TaskStore};
pub use sync::{SyncOutcome, SyncWorker};
pub use task::{Assignee, Comment, NewTask, Priority, StoredTask, SyncState, Task, TaskId, TaskStatus};
