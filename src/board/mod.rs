//! Board state manager.
//!
//! All state changes go through [`Board::apply`], a reducer over [`Action`].
//! Hover actions splice the lanes optimistically; a drop that changes a task's
//! lane produces a [`SyncRequest`] for the caller to run against the store,
//! and the caller feeds the outcome back as `CommitSucceeded`/`CommitFailed`.
//!
//! Status updates are serialized per task: while one request for a task is in
//! flight, further drops of that task are queued (latest wins) and issued once
//! the in-flight request settles. Results carrying a ticket other than the
//! in-flight one are ignored.

pub mod columns;
pub mod drag;

use crate::task::{SyncState, TaskId, TaskStatus};
use columns::{BoardSnapshot, ColumnId, Columns, Placement};
use drag::DragSession;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// What the pointer is over during a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Task(TaskId),
    /// Empty area of a lane.
    Column(ColumnId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyncTicket(u64);

/// One status update to send to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRequest {
    pub ticket: SyncTicket,
    pub task: TaskId,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    BeginDrag(TaskId),
    Hover(DropTarget),
    /// `None` when released outside any drop target.
    Drop(Option<DropTarget>),
    CancelDrag,
    CommitSucceeded { task: TaskId, ticket: SyncTicket },
    CommitFailed {
        task: TaskId,
        ticket: SyncTicket,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverOutcome {
    Ignored,
    Reordered,
    Moved,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Hovered(HoverOutcome),
    /// Drag ended and the task went back to where it started.
    Restored(TaskId),
    /// Run this request against the store.
    Sync(SyncRequest),
    /// Deferred behind an in-flight request for the same task.
    Queued { task: TaskId, status: TaskStatus },
    Confirmed { task: TaskId, status: TaskStatus },
    RolledBack {
        task: TaskId,
        to: ColumnId,
        error: String,
    },
    /// A result for a request that is no longer the in-flight one.
    Stale(SyncTicket),
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    status: TaskStatus,
    origin: Placement,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: SyncTicket,
    request: Pending,
    queued: Option<Pending>,
}

#[derive(Debug)]
pub struct Board {
    columns: Columns,
    session: DragSession,
    /// Lane matching the last status the store acknowledged.
    confirmed: HashMap<TaskId, ColumnId>,
    in_flight: HashMap<TaskId, InFlight>,
    next_ticket: u64,
}

impl Board {
    pub fn new(snapshot: BoardSnapshot) -> Self {
        let columns = Columns::from_snapshot(snapshot);
        let confirmed = columns
            .iter()
            .flat_map(|column| column.tasks.iter().map(move |task| (task.id, column.id)))
            .collect();
        Self {
            columns,
            session: DragSession::Idle,
            confirmed,
            in_flight: HashMap::new(),
            next_ticket: 0,
        }
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn session(&self) -> DragSession {
        self.session
    }

    pub fn confirmed_column(&self, task: TaskId) -> Option<ColumnId> {
        self.confirmed.get(&task).copied()
    }

    pub fn is_syncing(&self, task: TaskId) -> bool {
        self.in_flight.contains_key(&task)
    }

    pub fn apply(&mut self, action: Action) -> Effect {
        match action {
            Action::BeginDrag(task) => self.begin_drag(task),
            Action::Hover(target) => Effect::Hovered(self.hover(target)),
            Action::Drop(target) => self.drop(target),
            Action::CancelDrag => self.cancel(),
            Action::CommitSucceeded { task, ticket } => self.commit_succeeded(task, ticket),
            Action::CommitFailed {
                task,
                ticket,
                error,
            } => self.commit_failed(task, ticket, error),
        }
    }

    fn begin_drag(&mut self, task: TaskId) -> Effect {
        if self.session.is_dragging() {
            return Effect::None;
        }
        let Some(origin) = self.columns.position_of(task) else {
            return Effect::None;
        };
        debug!(task = %task, column = %origin.column, index = origin.index, "drag started");
        self.session = DragSession::Dragging { task, origin };
        Effect::None
    }

    fn hover(&mut self, target: DropTarget) -> HoverOutcome {
        let Some(active) = self.session.active_task() else {
            return HoverOutcome::Ignored;
        };
        if target == DropTarget::Task(active) {
            return HoverOutcome::Ignored;
        }
        let Some(from) = self.columns.position_of(active) else {
            return HoverOutcome::Ignored;
        };
        let (to, over_index) = match target {
            DropTarget::Task(over) => match self.columns.position_of(over) {
                Some(placement) => (placement.column, Some(placement.index)),
                None => return HoverOutcome::Ignored,
            },
            DropTarget::Column(column) => (column, None),
        };

        if from.column == to {
            return match over_index {
                Some(index) if index != from.index => {
                    self.columns.reorder(to, from.index, index);
                    HoverOutcome::Reordered
                }
                _ => HoverOutcome::Ignored,
            };
        }

        let index = match over_index {
            Some(index) => index + 1,
            None => self.columns.column(to).tasks.len(),
        };
        self.columns.relocate(active, to, index);
        debug!(task = %active, from = %from.column, to = %to, "task moved across columns");
        HoverOutcome::Moved
    }

    fn drop(&mut self, target: Option<DropTarget>) -> Effect {
        let DragSession::Dragging { task, origin } = std::mem::take(&mut self.session) else {
            return Effect::None;
        };
        let valid = match target {
            Some(DropTarget::Task(over)) => self.columns.column_of(over).is_some(),
            Some(DropTarget::Column(_)) => true,
            None => false,
        };
        if !valid {
            self.columns.relocate(task, origin.column, origin.index);
            debug!(task = %task, "dropped outside the board");
            return Effect::Restored(task);
        }

        let Some(current) = self.columns.column_of(task) else {
            return Effect::None;
        };
        if current == origin.column {
            return Effect::None;
        }
        self.commit(task, Pending {
            status: current.status(),
            origin,
        })
    }

    fn cancel(&mut self) -> Effect {
        let DragSession::Dragging { task, origin } = std::mem::take(&mut self.session) else {
            return Effect::None;
        };
        self.columns.relocate(task, origin.column, origin.index);
        Effect::Restored(task)
    }

    fn commit(&mut self, task: TaskId, pending: Pending) -> Effect {
        if let Some(slot) = self.in_flight.get_mut(&task) {
            slot.queued = Some(pending);
            debug!(task = %task, status = %pending.status, "status update queued");
            return Effect::Queued {
                task,
                status: pending.status,
            };
        }
        Effect::Sync(self.issue(task, pending))
    }

    fn issue(&mut self, task: TaskId, pending: Pending) -> SyncRequest {
        self.next_ticket += 1;
        let ticket = SyncTicket(self.next_ticket);
        self.in_flight.insert(
            task,
            InFlight {
                ticket,
                request: pending,
                queued: None,
            },
        );
        self.set_sync_state(task, SyncState::Syncing);
        info!(task = %task, status = %pending.status, "status update issued");
        SyncRequest {
            ticket,
            task,
            status: pending.status,
        }
    }

    fn commit_succeeded(&mut self, task: TaskId, ticket: SyncTicket) -> Effect {
        let Some(slot) = self.take_in_flight(task, ticket) else {
            return Effect::Stale(ticket);
        };
        let status = slot.request.status;
        if let Some(column) = ColumnId::for_status(status) {
            self.confirmed.insert(task, column);
        }
        info!(task = %task, status = %status, "status update confirmed");
        match self.next_queued(task, slot.queued) {
            Some(request) => Effect::Sync(request),
            None => Effect::Confirmed { task, status },
        }
    }

    fn commit_failed(&mut self, task: TaskId, ticket: SyncTicket, error: String) -> Effect {
        let Some(slot) = self.take_in_flight(task, ticket) else {
            return Effect::Stale(ticket);
        };
        warn!(task = %task, status = %slot.request.status, error = %error, "status update failed");
        if let Some(request) = self.next_queued(task, slot.queued) {
            return Effect::Sync(request);
        }
        if slot.queued.is_some() {
            // Latest drop already matches the stored status.
            return Effect::None;
        }

        let Some(confirmed) = self.confirmed_column(task) else {
            return Effect::None;
        };
        let index = if slot.request.origin.column == confirmed {
            slot.request.origin.index
        } else {
            usize::MAX
        };
        if let Some(placement) = self.columns.relocate(task, confirmed, index) {
            if let DragSession::Dragging { task: active, origin } = &mut self.session {
                if *active == task {
                    *origin = placement;
                }
            }
        }
        Effect::RolledBack {
            task,
            to: confirmed,
            error,
        }
    }

    fn take_in_flight(&mut self, task: TaskId, ticket: SyncTicket) -> Option<InFlight> {
        match self.in_flight.get(&task) {
            Some(slot) if slot.ticket == ticket => {}
            _ => {
                debug!(task = %task, ticket = ticket.0, "ignoring stale status result");
                return None;
            }
        }
        let slot = self.in_flight.remove(&task)?;
        self.set_sync_state(task, SyncState::Idle);
        Some(slot)
    }

    /// Issues the queued drop unless the store already holds its status.
    fn next_queued(&mut self, task: TaskId, queued: Option<Pending>) -> Option<SyncRequest> {
        let pending = queued?;
        if self.confirmed_column(task).map(ColumnId::status) == Some(pending.status) {
            return None;
        }
        Some(self.issue(task, pending))
    }

    fn set_sync_state(&mut self, task: TaskId, state: SyncState) {
        if let Some(card) = self.columns.task_mut(task) {
            card.sync = state;
        }
    }
}
