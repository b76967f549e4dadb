//! Drag session state and click-versus-drag recognition.

use super::columns::Placement;
use crate::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragSession {
    #[default]
    Idle,
    Dragging { task: TaskId, origin: Placement },
}

impl DragSession {
    pub fn active_task(&self) -> Option<TaskId> {
        match self {
            Self::Idle => None,
            Self::Dragging { task, .. } => Some(*task),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }
}

/// A pointer position in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Point) -> u16 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// Pointer travelled past the threshold while holding a task.
    DragStarted(TaskId),
    /// Pointer moved during a recognized drag.
    DragMoved(Point),
    /// Released without a drag: open the task.
    Click(TaskId),
    /// Released after a drag. Never followed by a click.
    Dropped(Point),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    Pressed { task: TaskId, at: Point },
    Dragging { at: Point },
}

/// Turns raw pointer down/move/up into clicks and drags.
#[derive(Debug, Clone)]
pub struct PointerGesture {
    threshold: u16,
    state: GestureState,
}

impl PointerGesture {
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold: threshold.max(1),
            state: GestureState::Idle,
        }
    }

    pub fn press(&mut self, task: TaskId, at: Point) {
        self.state = GestureState::Pressed { task, at };
    }

    pub fn motion(&mut self, to: Point) -> Option<GestureEvent> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Pressed { task, at } => {
                if at.distance(to) >= self.threshold {
                    self.state = GestureState::Dragging { at: to };
                    Some(GestureEvent::DragStarted(task))
                } else {
                    None
                }
            }
            GestureState::Dragging { .. } => {
                self.state = GestureState::Dragging { at: to };
                Some(GestureEvent::DragMoved(to))
            }
        }
    }

    pub fn release(&mut self, at: Point) -> Option<GestureEvent> {
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::Idle => None,
            GestureState::Pressed { task, .. } => Some(GestureEvent::Click(task)),
            GestureState::Dragging { .. } => Some(GestureEvent::Dropped(at)),
        }
    }

    /// Pointer position of the drag preview, if a drag is recognized.
    pub fn preview_at(&self) -> Option<Point> {
        match self.state {
            GestureState::Dragging { at } => Some(at),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }
}
