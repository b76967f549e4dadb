use crate::task::{Task, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The three fixed lanes of the board. `Archived` tasks have no lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnId {
    New,
    Processing,
    Done,
}

impl ColumnId {
    pub const ALL: [ColumnId; 3] = [ColumnId::New, ColumnId::Processing, ColumnId::Done];

    pub fn index(self) -> usize {
        match self {
            Self::New => 0,
            Self::Processing => 1,
            Self::Done => 2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Processing => "Processing",
            Self::Done => "Done",
        }
    }

    pub fn status(self) -> TaskStatus {
        match self {
            Self::New => TaskStatus::New,
            Self::Processing => TaskStatus::Processing,
            Self::Done => TaskStatus::Done,
        }
    }

    pub fn for_status(status: TaskStatus) -> Option<Self> {
        match status {
            TaskStatus::New => Some(Self::New),
            TaskStatus::Processing => Some(Self::Processing),
            TaskStatus::Done => Some(Self::Done),
            TaskStatus::Archived => None,
        }
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Done => "done",
        };
        f.write_str(id)
    }
}

/// Tasks grouped by lane, as handed to the board at mount time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    pub new: Vec<Task>,
    pub processing: Vec<Task>,
    pub done: Vec<Task>,
}

impl BoardSnapshot {
    pub fn group_mut(&mut self, column: ColumnId) -> &mut Vec<Task> {
        match column {
            ColumnId::New => &mut self.new,
            ColumnId::Processing => &mut self.processing,
            ColumnId::Done => &mut self.done,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub id: ColumnId,
    pub title: &'static str,
    pub tasks: Vec<Task>,
}

/// Where a task sits on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub column: ColumnId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Columns {
    lanes: [Column; 3],
}

impl Columns {
    pub fn from_snapshot(snapshot: BoardSnapshot) -> Self {
        let BoardSnapshot {
            new,
            processing,
            done,
        } = snapshot;
        let lane = |id: ColumnId, tasks: Vec<Task>| Column {
            id,
            title: id.title(),
            tasks,
        };
        Self {
            lanes: [
                lane(ColumnId::New, new),
                lane(ColumnId::Processing, processing),
                lane(ColumnId::Done, done),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.lanes.iter()
    }

    pub fn column(&self, id: ColumnId) -> &Column {
        &self.lanes[id.index()]
    }

    pub fn column_of(&self, task: TaskId) -> Option<ColumnId> {
        self.position_of(task).map(|placement| placement.column)
    }

    pub fn position_of(&self, task: TaskId) -> Option<Placement> {
        self.lanes.iter().find_map(|lane| {
            lane.tasks
                .iter()
                .position(|candidate| candidate.id == task)
                .map(|index| Placement {
                    column: lane.id,
                    index,
                })
        })
    }

    pub fn task(&self, task: TaskId) -> Option<&Task> {
        self.lanes
            .iter()
            .flat_map(|lane| lane.tasks.iter())
            .find(|candidate| candidate.id == task)
    }

    pub(crate) fn task_mut(&mut self, task: TaskId) -> Option<&mut Task> {
        self.lanes
            .iter_mut()
            .flat_map(|lane| lane.tasks.iter_mut())
            .find(|candidate| candidate.id == task)
    }

    pub fn task_ids(&self) -> BTreeSet<TaskId> {
        self.lanes
            .iter()
            .flat_map(|lane| lane.tasks.iter().map(|task| task.id))
            .collect()
    }

    pub fn ids_in(&self, column: ColumnId) -> Vec<TaskId> {
        self.column(column).tasks.iter().map(|task| task.id).collect()
    }

    pub fn len(&self) -> usize {
        self.lanes.iter().map(|lane| lane.tasks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Array move within one lane; shifts the tasks in between by one.
    pub(crate) fn reorder(&mut self, column: ColumnId, from: usize, to: usize) {
        let tasks = &mut self.lanes[column.index()].tasks;
        if from >= tasks.len() || to >= tasks.len() || from == to {
            return;
        }
        let task = tasks.remove(from);
        tasks.insert(to, task);
    }

    pub(crate) fn take(&mut self, task: TaskId) -> Option<(Placement, Task)> {
        let placement = self.position_of(task)?;
        let removed = self.lanes[placement.column.index()]
            .tasks
            .remove(placement.index);
        Some((placement, removed))
    }

    /// Inserts at `index`, clamped to the end of the lane.
    pub(crate) fn insert(&mut self, column: ColumnId, index: usize, task: Task) -> Placement {
        let tasks = &mut self.lanes[column.index()].tasks;
        let index = index.min(tasks.len());
        tasks.insert(index, task);
        Placement { column, index }
    }

    /// Moves an existing task to `column` at `index` (clamped).
    pub(crate) fn relocate(&mut self, task: TaskId, column: ColumnId, index: usize) -> Option<Placement> {
        let (_, removed) = self.take(task)?;
        Some(self.insert(column, index, removed))
    }
}
