//! The mounted board: owns the board state for as long as it is alive and
//! turns terminal input into board actions.

use crate::board::drag::{GestureEvent, Point, PointerGesture};
use crate::board::{Action, Board, DropTarget, Effect};
use crate::config::Config;
use crate::stats::DashboardStats;
use crate::store::{StoreError, StoreResult, TaskStore};
use crate::sync::SyncWorker;
use crate::task::{Comment, StoredTask, TaskId};
use crate::ui::{self, BoardLayout};
use chrono::{Local, NaiveDate};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{backend::Backend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct App {
    store: Arc<dyn TaskStore>,
    user: Option<String>,
    board: Board,
    gesture: PointerGesture,
    sync: SyncWorker,
    layout: BoardLayout,
    detail: Option<StoredTask>,
    comments: Vec<Comment>,
    status_line: Option<String>,
    stats: DashboardStats,
    today: NaiveDate,
    should_quit: bool,
}

impl App {
    /// Loads the snapshot and starts the sync worker. Load failures are the
    /// caller's to report.
    pub fn mount(store: Arc<dyn TaskStore>, config: &Config) -> StoreResult<Self> {
        let user = config.user.clone();
        let snapshot = store.load_board_snapshot(user.as_deref())?;
        let sync = SyncWorker::spawn(Arc::clone(&store))
            .map_err(|err| StoreError::Unavailable(format!("cannot start status sync: {err}")))?;
        let board = Board::new(snapshot);
        info!(tasks = board.columns().len(), "board mounted");
        let mut app = Self {
            store,
            user,
            board,
            gesture: PointerGesture::new(config.drag_threshold),
            sync,
            layout: BoardLayout::default(),
            detail: None,
            comments: Vec::new(),
            status_line: None,
            stats: DashboardStats::default(),
            today: Local::now().date_naive(),
            should_quit: false,
        };
        app.refresh_stats();
        Ok(app)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn stats(&self) -> DashboardStats {
        self.stats
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn detail(&self) -> Option<&StoredTask> {
        self.detail.as_ref()
    }

    /// Comments of the open task, oldest first.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    pub fn preview_at(&self) -> Option<Point> {
        self.gesture.preview_at()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn set_layout(&mut self, layout: BoardLayout) {
        self.layout = layout;
    }

    pub fn dispatch(&mut self, action: Action) {
        let effect = self.board.apply(action);
        self.handle_effect(effect);
    }

    fn handle_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Sync(request) => {
                if let Some(outcome) = self.sync.submit(request) {
                    self.dispatch(outcome.into_action());
                }
            }
            Effect::Confirmed { .. } => {
                self.status_line = None;
                self.refresh_stats();
            }
            Effect::RolledBack { task, to, error } => {
                let title = self
                    .board
                    .columns()
                    .task(task)
                    .map(|card| card.title.clone())
                    .unwrap_or_else(|| task.to_string());
                self.status_line = Some(format!(
                    "Failed to update task status for \"{title}\" (back in {}): {error}",
                    to.title()
                ));
            }
            Effect::None
            | Effect::Hovered(_)
            | Effect::Restored(_)
            | Effect::Queued { .. }
            | Effect::Stale(_) => {}
        }
    }

    /// Applies every status result that has arrived since the last call.
    pub fn pump_sync(&mut self) {
        while let Some(outcome) = self.sync.try_next() {
            self.dispatch(outcome.into_action());
        }
    }

    /// Blocks for one status result. Returns `false` once the worker is gone.
    pub fn wait_for_sync(&mut self) -> bool {
        match self.sync.next_blocking() {
            Some(outcome) => {
                self.dispatch(outcome.into_action());
                true
            }
            None => false,
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Key(key) => self.handle_key(key),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let point = Point::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                // The release of the last drag may never have arrived.
                if self.board.session().is_dragging() {
                    self.gesture.reset();
                    self.dispatch(Action::CancelDrag);
                }
                if self.detail.take().is_some() {
                    self.comments.clear();
                    return;
                }
                if let Some(DropTarget::Task(task)) = self.layout.hit(point) {
                    self.gesture.press(task, point);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => match self.gesture.motion(point) {
                Some(GestureEvent::DragStarted(task)) => {
                    self.dispatch(Action::BeginDrag(task));
                    self.hover(point);
                }
                Some(GestureEvent::DragMoved(at)) => self.hover(at),
                _ => {}
            },
            MouseEventKind::Up(MouseButton::Left) => match self.gesture.release(point) {
                Some(GestureEvent::Click(task)) => self.open_detail(task),
                Some(GestureEvent::Dropped(at)) => {
                    let target = self.layout.hit(at);
                    self.dispatch(Action::Drop(target));
                }
                _ => {}
            },
            _ => {}
        }
    }

    fn hover(&mut self, point: Point) {
        if let Some(target) = self.layout.hit(point) {
            self.dispatch(Action::Hover(target));
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Esc if self.board.session().is_dragging() => {
                self.gesture.reset();
                self.dispatch(Action::CancelDrag);
            }
            KeyCode::Esc => {
                self.detail = None;
                self.comments.clear();
                self.status_line = None;
            }
            KeyCode::Char('p') if self.detail.is_some() => self.cycle_priority(),
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn open_detail(&mut self, task: TaskId) {
        match self.store.get_task(task) {
            Ok(Some(stored)) => {
                self.comments = self.store.list_comments(task).unwrap_or_else(|err| {
                    warn!(task = %task, error = %err, "failed to load comments");
                    Vec::new()
                });
                self.detail = Some(stored);
            }
            Ok(None) => self.status_line = Some(format!("Task {task} no longer exists")),
            Err(err) => {
                warn!(task = %task, error = %err, "failed to load task details");
                self.status_line = Some(format!("Failed to load task: {err}"));
            }
        }
    }

    fn cycle_priority(&mut self) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        let priority = detail.priority.next();
        match self.store.update_task_priority(detail.id, priority) {
            Ok(()) => detail.priority = priority,
            Err(err) => {
                warn!(task = %detail.id, error = %err, "failed to update task priority");
                self.status_line = Some(format!("Failed to update task priority: {err}"));
            }
        }
    }

    fn refresh_stats(&mut self) {
        match self.store.list_tasks(self.user.as_deref()) {
            Ok(tasks) => self.stats = DashboardStats::compute(&tasks, self.today),
            Err(err) => warn!(error = %err, "failed to refresh dashboard stats"),
        }
    }
}

/// Event loop: draw, wait up to `tick` for input, apply finished syncs.
pub fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, tick: Duration) -> io::Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(tick)? {
            app.handle_event(event::read()?);
        }
        app.pump_sync();

        if app.should_quit() {
            return Ok(());
        }
    }
}
