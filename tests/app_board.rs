mod common;

use common::{stored_tasks, RecordingStore};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::sync::Arc;
use taskboard::app::App;
use taskboard::{ui, ColumnId, Config, Priority, TaskStatus, TaskStore};

// 90x30 terminal: header rows 0..3, lanes from row 3, first card of the
// first lane at rows 4..8, second lane spans roughly columns 30..60.
const FIRST_CARD: (u16, u16) = (5, 5);
const PROCESSING_AREA: (u16, u16) = (45, 6);
const DONE_FIRST_CARD: (u16, u16) = (70, 5);
const NEW_LANE_BOTTOM: (u16, u16) = (5, 20);

fn mouse(kind: MouseEventKind, (column, row): (u16, u16)) -> MouseEvent {
    MouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    }
}

fn mounted(store: &Arc<RecordingStore>) -> (App, Terminal<TestBackend>) {
    let mut app = App::mount(store.clone(), &Config::default()).unwrap();
    let mut terminal = Terminal::new(TestBackend::new(90, 30)).unwrap();
    terminal.draw(|frame| ui::draw(frame, &mut app)).unwrap();
    (app, terminal)
}

fn drag(app: &mut App, from: (u16, u16), to: (u16, u16)) {
    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), from));
    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), to));
    app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), to));
}

#[test]
fn mouse_drag_moves_task_and_persists_status() {
    let tasks = stored_tasks(&[("t1", TaskStatus::New), ("t2", TaskStatus::New)]);
    let (t1, t2) = (tasks[0].id, tasks[1].id);
    let store = Arc::new(RecordingStore::with_tasks(tasks));
    let (mut app, _terminal) = mounted(&store);

    drag(&mut app, FIRST_CARD, PROCESSING_AREA);
    assert!(app.wait_for_sync());

    let columns = app.board().columns();
    assert_eq!(columns.ids_in(ColumnId::New), vec![t2]);
    assert_eq!(columns.ids_in(ColumnId::Processing), vec![t1]);
    assert_eq!(store.updates(), vec![(t1, TaskStatus::Processing)]);
    assert_eq!(app.stats().open, 2);
    assert!(app.detail().is_none(), "a drag must not open the task");
}

#[test]
fn click_without_travel_opens_detail() {
    let tasks = stored_tasks(&[("t1", TaskStatus::New)]);
    let store = Arc::new(RecordingStore::with_tasks(tasks));
    let (mut app, _terminal) = mounted(&store);

    drag(&mut app, FIRST_CARD, FIRST_CARD);

    assert_eq!(app.detail().map(|task| task.title.as_str()), Some("t1"));
    assert!(store.updates().is_empty());

    app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
    assert!(app.detail().is_none());
}

#[test]
fn failed_sync_is_reported_and_rolled_back() {
    let tasks = stored_tasks(&[("t1", TaskStatus::New)]);
    let t1 = tasks[0].id;
    let store = Arc::new(RecordingStore::with_tasks(tasks));
    store.fail_next("permission denied");
    let (mut app, mut terminal) = mounted(&store);

    drag(&mut app, FIRST_CARD, PROCESSING_AREA);
    assert!(app.wait_for_sync());

    assert_eq!(app.board().columns().column_of(t1), Some(ColumnId::New));
    let message = app.status_line().expect("failure should be shown");
    assert!(message.contains("permission denied"));
    assert!(message.contains("t1"));

    terminal.draw(|frame| ui::draw(frame, &mut app)).unwrap();
}

#[test]
fn escape_cancels_a_drag_in_progress() {
    let tasks = stored_tasks(&[("t1", TaskStatus::New)]);
    let t1 = tasks[0].id;
    let store = Arc::new(RecordingStore::with_tasks(tasks));
    let (mut app, _terminal) = mounted(&store);

    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), FIRST_CARD));
    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), PROCESSING_AREA));
    assert_eq!(app.board().columns().column_of(t1), Some(ColumnId::Processing));

    app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
    app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), PROCESSING_AREA));

    assert_eq!(app.board().columns().column_of(t1), Some(ColumnId::New));
    assert!(!app.board().session().is_dragging());
    assert!(store.updates().is_empty());
}

#[test]
fn drag_preview_is_drawn_while_dragging() {
    let tasks = stored_tasks(&[("preview me", TaskStatus::New)]);
    let store = Arc::new(RecordingStore::with_tasks(tasks));
    let (mut app, mut terminal) = mounted(&store);

    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), FIRST_CARD));
    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), (50, 20)));
    assert!(app.preview_at().is_some());

    terminal.draw(|frame| ui::draw(frame, &mut app)).unwrap();
    let buffer = terminal.backend().buffer();
    let row: String = (0..90).map(|x| buffer[(x, 21)].symbol().to_string()).collect();
    assert!(row.contains("preview me"), "preview row was {row:?}");
}

#[test]
fn press_after_a_lost_release_drags_the_pressed_task() {
    let tasks = stored_tasks(&[("t1", TaskStatus::New), ("t2", TaskStatus::Done)]);
    let (t1, t2) = (tasks[0].id, tasks[1].id);
    let store = Arc::new(RecordingStore::with_tasks(tasks));
    let (mut app, _terminal) = mounted(&store);

    // Release never arrives, e.g. the pointer left the terminal.
    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), FIRST_CARD));
    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), PROCESSING_AREA));
    assert_eq!(app.board().columns().column_of(t1), Some(ColumnId::Processing));

    drag(&mut app, DONE_FIRST_CARD, NEW_LANE_BOTTOM);
    assert!(app.wait_for_sync());

    let columns = app.board().columns();
    assert_eq!(columns.column_of(t1), Some(ColumnId::New));
    assert_eq!(columns.column_of(t2), Some(ColumnId::New));
    assert!(columns.ids_in(ColumnId::Processing).is_empty());
    assert_eq!(store.updates(), vec![(t2, TaskStatus::New)]);
    assert!(!app.board().session().is_dragging());
}

#[test]
fn hidden_cards_are_not_drop_targets() {
    let names: Vec<String> = (0..8).map(|i| format!("t{i}")).collect();
    let specs: Vec<(&str, TaskStatus)> = names
        .iter()
        .map(|name| (name.as_str(), TaskStatus::New))
        .collect();
    let tasks = stored_tasks(&specs);
    let order: Vec<_> = tasks.iter().map(|task| task.id).collect();
    let store = Arc::new(RecordingStore::with_tasks(tasks));
    let mut app = App::mount(store.clone(), &Config::default()).unwrap();
    let mut terminal = Terminal::new(TestBackend::new(90, 25)).unwrap();
    terminal.draw(|frame| ui::draw(frame, &mut app)).unwrap();

    // Four cards fit in the first lane; its last inner row holds the marker.
    let buffer = terminal.backend().buffer();
    let row: String = (0..30).map(|x| buffer[(x, 22)].symbol().to_string()).collect();
    assert!(row.contains("+4 more"), "marker row was {row:?}");

    drag(&mut app, FIRST_CARD, (5, 21));
    drag(&mut app, FIRST_CARD, (5, 22));

    assert_eq!(app.board().columns().ids_in(ColumnId::New), order);
    assert!(store.updates().is_empty());
}

#[test]
fn detail_shows_comments_and_cycles_priority() {
    let tasks = stored_tasks(&[("t1", TaskStatus::New)]);
    let t1 = tasks[0].id;
    let store = Arc::new(RecordingStore::with_tasks(tasks));
    store.add_comment(t1, Some("ada@example.com"), "looks good").unwrap();
    let (mut app, mut terminal) = mounted(&store);

    drag(&mut app, FIRST_CARD, FIRST_CARD);
    assert_eq!(app.comments().len(), 1);

    terminal.draw(|frame| ui::draw(frame, &mut app)).unwrap();
    let buffer = terminal.backend().buffer();
    let screen: String = (0..30)
        .flat_map(|y| (0..90).map(move |x| (x, y)))
        .map(|cell| buffer[cell].symbol().to_string())
        .collect();
    assert!(screen.contains("ada: looks good"));

    app.handle_key(KeyEvent::new(KeyCode::Char('p'), KeyModifiers::NONE));
    assert_eq!(app.detail().map(|task| task.priority), Some(Priority::Fast));
    assert_eq!(store.priority_of(t1), Some(Priority::Fast));

    app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
    assert!(app.detail().is_none());
    assert!(app.comments().is_empty());
}
