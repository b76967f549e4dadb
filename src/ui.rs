use crate::app::App;
use crate::board::columns::{ColumnId, Columns};
use crate::board::drag::Point;
use crate::board::DropTarget;
use crate::stats::DashboardStats;
use crate::task::{Comment, StoredTask, SyncState, Task, TaskId};
use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Rows taken by one card, borders included.
pub const CARD_HEIGHT: u16 = 4;

#[derive(Debug, Clone)]
struct LaneArea {
    column: ColumnId,
    inner: Rect,
    tasks: Vec<TaskId>,
    visible: usize,
}

/// Where each lane and card was drawn, for pointer hit testing.
#[derive(Debug, Clone, Default)]
pub struct BoardLayout {
    lanes: Vec<LaneArea>,
}

impl BoardLayout {
    pub fn compute(area: Rect, columns: &Columns) -> Self {
        let chunks = lane_chunks(area);
        let lanes = columns
            .iter()
            .zip(chunks.iter())
            .map(|(column, chunk)| {
                let inner = lane_block(column.id, 0, false).inner(*chunk);
                LaneArea {
                    column: column.id,
                    inner,
                    tasks: column.tasks.iter().map(|task| task.id).collect(),
                    visible: visible_cards(inner, column.tasks.len()),
                }
            })
            .collect();
        Self { lanes }
    }

    /// A drawn card under the pointer, or the lane's area anywhere else in
    /// the lane. `None` outside every lane.
    pub fn hit(&self, point: Point) -> Option<DropTarget> {
        let lane = self.lanes.iter().find(|lane| contains(lane.inner, point))?;
        let row = usize::from((point.y - lane.inner.y) / CARD_HEIGHT);
        match lane.tasks.get(row).filter(|_| row < lane.visible) {
            Some(task) => Some(DropTarget::Task(*task)),
            None => Some(DropTarget::Column(lane.column)),
        }
    }

    pub fn lane_width(&self) -> u16 {
        self.lanes.first().map(|lane| lane.inner.width).unwrap_or(0)
    }
}

fn contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x
        && point.x < rect.x.saturating_add(rect.width)
        && point.y >= rect.y
        && point.y < rect.y.saturating_add(rect.height)
}

fn lane_chunks(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(area)
}

/// Cards drawn in a lane. When they do not all fit, the bottom row is kept
/// for the "+N more" marker.
fn visible_cards(inner: Rect, count: usize) -> usize {
    let fits = usize::from(inner.height / CARD_HEIGHT);
    if count <= fits {
        count
    } else {
        usize::from(inner.height.saturating_sub(1) / CARD_HEIGHT)
    }
}

fn card_rect(inner: Rect, row: usize) -> Option<Rect> {
    let offset = u16::try_from(row).ok()?.checked_mul(CARD_HEIGHT)?;
    if offset.saturating_add(CARD_HEIGHT) > inner.height {
        return None;
    }
    Some(Rect::new(inner.x, inner.y + offset, inner.width, CARD_HEIGHT))
}

fn lane_block(column: ColumnId, count: usize, highlighted: bool) -> Block<'static> {
    Block::default()
        .title(format!(" {} [{}] ", column.title(), count))
        .borders(Borders::ALL)
        .border_style(if highlighted {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        })
}

/// Header, three lanes, status line. Records the lane layout on `app`.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(CARD_HEIGHT + 2),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, rows[0], &app.stats());

    let layout = BoardLayout::compute(rows[1], app.board().columns());
    let hovered_lane = app
        .preview_at()
        .and_then(|point| layout.hit(point))
        .and_then(|target| match target {
            DropTarget::Column(column) => Some(column),
            DropTarget::Task(task) => app.board().columns().column_of(task),
        });
    let dragged = app.board().session().active_task();
    let today = app.today();

    for (column, chunk) in app.board().columns().iter().zip(lane_chunks(rows[1]).iter()) {
        let block = lane_block(column.id, column.tasks.len(), hovered_lane == Some(column.id));
        let inner = block.inner(*chunk);
        frame.render_widget(block, *chunk);
        let visible = visible_cards(inner, column.tasks.len());
        for (row, task) in column.tasks.iter().take(visible).enumerate() {
            let Some(rect) = card_rect(inner, row) else {
                break;
            };
            frame.render_widget(card(task, today, dragged == Some(task.id)), rect);
        }
        let hidden = column.tasks.len() - visible;
        if hidden > 0 && inner.height > 0 {
            let rect = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("+{hidden} more"),
                    Style::default().fg(Color::DarkGray),
                )),
                rect,
            );
        }
    }

    if let (Some(task), Some(point)) = (
        dragged.and_then(|id| app.board().columns().task(id)),
        app.preview_at(),
    ) {
        let area = frame.area();
        let width = layout.lane_width().max(12).min(area.width);
        let x = point.x.min(area.width.saturating_sub(width));
        let y = point.y.min(area.height.saturating_sub(CARD_HEIGHT));
        let rect = Rect::new(x, y, width, CARD_HEIGHT.min(area.height));
        frame.render_widget(Clear, rect);
        frame.render_widget(
            card(task, today, false).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            ),
            rect,
        );
    }

    let status = match app.status_line() {
        Some(message) => Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(
            "drag cards between lanes · click to open · Esc cancels · q quits",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(status), rows[2]);

    if let Some(detail) = app.detail() {
        draw_detail(frame, detail, app.comments(), today);
    }

    app.set_layout(layout);
}

fn draw_header(frame: &mut Frame, area: Rect, stats: &DashboardStats) {
    let line = Line::from(vec![
        Span::raw(format!("Open {}  ", stats.open)),
        Span::styled(format!("Overdue {}  ", stats.overdue), Style::default().fg(Color::Red)),
        Span::styled(format!("Due today {}  ", stats.due_today), Style::default().fg(Color::Yellow)),
        Span::styled(format!("Completed {}", stats.completed), Style::default().fg(Color::Green)),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(Block::default().title(" Kanban Board ").borders(Borders::ALL)),
        area,
    );
}

fn card(task: &Task, today: NaiveDate, placeholder: bool) -> Paragraph<'_> {
    let due_style = if task.is_overdue(today) {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut title = vec![Span::styled(
        task.title.as_str(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];
    if task.sync == SyncState::Syncing {
        title.push(Span::styled(" ~", Style::default().fg(Color::Yellow)));
    }
    let lines = vec![
        Line::from(title),
        Line::from(vec![
            Span::styled(task.due_label(), due_style),
            Span::raw("  "),
            Span::styled(format!("({})", task.initials()), Style::default().fg(Color::Cyan)),
        ]),
    ];
    let border = if placeholder {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    Paragraph::new(lines).block(Block::default().borders(Borders::ALL).border_style(border))
}

fn draw_detail(frame: &mut Frame, task: &StoredTask, comments: &[Comment], today: NaiveDate) {
    let area = centered(frame.area(), 60, 50);
    let due = match task.due_date {
        Some(date) if date < today => format!("{date} (overdue)"),
        Some(date) => date.to_string(),
        None => "No due date".to_string(),
    };
    let assignees = if task.assignees.is_empty() {
        "Unassigned".to_string()
    } else {
        task.assignees
            .iter()
            .map(|assignee| format!("{} <{}>", assignee.display_name(), assignee.email))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut lines = vec![
        Line::from(Span::styled(
            task.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Status:    {}", task.status)),
        Line::from(format!("Priority:  {}", task.priority)),
        Line::from(format!("Due:       {due}")),
        Line::from(format!("Assignees: {assignees}")),
        Line::from(format!("Created:   {}", task.created_at.format("%Y-%m-%d %H:%M"))),
        Line::from(""),
    ];
    lines.push(Line::from(
        task.description
            .as_deref()
            .unwrap_or("No description")
            .to_string(),
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Comments ({})", comments.len()),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if comments.is_empty() {
        lines.push(Line::from(Span::styled(
            "No comments yet",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for comment in comments {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} {}: ", comment.created_at.format("%Y-%m-%d %H:%M"), comment.author_label()),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(comment.content.as_str()),
        ]));
    }

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .title(" Task (p priority · Esc to close) ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        ),
        area,
    );
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
