//! Main application logic for the terminal dashboard.
//!
//! `Dashboard` owns the snapshot and the view state for one scope. Every key
//! that changes filters, ordering, expansion or page re-runs the pipeline and
//! caches the visible lines, so rendering never touches the pipeline itself.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use tracing::{debug, warn};

use crate::config::BoardConfig;
use crate::display::{assignee_names, direction_arrow, format_criteria, format_due_relative};
use crate::fields::{format_column, format_scope, format_status, Scope, SortColumn, TaskStatus};
use crate::pipeline::{BoardIndex, Pipeline, ViewState};
use crate::scope::{BoardSource, TaskQuery};
use crate::snapshot::Snapshot;
use crate::sort::SortCriterion;
use crate::task::Task;
use crate::tui::colors::{scope_color, status_color, LATE_RED};
use crate::tui::input::InputField;

/// One line of the table: a top-level row or a subtask under an expanded row.
#[derive(Debug, Clone)]
struct DisplayRow {
    id: String,
    /// Top-level row this line belongs to; equal to `id` for top-level lines.
    row_id: String,
    depth: usize,
    marker: &'static str,
    status: TaskStatus,
    overdue: bool,
    cells: [String; 8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Filter,
}

/// State of the running dashboard.
pub struct Dashboard {
    snap: Snapshot,
    data_path: PathBuf,
    config: BoardConfig,
    user: String,
    scope: Scope,
    pipeline: Pipeline,
    view: ViewState,
    rows: Vec<DisplayRow>,
    top_level: usize,
    matched: usize,
    total: usize,
    dropped: usize,
    criteria: Vec<SortCriterion>,
    table_state: TableState,
    filter: InputField,
    mode: InputMode,
    show_help: bool,
    status_message: String,
}

impl Dashboard {
    pub fn new(snap: Snapshot, data_path: &Path, config: BoardConfig, user: String, scope: Scope) -> Self {
        let mut view = ViewState::default();
        view.pagination.page_size = config.page_size;
        let mut app = Dashboard {
            snap,
            data_path: data_path.to_path_buf(),
            pipeline: config.pipeline(scope),
            config,
            user,
            scope,
            view,
            rows: Vec::new(),
            top_level: 0,
            matched: 0,
            total: 0,
            dropped: 0,
            criteria: Vec::new(),
            table_state: TableState::default(),
            filter: InputField::new(),
            mode: InputMode::Normal,
            show_help: false,
            status_message: String::new(),
        };
        app.refresh();
        app
    }

    /// Re-run the pipeline and rebuild the visible lines, keeping the selection
    /// on the same task when it is still shown.
    fn refresh(&mut self) {
        let keep = self.selected_id().map(str::to_string);
        let today = Local::now().date_naive();

        let query = TaskQuery::new(self.scope, self.user.as_str());
        let tasks = match self.snap.query_tasks(&query) {
            Ok(tasks) => tasks,
            Err(e) => {
                self.status_message = e.to_string();
                Vec::new()
            }
        };
        let index = BoardIndex::build(tasks.iter().copied(), &self.snap.users, &self.snap.departments);
        let board = self.pipeline.run(tasks.iter().copied(), &mut self.view, &index);

        let mut rows = Vec::new();
        for row in board.page(&self.view.pagination) {
            let expanded = self.view.is_expanded(&row.task.id);
            let marker = match (row.has_subtasks, expanded) {
                (false, _) => " ",
                (true, true) => "▾",
                (true, false) => "▸",
            };
            rows.push(display_row(row.task, &row.task.id, 0, marker, today, &index));
            if expanded {
                for sub in &row.subtasks {
                    rows.push(display_row(sub, &row.task.id, 1, " ", today, &index));
                }
            }
        }

        self.top_level = board.hierarchy.rows.len();
        self.matched = board.matched;
        self.total = board.total;
        self.dropped = board.hierarchy.dropped.len();
        self.criteria = board.criteria;
        self.rows = rows;

        let selected = match keep.and_then(|id| self.rows.iter().position(|r| r.id == id)) {
            Some(i) => Some(i),
            None if self.rows.is_empty() => None,
            None => Some(self.table_state.selected().unwrap_or(0).min(self.rows.len() - 1)),
        };
        self.table_state.select(selected);
    }

    fn selected_id(&self) -> Option<&str> {
        self.table_state.selected().and_then(|i| self.rows.get(i)).map(|r| r.id.as_str())
    }

    /// Ids of the lines currently shown, in display order.
    pub fn visible_ids(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.id.as_str()).collect()
    }

    fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = self.table_state.selected().map_or(0, |i| (i + 1).min(self.rows.len() - 1));
        self.table_state.select(Some(i));
    }

    fn select_prev(&mut self) {
        let i = self.table_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.table_state.select(Some(i));
    }

    /// Expand or collapse the row owning the selected line.
    fn toggle_selected(&mut self) {
        let Some(row_id) = self.table_state.selected().and_then(|i| self.rows.get(i)).map(|r| r.row_id.clone()) else {
            return;
        };
        let expanded = self.view.toggle_expanded(&row_id);
        debug!(row = %row_id, expanded, "row toggled");
        self.refresh();
        if !expanded {
            let at = self.rows.iter().position(|r| r.id == row_id);
            self.table_state.select(at);
        }
    }

    fn toggle_column(&mut self, column: SortColumn) {
        self.pipeline.toggle_sort(&mut self.view, column);
        self.status_message = format!("Sorted by {}", format_criteria(self.pipeline.active_criteria(&self.view)));
        self.refresh();
    }

    /// Step the status filter through none, each status, then none again.
    fn cycle_status_filter(&mut self) {
        const ORDER: [TaskStatus; 4] =
            [TaskStatus::ToDo, TaskStatus::InProgress, TaskStatus::Blocked, TaskStatus::Completed];
        let next = match self.view.filters.statuses.as_slice() {
            [] => Some(ORDER[0]),
            [current] => ORDER.iter().position(|s| s == current).and_then(|i| ORDER.get(i + 1)).copied(),
            _ => None,
        };
        self.view.filters.statuses = next.into_iter().collect();
        self.view.pagination.page = 0;
        self.refresh();
    }

    /// Move to the next dashboard the user may open.
    fn next_scope(&mut self) {
        const ORDER: [Scope; 4] = [Scope::Personal, Scope::Department, Scope::Company, Scope::HrAdmin];
        let hr = self.snap.user(&self.user).is_some_and(|u| u.has_hr_access());
        let start = ORDER.iter().position(|s| *s == self.scope).unwrap_or(0);
        let next = (1..=ORDER.len())
            .map(|step| ORDER[(start + step) % ORDER.len()])
            .find(|s| *s != Scope::HrAdmin || hr)
            .unwrap_or(Scope::Personal);

        self.scope = next;
        self.pipeline = self.config.pipeline(next);
        self.view.criteria.clear();
        self.view.pagination.page = 0;
        self.status_message = format!("Switched to {}", format_scope(next));
        self.refresh();
    }

    /// Re-read the snapshot file and recompute.
    fn reload(&mut self) {
        match Snapshot::load(&self.data_path) {
            Ok(snap) => {
                self.snap = snap;
                self.status_message = "Reloaded".into();
            }
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.status_message = e.to_string();
            }
        }
        self.refresh();
    }

    fn apply_title_filter(&mut self) {
        self.view.filters.title = self.filter.value.clone();
        self.view.pagination.page = 0;
        self.refresh();
    }

    fn handle_filter_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                self.mode = InputMode::Normal;
                self.filter.active = false;
            }
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                self.filter.active = false;
                self.filter.clear();
                self.apply_title_filter();
            }
            KeyCode::Char(c) => {
                self.filter.handle_char(c);
                self.apply_title_filter();
            }
            KeyCode::Backspace => {
                self.filter.handle_backspace();
                self.apply_title_filter();
            }
            KeyCode::Delete => {
                self.filter.handle_delete();
                self.apply_title_filter();
            }
            KeyCode::Left => self.filter.move_cursor_left(),
            KeyCode::Right => self.filter.move_cursor_right(),
            _ => {}
        }
    }

    /// Apply one key press. Returns true if the dashboard should close.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        if self.mode == InputMode::Filter {
            self.handle_filter_input(key);
            return false;
        }
        if self.show_help {
            self.show_help = false;
            return false;
        }
        self.status_message.clear();

        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char(c @ '1'..='8') => {
                let column = SortColumn::ALL[(c as u8 - b'1') as usize];
                self.toggle_column(column);
            }
            KeyCode::Char('0') => {
                self.view.criteria.clear();
                self.refresh();
            }
            KeyCode::Char('/') => {
                self.mode = InputMode::Filter;
                self.filter.active = true;
            }
            KeyCode::Char('s') => self.cycle_status_filter(),
            KeyCode::Char('c') => {
                self.view.collapse_all();
                self.refresh();
            }
            KeyCode::Right | KeyCode::PageDown | KeyCode::Char('n') => {
                self.view.pagination.next(self.top_level);
                self.table_state.select(Some(0));
                self.refresh();
            }
            KeyCode::Left | KeyCode::PageUp | KeyCode::Char('p') => {
                self.view.pagination.prev();
                self.table_state.select(Some(0));
                self.refresh();
            }
            KeyCode::Tab => self.next_scope(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('h') | KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
        false
    }

    /// Poll for a key press. Returns true if the dashboard should close.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code));
                }
            }
        }
        Ok(false)
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_table(f, chunks[1]);
        self.render_footer(f, chunks[2]);
        if self.show_help {
            render_help(f);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let viewer = self.snap.user(&self.user).map(|u| u.name.as_str()).unwrap_or(self.user.as_str());
        let header = Line::from(vec![
            Span::styled("TASK BOARD", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("{}  ·  {}", format_scope(self.scope), viewer),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]);
        let block = Paragraph::new(header)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(scope_color(self.scope))))
            .alignment(Alignment::Center);
        f.render_widget(block, area);
    }

    fn render_table(&mut self, f: &mut Frame, area: Rect) {
        let band = scope_color(self.scope);
        let header = Row::new(SortColumn::ALL.iter().enumerate().map(|(i, col)| {
            let arrow = self
                .criteria
                .iter()
                .position(|c| c.key == *col)
                .map(|p| format!("{}{}", direction_arrow(self.criteria[p].direction), if self.criteria.len() > 1 { (p + 1).to_string() } else { String::new() }))
                .unwrap_or_default();
            Cell::from(format!("{} {}{}", i + 1, format_column(*col), arrow))
                .style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(band).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|r| {
                let mut cells: Vec<Cell> = r.cells.iter().cloned().map(Cell::from).collect();
                cells[0] = Cell::from(format!("{}{} {}", "  ".repeat(r.depth), r.marker, r.cells[0]));
                if r.overdue {
                    cells[3] = Cell::from(r.cells[3].clone()).style(Style::default().fg(LATE_RED));
                }
                let mut style = Style::default().fg(status_color(r.status));
                if r.depth > 0 {
                    style = style.add_modifier(Modifier::DIM);
                }
                Row::new(cells).style(style)
            })
            .collect();

        let widths = [
            Constraint::Min(28),    // Title
            Constraint::Length(14), // Status
            Constraint::Length(7),  // Priority
            Constraint::Length(10), // Due
            Constraint::Length(24), // Department
            Constraint::Length(18), // Assignees
            Constraint::Length(14), // Project
            Constraint::Length(16), // Tags
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}/{}) - page {}/{} - Press 'h' for help",
                self.matched,
                self.total,
                self.view.pagination.page + 1,
                self.view.pagination.page_count(self.top_level)
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_footer(&self, f: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled("Filter: ", Style::default().add_modifier(Modifier::BOLD))];
        let filter_style = if self.mode == InputMode::Filter {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!("{:<20}", self.filter.value), filter_style));
        if let [status] = self.view.filters.statuses.as_slice() {
            spans.push(Span::raw(format!("  status={}", format_status(*status))));
        }
        spans.push(Span::raw(format!("  sorted by {}", format_criteria(&self.criteria))));
        if self.dropped > 0 {
            spans.push(Span::styled(format!("  {} hidden subtask(s)", self.dropped), Style::default().fg(Color::DarkGray)));
        }
        if !self.status_message.is_empty() {
            spans.push(Span::styled(format!("  {}", self.status_message), Style::default().fg(Color::Cyan)));
        }
        let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        f.render_widget(footer, area);

        if self.mode == InputMode::Filter {
            let x = area.x + 1 + "Filter: ".len() as u16 + self.filter.cursor as u16;
            f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
        }
    }

    /// Run the event loop until the user quits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

fn display_row(task: &Task, row_id: &str, depth: usize, marker: &'static str, today: NaiveDate, index: &BoardIndex) -> DisplayRow {
    DisplayRow {
        id: task.id.clone(),
        row_id: row_id.to_string(),
        depth,
        marker,
        status: task.status,
        overdue: task.status != TaskStatus::Completed && task.due_date.is_some_and(|d| d.date_naive() < today),
        cells: [
            task.title.clone(),
            format_status(task.status).to_string(),
            task.priority.to_string(),
            format_due_relative(task.due_date, today),
            index.departments.path(&task.department_id).to_string(),
            assignee_names(task, &index.users),
            task.project.as_ref().map(|p| p.name.clone()).unwrap_or_else(|| "-".into()),
            task.tags.join(","),
        ],
    }
}

fn render_help(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());
    let lines = [
        "↑/↓ j/k      move selection",
        "Enter/Space  expand or collapse subtasks",
        "1-8          sort by column (repeat to change direction)",
        "0            back to default ordering",
        "/            filter by title (Enter keeps, Esc clears)",
        "s            cycle status filter",
        "c            collapse all rows",
        "←/→ p/n      previous / next page",
        "Tab          next dashboard",
        "r            reload data",
        "q/Esc        quit",
    ];
    let text: Vec<Line> = lines.iter().map(|l| Line::from(*l)).collect();
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help")), area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
