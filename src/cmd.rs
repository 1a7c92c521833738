//! Command implementations for the CLI interface.
//!
//! Each handler loads what it needs from the snapshot, does its work, and
//! either prints a view or writes the snapshot back. Mutating handlers never
//! refresh anything themselves; the next `list` or dashboard reload sees the
//! new data.

use std::path::Path;

use chrono::{DateTime, Duration, Local, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::info;

use taskboard::collate::CollationKey;
use taskboard::config::BoardConfig;
use taskboard::display::*;
use taskboard::error::{BoardError, Result};
use taskboard::fields::*;
use taskboard::filter::Filters;
use taskboard::hierarchy::TaskRow;
use taskboard::index::{DepartmentIndex, UserDirectory};
use taskboard::mutation::NewTask;
use taskboard::pipeline::{BoardIndex, BoardView, Pagination, ViewState};
use taskboard::scope::{BoardSource, TaskQuery};
use taskboard::snapshot::Snapshot;
use taskboard::sort::SortCriterion;
use taskboard::task::{parse_due, ProjectRef, Task};
use taskboard::tui::run::run_dashboard;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive dashboard.
    Ui {
        /// Dashboard to open.
        #[arg(long, value_enum, default_value_t = Scope::Personal)]
        scope: Scope,
    },

    /// List tasks of a dashboard with filters, sorting and paging.
    List {
        /// Dashboard to list.
        #[arg(long, value_enum, default_value_t = Scope::Personal)]
        scope: Scope,
        /// Case-insensitive title substring.
        #[arg(long)]
        title: Option<String>,
        /// Status filter. May be repeated.
        #[arg(long = "status", value_enum)]
        statuses: Vec<TaskStatus>,
        /// Department name filter. May be repeated.
        #[arg(long = "department")]
        departments: Vec<String>,
        /// Assignee user id filter. May be repeated.
        #[arg(long = "assignee")]
        assignees: Vec<String>,
        /// Project id filter. May be repeated.
        #[arg(long = "project")]
        projects: Vec<String>,
        /// Sort criterion as column[:asc|:desc]. May be repeated; order is priority.
        #[arg(long = "sort", value_parser = parse_criterion)]
        sort: Vec<SortCriterion>,
        /// 1-based page of top-level rows.
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Rows per page (0 = no paging). Defaults to pageSize in config.json.
        #[arg(long)]
        page_size: Option<usize>,
        /// Source query limit.
        #[arg(long)]
        limit: Option<usize>,
        /// Source query offset.
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Include archived tasks.
        #[arg(long)]
        archived: bool,
        /// Show subtasks under their parents.
        #[arg(long)]
        expand: bool,
    },

    /// View a single task.
    View {
        /// Task id.
        id: String,
    },

    /// Create a task owned by the acting user.
    Add {
        /// Short title for the task.
        title: String,
        /// Department id.
        #[arg(long)]
        department: String,
        /// Assignee user id. May be repeated; defaults to the acting user.
        #[arg(long = "assignee")]
        assignees: Vec<String>,
        /// Longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Priority bucket, 1-10.
        #[arg(long)]
        priority: Option<i32>,
        /// Due date: YYYY-MM-DD, RFC 3339, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Project id.
        #[arg(long, requires = "project_name")]
        project_id: Option<String>,
        /// Project display name.
        #[arg(long, requires = "project_id")]
        project_name: Option<String>,
        /// Parent task id.
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, value_enum, default_value_t = TaskStatus::ToDo)]
        status: TaskStatus,
        #[arg(long, value_enum, default_value_t = Recurrence::None)]
        recurrence: Recurrence,
    },

    /// Update fields on a task.
    Update {
        /// Task id.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        priority: Option<i32>,
        #[arg(long)]
        due: Option<String>,
        /// Clear the due date.
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
        #[arg(long, value_enum)]
        status: Option<TaskStatus>,
        #[arg(long, value_enum)]
        recurrence: Option<Recurrence>,
        /// Add tags. May be repeated and comma-separated.
        #[arg(long = "add-tag")]
        add_tags: Vec<String>,
        /// Remove tags. May be repeated and comma-separated.
        #[arg(long = "rm-tag")]
        rm_tags: Vec<String>,
    },

    /// Comment on a task, or edit one of your comments.
    Comment {
        /// Task id.
        id: String,
        /// Comment text.
        text: String,
        /// Id of an existing comment to replace.
        #[arg(long)]
        edit: Option<String>,
    },

    /// Archive a task.
    Archive {
        /// Task id.
        id: String,
    },

    /// List departments with their paths.
    Departments,

    /// List users.
    Users,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Resolve the acting user from the flag or the config default.
pub fn resolve_user(flag: Option<String>, config: &BoardConfig) -> Result<String> {
    flag.or_else(|| config.default_user.clone())
        .ok_or_else(|| BoardError::Validation("no user given; pass --user or set defaultUser in config.json".into()))
}

/// Parse human due date input.
///
/// Supports "today", "tomorrow", "yesterday", "in Nd", "in Nw", ISO dates
/// and RFC 3339 timestamps.
pub fn parse_due_input(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    let lower = s.to_lowercase();
    let today = Local::now().date_naive();
    let offset = match lower.as_str() {
        "today" => Duration::try_days(0),
        "tomorrow" => Duration::try_days(1),
        "yesterday" => Duration::try_days(-1),
        _ => lower.strip_prefix("in ").and_then(|rest| {
            if let Some(n) = rest.strip_suffix('d').and_then(|n| n.trim().parse::<i64>().ok()) {
                return Duration::try_days(n);
            }
            rest.strip_suffix('w').and_then(|n| n.trim().parse::<i64>().ok()).and_then(Duration::try_weeks)
        }),
    };
    let relative = offset.and_then(|delta| today.checked_add_signed(delta));
    if offset.is_some() && relative.is_none() {
        return Err(BoardError::Validation(format!("due date '{s}' is out of range")));
    }
    relative
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .or_else(|| parse_due(s))
        .ok_or_else(|| BoardError::Validation(format!("invalid due date '{s}'")))
}

/// Launch the dashboard.
///
/// The scope is checked before the terminal is taken over so an unknown user
/// or a missing HR role is reported on the command line.
pub fn cmd_ui(snap: Snapshot, data_path: &Path, config: &BoardConfig, user: String, scope: Scope) -> Result<()> {
    snap.query_tasks(&TaskQuery::new(scope, user.as_str()))?;
    run_dashboard(snap, data_path, config, user, scope).map_err(BoardError::Terminal)
}

/// List a dashboard's tasks.
#[allow(clippy::too_many_arguments)]
pub fn cmd_list(
    snap: &Snapshot,
    config: &BoardConfig,
    user: &str,
    scope: Scope,
    filters: Filters,
    sort: Vec<SortCriterion>,
    page: usize,
    page_size: Option<usize>,
    limit: Option<usize>,
    offset: usize,
    archived: bool,
    expand: bool,
) -> Result<()> {
    let query = TaskQuery { scope, viewer: user.to_string(), limit, offset, include_archived: archived };
    let tasks = snap.query_tasks(&query)?;
    let index = BoardIndex::build(tasks.iter().copied(), snap.user_directory(), snap.department_tree());
    let pipeline = config.pipeline(scope);

    let mut view = ViewState {
        filters,
        criteria: sort,
        pagination: Pagination { page: page.saturating_sub(1), page_size: page_size.unwrap_or(config.page_size) },
        ..Default::default()
    };
    let board = pipeline.run(tasks.iter().copied(), &mut view, &index);
    if expand {
        view.expanded = board.hierarchy.rows.iter().map(|r| r.task.id.clone()).collect();
    }

    println!(
        "{} | {} of {} tasks | page {}/{} | sorted by {}",
        format_scope(scope),
        board.matched,
        board.total,
        view.pagination.page + 1,
        view.pagination.page_count(board.hierarchy.rows.len()),
        format_criteria(&board.criteria)
    );
    print_board(&board, &view, &index);
    if !board.hierarchy.dropped.is_empty() {
        println!("({} subtask(s) hidden: parent not in this view)", board.hierarchy.dropped.len());
    }
    Ok(())
}

/// Print the current page of a board as a table, subtasks under expanded rows.
pub fn print_board(board: &BoardView<'_>, view: &ViewState, index: &BoardIndex) {
    println!(
        "{:<6} {:<12} {:<4} {:<10} {:<22} {:<18} {:<12} {}",
        "ID", "Status", "Pri", "Due", "Department", "Assignees", "Project", "Title [tags]"
    );
    let today = Local::now().date_naive();
    for row in board.page(&view.pagination) {
        print_row(row.task, 0, row_marker(row, view), today, index);
        if view.is_expanded(&row.task.id) {
            for sub in &row.subtasks {
                print_row(sub, 1, " ", today, index);
            }
        }
    }
}

fn row_marker(row: &TaskRow<'_>, view: &ViewState) -> &'static str {
    match (row.has_subtasks, view.is_expanded(&row.task.id)) {
        (false, _) => " ",
        (true, true) => "▾",
        (true, false) => "▸",
    }
}

fn print_row(task: &Task, depth: usize, marker: &str, today: chrono::NaiveDate, index: &BoardIndex) {
    let project = task.project.as_ref().map(|p| p.name.as_str()).unwrap_or("-");
    println!(
        "{:<6} {:<12} {:<4} {:<10} {:<22} {:<18} {:<12} {}{} {}",
        truncate(&task.id, 6),
        format_status(task.status),
        task.priority,
        format_due_relative(task.due_date, today),
        truncate(index.departments.path(&task.department_id), 22),
        truncate(&assignee_names(task, &index.users), 18),
        truncate(project, 12),
        "  ".repeat(depth),
        marker,
        title_with_tags(task)
    );
}

/// View detailed information about a task.
pub fn cmd_view(snap: &Snapshot, id: &str) -> Result<()> {
    let task = snap.task(id).ok_or_else(|| BoardError::not_found("task", id))?;
    let departments = DepartmentIndex::new(&snap.departments);
    let children = snap.children_of(id);
    let users = UserDirectory::for_tasks(&snap.users, std::iter::once(task).chain(children.iter().copied()));
    let today = Local::now().date_naive();
    let owner = task.owner_id.as_deref().and_then(|o| snap.user(o)).map(|u| u.name.as_str()).unwrap_or("-");
    let rfc = |d: Option<DateTime<Utc>>| d.map(|d| d.to_rfc3339()).unwrap_or_else(|| "-".into());

    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}", format_status(task.status));
    println!("Priority:     {}", task.priority);
    println!(
        "Due:          {}",
        match task.due_date {
            Some(d) => format!("{} ({})", d.date_naive(), format_due_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!("Department:   {}", non_empty(departments.path(&task.department_id)));
    println!("Project:      {}", task.project.as_ref().map(|p| p.name.as_str()).unwrap_or("-"));
    println!("Owner:        {owner}");
    println!("Assignees:    {}", assignee_names(task, &users));
    println!("Parent:       {}", task.parent_task_id.as_deref().unwrap_or("-"));
    println!("Tags:         {}", if task.tags.is_empty() { "-".into() } else { task.tags.join(",") });
    println!("Recurrence:   {:?}", task.recurrence);
    println!("Archived:     {}", if task.archived { "yes" } else { "no" });
    println!("Created UTC:  {}", rfc(task.created_at));
    println!("Updated UTC:  {}", rfc(task.updated_at));
    println!("Description:\n{}\n", task.description.as_deref().unwrap_or("-"));

    if children.is_empty() {
        println!("Subtasks: -");
    } else {
        println!("Subtasks:");
        for c in &children {
            println!("  - {} [{}] (#{})", c.title, format_status(c.status), c.id);
        }
    }

    if !task.comments.is_empty() {
        println!("Comments:");
        for c in &task.comments {
            let author = snap.user(&c.author_id).map(|u| u.name.as_str()).unwrap_or("Unknown");
            let edited = if c.updated_at > c.created_at { " (edited)" } else { "" };
            println!("  [{}] {} at {}{}: {}", c.id, author, c.created_at.format("%Y-%m-%d %H:%M"), edited, c.content);
        }
    }
    Ok(())
}

fn non_empty(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

/// Create a task and save the snapshot.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    snap: &mut Snapshot,
    data_path: &Path,
    user: &str,
    title: String,
    department: String,
    assignees: Vec<String>,
    desc: Option<String>,
    priority: Option<i32>,
    due: Option<String>,
    tags: Vec<String>,
    project: Option<ProjectRef>,
    parent: Option<String>,
    status: TaskStatus,
    recurrence: Recurrence,
) -> Result<()> {
    let due_date = due.as_deref().map(parse_due_input).transpose()?;
    let assignee_ids = if assignees.is_empty() { vec![user.to_string()] } else { assignees };
    let id = snap.create_task(NewTask {
        title,
        description: desc,
        owner_id: user.to_string(),
        assignee_ids,
        department_id: department,
        priority,
        due_date,
        tags,
        project,
        parent_task_id: parent,
        status,
        recurrence,
    })?;
    snap.save(data_path)?;
    println!("Added task {id}");
    Ok(())
}

/// Apply field updates and save the snapshot.
#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    snap: &mut Snapshot,
    data_path: &Path,
    id: &str,
    title: Option<String>,
    desc: Option<String>,
    priority: Option<i32>,
    due: Option<String>,
    clear_due: bool,
    status: Option<TaskStatus>,
    recurrence: Option<Recurrence>,
    add_tags: Vec<String>,
    rm_tags: Vec<String>,
) -> Result<()> {
    if snap.task(id).is_none() {
        return Err(BoardError::not_found("task", id));
    }
    if let Some(t) = title {
        snap.set_title(id, &t)?;
    }
    if let Some(d) = desc {
        snap.set_description(id, Some(d))?;
    }
    if let Some(p) = priority {
        snap.set_priority(id, p)?;
    }
    if clear_due {
        snap.set_due(id, None)?;
    } else if let Some(d) = due {
        snap.set_due(id, Some(parse_due_input(&d)?))?;
    }
    if let Some(s) = status {
        snap.set_status(id, s)?;
    }
    if let Some(r) = recurrence {
        snap.set_recurrence(id, r)?;
    }
    for tag in taskboard::mutation::split_tags(&add_tags) {
        snap.add_tag(id, &tag)?;
    }
    for tag in taskboard::mutation::split_tags(&rm_tags) {
        snap.remove_tag(id, &tag)?;
    }
    snap.save(data_path)?;
    println!("Updated task {id}");
    Ok(())
}

/// Add or edit a comment and save the snapshot.
pub fn cmd_comment(snap: &mut Snapshot, data_path: &Path, user: &str, id: &str, text: &str, edit: Option<String>) -> Result<()> {
    match edit {
        Some(comment_id) => {
            snap.update_comment(id, &comment_id, user, text)?;
            snap.save(data_path)?;
            println!("Updated comment {comment_id}");
        }
        None => {
            let comment_id = snap.add_comment(id, user, text)?;
            snap.save(data_path)?;
            println!("Added comment {comment_id}");
        }
    }
    Ok(())
}

/// Archive a task and save the snapshot.
pub fn cmd_archive(snap: &mut Snapshot, data_path: &Path, id: &str) -> Result<()> {
    snap.archive(id)?;
    snap.save(data_path)?;
    info!(task = id, "archived from CLI");
    println!("Archived task {id}");
    Ok(())
}

/// List departments ordered by their path.
pub fn cmd_departments(snap: &Snapshot) {
    let index = DepartmentIndex::new(&snap.departments);
    let mut departments: Vec<_> = snap.departments.iter().collect();
    departments.sort_by_cached_key(|d| CollationKey::new(&index.path(&d.id).to_lowercase()));

    println!("{:<10} {:<5} {:<8} {:<16} {}", "ID", "Level", "Active", "Manager", "Path");
    for d in departments {
        let manager = d.manager_id.as_deref().and_then(|m| snap.user(m)).map(|u| u.name.as_str()).unwrap_or("-");
        println!(
            "{:<10} {:<5} {:<8} {:<16} {}",
            truncate(&d.id, 10),
            d.level,
            if d.is_active { "yes" } else { "no" },
            truncate(manager, 16),
            index.path(&d.id)
        );
    }
}

/// List users with role and department.
pub fn cmd_users(snap: &Snapshot) {
    let index = DepartmentIndex::new(&snap.departments);
    println!("{:<10} {:<20} {:<28} {:<9} {:<3} {}", "ID", "Name", "Email", "Role", "HR", "Department");
    for u in &snap.users {
        let dept = u.department_id.as_deref().map(|d| index.path(d)).unwrap_or("");
        println!(
            "{:<10} {:<20} {:<28} {:<9} {:<3} {}{}",
            truncate(&u.id, 10),
            truncate(&u.name, 20),
            truncate(&u.email, 28),
            format_role(u.role),
            if u.is_hr_admin { "yes" } else { "" },
            non_empty(dept),
            if u.is_active { "" } else { " (inactive)" }
        );
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
