//! Formatting helpers shared by the table printer and the dashboard.

use chrono::{DateTime, NaiveDate, Utc};

use crate::fields::{SortColumn, SortDirection};
use crate::index::UserDirectory;
use crate::sort::SortCriterion;
use crate::task::Task;

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<DateTime<Utc>>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d.date_naive() - today).num_days();
            match delta {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {n}d"),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// Truncate a string to a maximum width, adding an ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Assignee display names in assignment order, or "-".
pub fn assignee_names(task: &Task, users: &UserDirectory) -> String {
    if task.assignments.is_empty() {
        return "-".into();
    }
    task.assignee_ids().map(|id| users.get(id).name.as_str()).collect::<Vec<_>>().join(", ")
}

/// Title followed by bracketed tags.
pub fn title_with_tags(task: &Task) -> String {
    if task.tags.is_empty() {
        task.title.clone()
    } else {
        format!("{} [{}]", task.title, task.tags.join(","))
    }
}

pub fn direction_arrow(d: SortDirection) -> &'static str {
    match d {
        SortDirection::Asc => "↑",
        SortDirection::Desc => "↓",
    }
}

/// "dueDate↑, priority↓"
pub fn format_criteria(criteria: &[SortCriterion]) -> String {
    criteria
        .iter()
        .map(|c| format!("{}{}", column_name(c.key), direction_arrow(c.direction)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn column_name(c: SortColumn) -> &'static str {
    match c {
        SortColumn::Title => "title",
        SortColumn::Status => "status",
        SortColumn::Priority => "priority",
        SortColumn::DueDate => "due",
        SortColumn::Department => "department",
        SortColumn::Assignees => "assignees",
        SortColumn::Project => "project",
        SortColumn::Tags => "tags",
    }
}

/// Parse `column[:asc|:desc]` as given on the command line.
pub fn parse_criterion(s: &str) -> Result<SortCriterion, String> {
    let (col, dir) = match s.split_once(':') {
        Some((c, d)) => (c, Some(d)),
        None => (s, None),
    };
    let key = match col.trim().to_lowercase().as_str() {
        "title" => SortColumn::Title,
        "status" => SortColumn::Status,
        "priority" | "pri" => SortColumn::Priority,
        "due" | "due-date" | "duedate" => SortColumn::DueDate,
        "department" | "dept" => SortColumn::Department,
        "assignees" | "assignee" => SortColumn::Assignees,
        "project" => SortColumn::Project,
        "tags" | "tag" => SortColumn::Tags,
        other => return Err(format!("unknown sort column '{other}'")),
    };
    let direction = match dir.map(|d| d.trim().to_lowercase()) {
        None => SortDirection::Asc,
        Some(d) if d == "asc" => SortDirection::Asc,
        Some(d) if d == "desc" => SortDirection::Desc,
        Some(d) => return Err(format!("unknown sort direction '{d}'")),
    };
    Ok(SortCriterion { key, direction })
}
