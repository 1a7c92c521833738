//! Enumerations and field types shared by the board.
//!
//! Status, role and recurrence values serialise in the casing the remote task
//! service uses (`TO_DO`, `HR_ADMIN`), while the command line accepts the
//! kebab-case spellings `clap` derives.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task workflow status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    #[serde(alias = "to-do")]
    ToDo,
    #[serde(alias = "in-progress")]
    InProgress,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "blocked")]
    Blocked,
}

impl TaskStatus {
    /// Fixed ordering rank used by the status sort key.
    pub fn rank(self) -> u8 {
        match self {
            TaskStatus::ToDo => 1,
            TaskStatus::InProgress => 2,
            TaskStatus::Completed => 3,
            TaskStatus::Blocked => 4,
        }
    }
}

/// Organisational role of a user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Staff,
    Manager,
    HrAdmin,
}

/// How often a task repeats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

/// Columns a task list can be ordered by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    Title,
    Status,
    Priority,
    #[serde(alias = "due_date", alias = "due")]
    DueDate,
    Department,
    Assignees,
    Project,
    Tags,
}

impl SortColumn {
    /// Every column, in table order.
    pub const ALL: [SortColumn; 8] = [
        SortColumn::Title,
        SortColumn::Status,
        SortColumn::Priority,
        SortColumn::DueDate,
        SortColumn::Department,
        SortColumn::Assignees,
        SortColumn::Project,
        SortColumn::Tags,
    ];
}

/// Direction applied to a single sort criterion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// What happens when a column header is activated repeatedly.
///
/// Both policies append an unsorted column ascending. `Cycle` then goes to
/// descending and finally drops the criterion; `Flip` alternates between the
/// two directions and never drops it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TogglePolicy {
    Cycle,
    Flip,
}

/// Dashboard context a task list is shown in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    Personal,
    Department,
    Company,
    #[serde(alias = "hr_admin")]
    HrAdmin,
}

/// Format a task status for display.
pub fn format_status(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::ToDo => "To Do",
        TaskStatus::InProgress => "In Progress",
        TaskStatus::Completed => "Completed",
        TaskStatus::Blocked => "Blocked",
    }
}

/// Format a role for display.
pub fn format_role(r: Role) -> &'static str {
    match r {
        Role::Staff => "Staff",
        Role::Manager => "Manager",
        Role::HrAdmin => "HR Admin",
    }
}

/// Format a sort column as a table header.
pub fn format_column(c: SortColumn) -> &'static str {
    match c {
        SortColumn::Title => "Title",
        SortColumn::Status => "Status",
        SortColumn::Priority => "Pri",
        SortColumn::DueDate => "Due",
        SortColumn::Department => "Department",
        SortColumn::Assignees => "Assignees",
        SortColumn::Project => "Project",
        SortColumn::Tags => "Tags",
    }
}

pub fn format_scope(s: Scope) -> &'static str {
    match s {
        Scope::Personal => "My Tasks",
        Scope::Department => "Department",
        Scope::Company => "Company",
        Scope::HrAdmin => "HR Admin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ranks_follow_workflow_order() {
        assert_eq!(TaskStatus::ToDo.rank(), 1);
        assert_eq!(TaskStatus::InProgress.rank(), 2);
        assert_eq!(TaskStatus::Completed.rank(), 3);
        assert_eq!(TaskStatus::Blocked.rank(), 4);
    }

    #[test]
    fn wire_casing() {
        assert_eq!(serde_json::to_string(&TaskStatus::ToDo).unwrap(), "\"TO_DO\"");
        assert_eq!(serde_json::to_string(&Role::HrAdmin).unwrap(), "\"HR_ADMIN\"");
        assert_eq!(serde_json::to_string(&SortColumn::DueDate).unwrap(), "\"dueDate\"");
        let s: TaskStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(s, TaskStatus::InProgress);
    }
}
