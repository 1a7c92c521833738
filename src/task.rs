//! Task, user and department records.
//!
//! These are the shapes the remote task service returns. Deserialisation is
//! forgiving: absent or `null` arrays become empty, absent flags take their
//! usual defaults, and due dates may be either RFC 3339 timestamps or bare
//! `YYYY-MM-DD` dates. A due date that parses as neither is dropped with a
//! warning rather than failing the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::fields::*;

/// A unit of trackable work.
///
/// A task whose `parent_task_id` is set is a subtask. Some sources return
/// subtasks already nested under their parent in `subtasks`; flat sources
/// leave it empty and rely on `parent_task_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default = "default_priority", deserialize_with = "null_as_priority")]
    pub priority: i32,
    #[serde(default, with = "due_format")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, alias = "isArchived")]
    pub archived: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub department_id: String,
    #[serde(default)]
    pub project: Option<ProjectRef>,
    #[serde(default)]
    pub parent_task_id: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assignments: Vec<Assignment>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Task>,
}

fn default_priority() -> i32 {
    5
}

impl Task {
    /// A bare task with the given id and title; every other field defaulted.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::ToDo,
            priority: default_priority(),
            due_date: None,
            tags: Vec::new(),
            archived: false,
            department_id: String::new(),
            project: None,
            parent_task_id: None,
            owner_id: None,
            assignments: Vec::new(),
            comments: Vec::new(),
            recurrence: Recurrence::None,
            created_at: None,
            updated_at: None,
            subtasks: Vec::new(),
        }
    }

    pub fn is_subtask(&self) -> bool {
        self.parent_task_id.is_some()
    }

    /// User ids of the task's assignments, in source order.
    pub fn assignee_ids(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|a| a.user_id.as_str())
    }

    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assignee_ids().any(|id| id == user_id)
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.id.as_str())
    }
}

/// Reference to the project a task belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
}

/// Join record between a task and a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(default)]
    pub task_id: String,
    pub user_id: String,
}

/// A comment on a task. Only its author may edit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user as seen by the directory source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub is_hr_admin: bool,
    #[serde(default = "default_true", alias = "active")]
    pub is_active: bool,
}

impl UserProfile {
    /// HR administration is granted either by role or by the separate flag.
    pub fn has_hr_access(&self) -> bool {
        self.role == Role::HrAdmin || self.is_hr_admin
    }
}

/// A node of the department tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default = "default_true", alias = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub level: u32,
}

fn default_true() -> bool {
    true
}

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_priority<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    Ok(Option::<i32>::deserialize(deserializer)?.unwrap_or_else(default_priority))
}

/// Due dates arrive either as full timestamps or as calendar dates.
mod due_format {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use tracing::warn;

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_str(&d.to_rfc3339()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = match Value::deserialize(d)? {
            Value::Null => return Ok(None),
            Value::String(raw) => raw,
            other => {
                warn!(value = %other, "ignoring non-string due date");
                return Ok(None);
            }
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let due = super::parse_due(raw);
        if due.is_none() {
            warn!(value = raw, "ignoring unparseable due date");
        }
        Ok(due)
    }

    pub(super) fn from_date(date: NaiveDate) -> Option<DateTime<Utc>> {
        date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
    }
}

/// Parse a due date given as RFC 3339 or `YYYY-MM-DD` (midnight UTC).
pub fn parse_due(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().and_then(due_format::from_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_task_shape() {
        let json = r#"{
            "id": "1",
            "title": "Write report",
            "dueDate": "2025-06-01",
            "priority": 5,
            "status": "TO_DO",
            "departmentId": "d1",
            "assignments": null
        }"#;
        let t: Task = serde_json::from_str(json).unwrap();
        assert!(t.assignments.is_empty());
        assert!(t.tags.is_empty());
        assert!(!t.archived);
        assert_eq!(t.due_date, parse_due("2025-06-01T00:00:00Z"));
        assert!(!t.is_subtask());
    }

    #[test]
    fn due_accepts_timestamps() {
        let d = parse_due("2025-05-01T09:30:00+02:00").unwrap();
        assert_eq!(d.to_rfc3339(), "2025-05-01T07:30:00+00:00");
        assert!(parse_due("next week").is_none());
    }

    #[test]
    fn hr_access_is_role_or_flag() {
        let mut u = UserProfile {
            id: "u1".into(),
            email: "a@example.com".into(),
            name: "A".into(),
            role: Role::Staff,
            department_id: None,
            is_hr_admin: false,
            is_active: true,
        };
        assert!(!u.has_hr_access());
        u.is_hr_admin = true;
        assert!(u.has_hr_access());
        u.is_hr_admin = false;
        u.role = Role::HrAdmin;
        assert!(u.has_hr_access());
    }
}
