//! Narrow mutation operations on a snapshot.
//!
//! There is one operation per logical field. Each validates its input,
//! stamps `updated_at`, and leaves persisting and re-running the pipeline to
//! the caller. Tasks are archived, never deleted.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{BoardError, Result};
use crate::fields::{Recurrence, TaskStatus};
use crate::snapshot::Snapshot;
use crate::task::{Assignment, Comment, ProjectRef, Task};

/// Valid range of the priority bucket.
pub const PRIORITY_RANGE: std::ops::RangeInclusive<i32> = 1..=10;

/// Input to `Snapshot::create_task`.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub assignee_ids: Vec<String>,
    pub department_id: String,
    pub priority: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub project: Option<ProjectRef>,
    pub parent_task_id: Option<String>,
    pub status: TaskStatus,
    pub recurrence: Recurrence,
}

/// Split comma-separated tag arguments, trimming blanks and keeping first
/// occurrence order.
pub fn split_tags(inputs: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for raw in inputs {
        for part in raw.split(',') {
            let tag = part.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                tags.push(tag.to_string());
            }
        }
    }
    tags
}

fn check_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BoardError::Validation("title must not be empty".into()));
    }
    Ok(title.to_string())
}

fn check_priority(priority: i32) -> Result<i32> {
    if !PRIORITY_RANGE.contains(&priority) {
        return Err(BoardError::Validation(format!(
            "priority must be between {} and {}, got {priority}",
            PRIORITY_RANGE.start(),
            PRIORITY_RANGE.end()
        )));
    }
    Ok(priority)
}

impl Snapshot {
    /// Create a task. Owner, department and at least one assignee are required.
    pub fn create_task(&mut self, new: NewTask) -> Result<String> {
        let title = check_title(&new.title)?;
        let priority = check_priority(new.priority.unwrap_or(5))?;
        if self.user(&new.owner_id).is_none() {
            return Err(BoardError::not_found("user", new.owner_id));
        }
        if self.department(&new.department_id).is_none() {
            return Err(BoardError::not_found("department", new.department_id));
        }
        if new.assignee_ids.is_empty() {
            return Err(BoardError::Validation("a task needs at least one assignee".into()));
        }
        if let Some(missing) = new.assignee_ids.iter().find(|id| self.user(id).is_none()) {
            return Err(BoardError::not_found("user", missing.as_str()));
        }
        if let Some(parent) = &new.parent_task_id {
            if self.task(parent).is_none() {
                return Err(BoardError::not_found("task", parent.as_str()));
            }
        }

        let id = self.next_task_id()?;
        let now = Utc::now();
        let mut assignments: Vec<Assignment> = Vec::new();
        for uid in &new.assignee_ids {
            if !assignments.iter().any(|a| &a.user_id == uid) {
                assignments.push(Assignment { task_id: id.clone(), user_id: uid.clone() });
            }
        }
        let task = Task {
            title,
            description: new.description.filter(|d| !d.trim().is_empty()),
            status: new.status,
            priority,
            due_date: new.due_date,
            tags: split_tags(&new.tags),
            department_id: new.department_id,
            project: new.project,
            parent_task_id: new.parent_task_id,
            owner_id: Some(new.owner_id),
            assignments,
            recurrence: new.recurrence,
            created_at: Some(now),
            updated_at: Some(now),
            ..Task::new(id.clone(), String::new())
        };
        self.tasks.push(task);
        info!(task = %id, "task created");
        Ok(id)
    }

    fn touch(&mut self, id: &str) -> Result<&mut Task> {
        let task = self.task_mut(id).ok_or_else(|| BoardError::not_found("task", id))?;
        task.updated_at = Some(Utc::now());
        Ok(task)
    }

    pub fn set_title(&mut self, id: &str, title: &str) -> Result<()> {
        let title = check_title(title)?;
        self.touch(id)?.title = title;
        Ok(())
    }

    pub fn set_description(&mut self, id: &str, description: Option<String>) -> Result<()> {
        self.touch(id)?.description = description.filter(|d| !d.trim().is_empty());
        Ok(())
    }

    pub fn set_priority(&mut self, id: &str, priority: i32) -> Result<()> {
        let priority = check_priority(priority)?;
        self.touch(id)?.priority = priority;
        Ok(())
    }

    pub fn set_due(&mut self, id: &str, due: Option<DateTime<Utc>>) -> Result<()> {
        self.touch(id)?.due_date = due;
        Ok(())
    }

    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<()> {
        self.touch(id)?.status = status;
        Ok(())
    }

    pub fn set_recurrence(&mut self, id: &str, recurrence: Recurrence) -> Result<()> {
        self.touch(id)?.recurrence = recurrence;
        Ok(())
    }

    /// Append a tag; returns false when it was already present.
    pub fn add_tag(&mut self, id: &str, tag: &str) -> Result<bool> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(BoardError::Validation("tag must not be empty".into()));
        }
        let task = self.task_mut(id).ok_or_else(|| BoardError::not_found("task", id))?;
        if task.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            return Ok(false);
        }
        task.tags.push(tag.to_string());
        task.updated_at = Some(Utc::now());
        Ok(true)
    }

    /// Remove a tag; returns false when it was not present.
    pub fn remove_tag(&mut self, id: &str, tag: &str) -> Result<bool> {
        let task = self.task_mut(id).ok_or_else(|| BoardError::not_found("task", id))?;
        let before = task.tags.len();
        task.tags.retain(|t| !t.eq_ignore_ascii_case(tag.trim()));
        if task.tags.len() == before {
            return Ok(false);
        }
        task.updated_at = Some(Utc::now());
        Ok(true)
    }

    /// Add a comment by `author_id`; returns the new comment id.
    pub fn add_comment(&mut self, id: &str, author_id: &str, content: &str) -> Result<String> {
        let content = content.trim();
        if content.is_empty() {
            return Err(BoardError::Validation("comment must not be empty".into()));
        }
        if self.user(author_id).is_none() {
            return Err(BoardError::not_found("user", author_id));
        }
        let task = self.touch(id)?;
        let now = Utc::now();
        let comment_id = format!("{}-c{}", task.id, task.comments.len() + 1);
        task.comments.push(Comment {
            id: comment_id.clone(),
            content: content.to_string(),
            author_id: author_id.to_string(),
            created_at: now,
            updated_at: now,
        });
        Ok(comment_id)
    }

    /// Edit a comment. Only its author may do so.
    pub fn update_comment(&mut self, id: &str, comment_id: &str, editor_id: &str, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(BoardError::Validation("comment must not be empty".into()));
        }
        let task = self.task_mut(id).ok_or_else(|| BoardError::not_found("task", id))?;
        let comment = task
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| BoardError::not_found("comment", comment_id))?;
        if comment.author_id != editor_id {
            return Err(BoardError::Forbidden(format!("only {} may edit comment {comment_id}", comment.author_id)));
        }
        let now = Utc::now();
        comment.content = content.to_string();
        comment.updated_at = now;
        task.updated_at = Some(now);
        Ok(())
    }

    pub fn archive(&mut self, id: &str) -> Result<()> {
        self.touch(id)?.archived = true;
        info!(task = %id, "task archived");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Role;
    use crate::task::{Department, UserProfile};

    fn board() -> Snapshot {
        let user = |id: &str| UserProfile {
            id: id.into(),
            email: format!("{id}@example.com"),
            name: id.into(),
            role: Role::Staff,
            department_id: Some("d1".into()),
            is_hr_admin: false,
            is_active: true,
        };
        Snapshot {
            tasks: Vec::new(),
            users: vec![user("ana"), user("bo")],
            departments: vec![Department {
                id: "d1".into(),
                name: "Engineering".into(),
                parent_id: None,
                manager_id: None,
                is_active: true,
                level: 0,
            }],
        }
    }

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.into(),
            owner_id: "ana".into(),
            assignee_ids: vec!["bo".into()],
            department_id: "d1".into(),
            tags: vec!["Backend, urgent".into(), "backend".into()],
            ..Default::default()
        }
    }

    #[test]
    fn create_assigns_ids_and_links() {
        let mut b = board();
        let id = b.create_task(new_task("  Write report ")).unwrap();
        assert_eq!(id, "1");
        let t = b.task(&id).unwrap();
        assert_eq!(t.title, "Write report");
        assert_eq!(t.assignments, vec![Assignment { task_id: "1".into(), user_id: "bo".into() }]);
        assert_eq!(t.tags, vec!["Backend", "urgent"]);
        assert_eq!(t.priority, 5);
        assert_eq!(b.create_task(new_task("second")).unwrap(), "2");
    }

    #[test]
    fn create_validates_references() {
        let mut b = board();
        let mut n = new_task("x");
        n.assignee_ids.clear();
        assert!(matches!(b.create_task(n), Err(BoardError::Validation(_))));

        let mut n = new_task("x");
        n.department_id = "nope".into();
        assert!(matches!(b.create_task(n), Err(BoardError::NotFound { entity: "department", .. })));

        let mut n = new_task("x");
        n.parent_task_id = Some("42".into());
        assert!(matches!(b.create_task(n), Err(BoardError::NotFound { entity: "task", .. })));

        let mut n = new_task("x");
        n.priority = Some(11);
        assert!(matches!(b.create_task(n), Err(BoardError::Validation(_))));

        assert!(matches!(b.create_task(new_task("   ")), Err(BoardError::Validation(_))));
        assert!(b.tasks.is_empty());
    }

    #[test]
    fn field_updates() {
        let mut b = board();
        let id = b.create_task(new_task("x")).unwrap();
        b.set_title(&id, "renamed").unwrap();
        b.set_priority(&id, 9).unwrap();
        b.set_status(&id, TaskStatus::Blocked).unwrap();
        b.set_recurrence(&id, Recurrence::Weekly).unwrap();
        b.set_description(&id, Some("  ".into())).unwrap();
        assert!(b.set_priority(&id, 0).is_err());
        assert!(b.set_title("missing", "x").is_err());

        let t = b.task(&id).unwrap();
        assert_eq!(t.title, "renamed");
        assert_eq!(t.priority, 9);
        assert_eq!(t.status, TaskStatus::Blocked);
        assert_eq!(t.recurrence, Recurrence::Weekly);
        assert_eq!(t.description, None);
    }

    #[test]
    fn tags_keep_insertion_order() {
        let mut b = board();
        let id = b.create_task(new_task("x")).unwrap();
        assert!(b.add_tag(&id, "zeta").unwrap());
        assert!(!b.add_tag(&id, "ZETA").unwrap());
        assert!(b.remove_tag(&id, "backend").unwrap());
        assert!(!b.remove_tag(&id, "backend").unwrap());
        assert_eq!(b.task(&id).unwrap().tags, vec!["urgent", "zeta"]);
    }

    #[test]
    fn only_author_edits_comment() {
        let mut b = board();
        let id = b.create_task(new_task("x")).unwrap();
        let cid = b.add_comment(&id, "bo", "looks good").unwrap();
        assert!(matches!(b.update_comment(&id, &cid, "ana", "hijack"), Err(BoardError::Forbidden(_))));
        b.update_comment(&id, &cid, "bo", "looks great").unwrap();
        assert_eq!(b.task(&id).unwrap().comments[0].content, "looks great");
        assert!(b.add_comment(&id, "ghost", "hi").is_err());
    }

    #[test]
    fn archive_keeps_the_record() {
        let mut b = board();
        let id = b.create_task(new_task("x")).unwrap();
        b.archive(&id).unwrap();
        assert!(b.task(&id).unwrap().archived);
    }
}
