//! Filter stage: reduce a task list to the tasks matching every active field.
//!
//! Fields combine with AND. Within a multi-select field any selected value
//! matches, and an empty selection places no constraint at all.

use serde::{Deserialize, Serialize};

use crate::fields::TaskStatus;
use crate::index::DepartmentIndex;
use crate::task::Task;

/// Active filter criteria for one dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filters {
    /// Case-insensitive substring of the title.
    pub title: String,
    pub statuses: Vec<TaskStatus>,
    /// Department *names*, not ids.
    pub departments: Vec<String>,
    /// Assignee user ids.
    pub assignees: Vec<String>,
    pub projects: Vec<String>,
}

impl Filters {
    /// True when no field constrains the list.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.statuses.is_empty()
            && self.departments.is_empty()
            && self.assignees.is_empty()
            && self.projects.is_empty()
    }

    /// Whether a single task passes every active field.
    ///
    /// Department matching resolves the task's department id to a name first;
    /// an id that does not resolve never matches a non-empty selection.
    pub fn matches(&self, task: &Task, departments: &DepartmentIndex) -> bool {
        if !self.title.is_empty() && !task.title.to_lowercase().contains(&self.title.to_lowercase()) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&task.status) {
            return false;
        }
        if !self.departments.is_empty() {
            match departments.name(&task.department_id) {
                Some(name) if self.departments.iter().any(|d| d == name) => {}
                _ => return false,
            }
        }
        if !self.assignees.is_empty() && !task.assignee_ids().any(|id| self.assignees.iter().any(|a| a == id)) {
            return false;
        }
        if !self.projects.is_empty() {
            match task.project_id() {
                Some(pid) if self.projects.iter().any(|p| p == pid) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Keep the tasks that match `filters`, preserving input order.
pub fn filter_tasks<'a, I>(tasks: I, filters: &Filters, departments: &DepartmentIndex) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks.into_iter().filter(|t| filters.matches(t, departments)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Assignment, Department, ProjectRef};

    fn departments() -> DepartmentIndex {
        DepartmentIndex::new(&[Department {
            id: "d1".into(),
            name: "Engineering".into(),
            parent_id: None,
            manager_id: None,
            is_active: true,
            level: 0,
        }])
    }

    fn task(id: &str, title: &str, status: TaskStatus, dept: &str) -> Task {
        let mut t = Task::new(id, title);
        t.status = status;
        t.department_id = dept.into();
        t
    }

    #[test]
    fn empty_filters_keep_everything() {
        let tasks = vec![task("1", "a", TaskStatus::ToDo, "d1"), task("2", "b", TaskStatus::Blocked, "zz")];
        let out = filter_tasks(&tasks, &Filters::default(), &departments());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn title_is_case_insensitive() {
        let tasks = vec![task("1", "Write Report", TaskStatus::ToDo, "d1"), task("2", "Lunch", TaskStatus::ToDo, "d1")];
        let f = Filters { title: "report".into(), ..Default::default() };
        let out = filter_tasks(&tasks, &f, &departments());
        assert_eq!(out.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec!["1"]);
    }

    #[test]
    fn no_completed_tasks_yields_empty() {
        let tasks = vec![task("1", "a", TaskStatus::ToDo, "d1"), task("2", "b", TaskStatus::InProgress, "d1")];
        let f = Filters { statuses: vec![TaskStatus::Completed], ..Default::default() };
        assert!(filter_tasks(&tasks, &f, &departments()).is_empty());
    }

    #[test]
    fn department_matches_by_resolved_name() {
        let tasks = vec![task("1", "a", TaskStatus::ToDo, "d1"), task("2", "b", TaskStatus::ToDo, "deleted")];
        let f = Filters { departments: vec!["Engineering".into()], ..Default::default() };
        let out = filter_tasks(&tasks, &f, &departments());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "1");

        // Filtering by id instead of name never matches.
        let by_id = Filters { departments: vec!["d1".into()], ..Default::default() };
        assert!(filter_tasks(&tasks, &by_id, &departments()).is_empty());
    }

    #[test]
    fn assignee_is_any_of() {
        let mut a = task("1", "a", TaskStatus::ToDo, "d1");
        a.assignments = vec![
            Assignment { task_id: "1".into(), user_id: "u1".into() },
            Assignment { task_id: "1".into(), user_id: "u2".into() },
        ];
        let b = task("2", "b", TaskStatus::ToDo, "d1");
        let tasks = vec![a, b];
        let f = Filters { assignees: vec!["u2".into(), "u9".into()], ..Default::default() };
        let out = filter_tasks(&tasks, &f, &departments());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "1");
    }

    #[test]
    fn task_without_project_never_matches_project_filter() {
        let mut a = task("1", "a", TaskStatus::ToDo, "d1");
        a.project = Some(ProjectRef { id: "p1".into(), name: "Apollo".into() });
        let b = task("2", "b", TaskStatus::ToDo, "d1");
        let tasks = vec![a, b];
        let f = Filters { projects: vec!["p1".into()], ..Default::default() };
        let out = filter_tasks(&tasks, &f, &departments());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "1");
    }

    #[test]
    fn fields_combine_with_and() {
        let tasks = vec![task("1", "Report", TaskStatus::ToDo, "d1"), task("2", "Report", TaskStatus::Blocked, "d1")];
        let f = Filters {
            title: "rep".into(),
            statuses: vec![TaskStatus::Blocked],
            ..Default::default()
        };
        let out = filter_tasks(&tasks, &f, &departments());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "2");
    }
}
