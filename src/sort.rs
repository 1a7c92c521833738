//! Sort stage: multi-key ordering of a task list.
//!
//! An ordered list of `SortCriterion` is compared lexicographically; the first
//! criterion that tells two tasks apart decides. With no explicit criteria the
//! default ordering applies (due date, then priority high to low, then status,
//! then title). The sort is stable, so fully tied tasks keep input order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collate::CollationKey;
use crate::fields::*;
use crate::index::{DepartmentIndex, UserDirectory};
use crate::task::Task;

/// One (column, direction) pair of a multi-key ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortCriterion {
    pub key: SortColumn,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortCriterion {
    pub fn asc(key: SortColumn) -> Self {
        SortCriterion { key, direction: SortDirection::Asc }
    }

    pub fn desc(key: SortColumn) -> Self {
        SortCriterion { key, direction: SortDirection::Desc }
    }
}

/// The ordering used when the user has not chosen any column.
pub fn default_criteria() -> Vec<SortCriterion> {
    vec![
        SortCriterion::asc(SortColumn::DueDate),
        SortCriterion::desc(SortColumn::Priority),
        SortCriterion::asc(SortColumn::Status),
        SortCriterion::asc(SortColumn::Title),
    ]
}

/// Pick the criteria actually applied: the user's if any, else the default.
pub fn resolve_criteria<'c>(user: &'c [SortCriterion], default: &'c [SortCriterion]) -> &'c [SortCriterion] {
    if user.is_empty() {
        default
    } else {
        user
    }
}

/// Apply a header interaction for `column` to `criteria`.
///
/// A column that is not yet sorted is appended ascending. An existing
/// criterion flips direction, except that under `TogglePolicy::Cycle` a
/// descending criterion is removed instead.
pub fn toggle(criteria: &mut Vec<SortCriterion>, column: SortColumn, policy: TogglePolicy) {
    let Some(pos) = criteria.iter().position(|c| c.key == column) else {
        criteria.push(SortCriterion::asc(column));
        return;
    };
    match (policy, criteria[pos].direction) {
        (TogglePolicy::Cycle, SortDirection::Desc) => {
            criteria.remove(pos);
        }
        (_, dir) => criteria[pos].direction = dir.flipped(),
    }
}

/// Lookups a sort key may need.
#[derive(Debug, Clone, Copy)]
pub struct SortContext<'a> {
    pub departments: &'a DepartmentIndex,
    pub users: &'a UserDirectory,
}

/// An extracted, comparable value for one column of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortValue {
    Text(CollationKey),
    Number(i64),
    Time(DateTime<Utc>),
    /// Sorts after every present value of the same column.
    Absent,
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use SortValue::*;
        match (self, other) {
            (Text(a), Text(b)) => a.cmp(b),
            (Number(a), Number(b)) => a.cmp(b),
            (Time(a), Time(b)) => a.cmp(b),
            (Absent, Absent) => Ordering::Equal,
            (Absent, _) => Ordering::Greater,
            (_, Absent) => Ordering::Less,
            // A column only ever yields one kind of value.
            _ => Ordering::Equal,
        }
    }
}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn text(s: &str) -> SortValue {
    SortValue::Text(CollationKey::new(&s.to_lowercase()))
}

/// Extract the sort value of `column` for `task`.
pub fn sort_value(task: &Task, column: SortColumn, ctx: &SortContext<'_>) -> SortValue {
    match column {
        SortColumn::Title => text(&task.title),
        SortColumn::Status => SortValue::Number(task.status.rank() as i64),
        SortColumn::Priority => SortValue::Number(task.priority as i64),
        SortColumn::DueDate => task.due_date.map(SortValue::Time).unwrap_or(SortValue::Absent),
        SortColumn::Department => text(ctx.departments.path(&task.department_id)),
        SortColumn::Assignees => match task.assignee_ids().next() {
            Some(uid) => text(&ctx.users.get(uid).name),
            None => SortValue::Absent,
        },
        SortColumn::Project => match &task.project {
            Some(p) => text(&p.name),
            None => SortValue::Absent,
        },
        SortColumn::Tags => match task.tags.first() {
            Some(tag) => text(tag),
            None => SortValue::Absent,
        },
    }
}

fn directed(ord: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

/// Compare two tasks under `criteria`; the first non-equal criterion decides.
pub fn compare(a: &Task, b: &Task, criteria: &[SortCriterion], ctx: &SortContext<'_>) -> Ordering {
    for c in criteria {
        let ord = directed(sort_value(a, c.key, ctx).cmp(&sort_value(b, c.key, ctx)), c.direction);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Stable sort of `tasks` under `criteria`.
///
/// Sort values are extracted once per task rather than once per comparison.
pub fn sort_tasks<'a>(tasks: &mut Vec<&'a Task>, criteria: &[SortCriterion], ctx: &SortContext<'_>) {
    if criteria.is_empty() || tasks.len() < 2 {
        return;
    }
    let mut keyed: Vec<(Vec<SortValue>, &'a Task)> = tasks
        .drain(..)
        .map(|t| (criteria.iter().map(|c| sort_value(t, c.key, ctx)).collect(), t))
        .collect();
    keyed.sort_by(|(ka, _), (kb, _)| {
        ka.iter()
            .zip(kb)
            .zip(criteria)
            .map(|((va, vb), c)| directed(va.cmp(vb), c.direction))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    tasks.extend(keyed.into_iter().map(|(_, t)| t));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{parse_due, Assignment, Department, ProjectRef, UserProfile};

    struct Fixture {
        departments: DepartmentIndex,
        users: UserDirectory,
    }

    impl Fixture {
        fn new(tasks: &[Task]) -> Self {
            let departments = DepartmentIndex::new(&[
                Department {
                    id: "eng".into(),
                    name: "Engineering".into(),
                    parent_id: None,
                    manager_id: None,
                    is_active: true,
                    level: 0,
                },
                Department {
                    id: "ops".into(),
                    name: "Operations".into(),
                    parent_id: Some("eng".into()),
                    manager_id: None,
                    is_active: true,
                    level: 1,
                },
                Department {
                    id: "art".into(),
                    name: "Art".into(),
                    parent_id: Some("zed".into()),
                    manager_id: None,
                    is_active: true,
                    level: 1,
                },
                Department {
                    id: "zed".into(),
                    name: "Zed".into(),
                    parent_id: None,
                    manager_id: None,
                    is_active: true,
                    level: 0,
                },
            ]);
            let profile = |id: &str, name: &str| UserProfile {
                id: id.into(),
                email: format!("{id}@example.com"),
                name: name.into(),
                role: Role::Staff,
                department_id: None,
                is_hr_admin: false,
                is_active: true,
            };
            let users = UserDirectory::for_tasks(&[profile("u1", "Zoe"), profile("u2", "adam")], tasks);
            Fixture { departments, users }
        }

        fn ctx(&self) -> SortContext<'_> {
            SortContext { departments: &self.departments, users: &self.users }
        }
    }

    fn task(id: &str, title: &str, due: Option<&str>, priority: i32, status: TaskStatus) -> Task {
        let mut t = Task::new(id, title);
        t.due_date = due.and_then(parse_due);
        t.priority = priority;
        t.status = status;
        t
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn resolve_prefers_user_criteria() {
        let default = default_criteria();
        assert_eq!(resolve_criteria(&[], &default), default.as_slice());
        let user = [SortCriterion::asc(SortColumn::Title)];
        assert_eq!(resolve_criteria(&user, &default), &user);
    }

    #[test]
    fn default_order_chain() {
        let tasks = vec![
            task("late", "a", Some("2025-07-01"), 9, TaskStatus::ToDo),
            task("lowpri", "a", Some("2025-05-01"), 2, TaskStatus::ToDo),
            task("hipri", "a", Some("2025-05-01"), 8, TaskStatus::ToDo),
            task("nodue", "a", None, 10, TaskStatus::ToDo),
            task("blocked", "a", Some("2025-05-01"), 2, TaskStatus::Blocked),
            task("b-title", "Beta", Some("2025-05-01"), 2, TaskStatus::ToDo),
        ];
        let fx = Fixture::new(&tasks);
        let mut refs: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut refs, &default_criteria(), &fx.ctx());
        assert_eq!(ids(&refs), vec!["hipri", "lowpri", "b-title", "blocked", "late", "nodue"]);
    }

    #[test]
    fn descending_negates() {
        let tasks = vec![
            task("1", "alpha", None, 1, TaskStatus::ToDo),
            task("2", "Bravo", None, 1, TaskStatus::ToDo),
            task("3", "charlie", None, 1, TaskStatus::ToDo),
        ];
        let fx = Fixture::new(&tasks);
        let mut refs: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut refs, &[SortCriterion::desc(SortColumn::Title)], &fx.ctx());
        assert_eq!(ids(&refs), vec!["3", "2", "1"]);
    }

    #[test]
    fn department_sorts_by_path() {
        let mut a = Task::new("a", "x");
        a.department_id = "art".into(); // Zed > Art
        let mut b = Task::new("b", "x");
        b.department_id = "ops".into(); // Engineering > Operations
        let mut c = Task::new("c", "x");
        c.department_id = "unknown".into(); // ""
        let tasks = vec![a, b, c];
        let fx = Fixture::new(&tasks);
        let mut refs: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut refs, &[SortCriterion::asc(SortColumn::Department)], &fx.ctx());
        assert_eq!(ids(&refs), vec!["c", "b", "a"]);
    }

    #[test]
    fn absent_project_and_tags_sort_last() {
        let mut a = Task::new("a", "x");
        a.project = Some(ProjectRef { id: "p".into(), name: "zulu".into() });
        a.tags = vec!["Zeta".into()];
        let b = Task::new("b", "x");
        let mut c = Task::new("c", "x");
        c.project = Some(ProjectRef { id: "q".into(), name: "Alpha".into() });
        c.tags = vec!["alpha".into(), "zzz".into()];
        let tasks = vec![b, a, c];
        let fx = Fixture::new(&tasks);

        let mut refs: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut refs, &[SortCriterion::asc(SortColumn::Project)], &fx.ctx());
        assert_eq!(ids(&refs), vec!["c", "a", "b"]);

        let mut refs: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut refs, &[SortCriterion::asc(SortColumn::Tags)], &fx.ctx());
        assert_eq!(ids(&refs), vec!["c", "a", "b"]);
    }

    #[test]
    fn assignees_sort_by_first_assignee_name() {
        let assign = |tid: &str, uid: &str| Assignment { task_id: tid.into(), user_id: uid.into() };
        let mut a = Task::new("a", "x");
        a.assignments = vec![assign("a", "u1"), assign("a", "u2")]; // Zoe first
        let mut b = Task::new("b", "x");
        b.assignments = vec![assign("b", "u2")]; // adam
        let mut c = Task::new("c", "x");
        c.assignments = vec![assign("c", "ghost")]; // Unknown
        let d = Task::new("d", "x");
        let tasks = vec![d, a, c, b];
        let fx = Fixture::new(&tasks);
        let mut refs: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut refs, &[SortCriterion::asc(SortColumn::Assignees)], &fx.ctx());
        assert_eq!(ids(&refs), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let tasks = vec![
            task("1", "same", None, 3, TaskStatus::ToDo),
            task("2", "same", None, 3, TaskStatus::ToDo),
            task("3", "same", None, 3, TaskStatus::ToDo),
        ];
        let fx = Fixture::new(&tasks);
        let mut refs: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut refs, &default_criteria(), &fx.ctx());
        assert_eq!(ids(&refs), vec!["1", "2", "3"]);
    }

    #[test]
    fn compare_agrees_with_sort() {
        let tasks = vec![
            task("1", "b", Some("2025-01-02"), 3, TaskStatus::ToDo),
            task("2", "a", Some("2025-01-01"), 3, TaskStatus::ToDo),
        ];
        let fx = Fixture::new(&tasks);
        let crit = default_criteria();
        assert_eq!(compare(&tasks[1], &tasks[0], &crit, &fx.ctx()), Ordering::Less);
        assert_eq!(compare(&tasks[0], &tasks[0], &crit, &fx.ctx()), Ordering::Equal);
    }

    #[test]
    fn cycle_policy_removes_after_descending() {
        let mut c = Vec::new();
        toggle(&mut c, SortColumn::Title, TogglePolicy::Cycle);
        assert_eq!(c, vec![SortCriterion::asc(SortColumn::Title)]);
        toggle(&mut c, SortColumn::Priority, TogglePolicy::Cycle);
        toggle(&mut c, SortColumn::Title, TogglePolicy::Cycle);
        assert_eq!(c, vec![SortCriterion::desc(SortColumn::Title), SortCriterion::asc(SortColumn::Priority)]);
        toggle(&mut c, SortColumn::Title, TogglePolicy::Cycle);
        assert_eq!(c, vec![SortCriterion::asc(SortColumn::Priority)]);
    }

    #[test]
    fn flip_policy_never_removes() {
        let mut c = Vec::new();
        toggle(&mut c, SortColumn::Status, TogglePolicy::Flip);
        toggle(&mut c, SortColumn::Status, TogglePolicy::Flip);
        assert_eq!(c, vec![SortCriterion::desc(SortColumn::Status)]);
        toggle(&mut c, SortColumn::Status, TogglePolicy::Flip);
        assert_eq!(c, vec![SortCriterion::asc(SortColumn::Status)]);
    }
}
