//! Hierarchy stage: nest subtasks under their parent task.
//!
//! Two input shapes are handled. Flat input carries subtasks as ordinary list
//! entries with `parent_task_id` set; they are grouped under the top-level
//! task they reference, keeping the order they had in the (already sorted)
//! input. Pre-nested input carries subtasks inside their parent's `subtasks`
//! array; those arrays are used as they are and only `has_subtasks` is
//! derived.
//!
//! A subtask whose parent is not a top-level entry of the same input appears
//! nowhere in the output. It is reported in `Hierarchy::dropped` so callers
//! can account for it.

use std::collections::HashMap;

use tracing::debug;

use crate::task::Task;

/// A top-level task with its subtasks.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow<'a> {
    pub task: &'a Task,
    pub subtasks: Vec<&'a Task>,
    pub has_subtasks: bool,
}

/// Output of the hierarchy stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy<'a> {
    pub rows: Vec<TaskRow<'a>>,
    /// Subtasks whose parent was not among the top-level rows.
    pub dropped: Vec<&'a Task>,
}

impl<'a> Hierarchy<'a> {
    /// Total number of tasks shown, counting subtasks.
    pub fn visible_count(&self) -> usize {
        self.rows.iter().map(|r| 1 + r.subtasks.len()).sum()
    }
}

/// Whether any entry already carries embedded subtasks.
pub fn is_pre_nested(tasks: &[&Task]) -> bool {
    tasks.iter().any(|t| !t.subtasks.is_empty())
}

/// Regroup a filtered, sorted list into parent rows.
pub fn build_hierarchy<'a>(tasks: &[&'a Task]) -> Hierarchy<'a> {
    let out = if is_pre_nested(tasks) {
        from_nested(tasks)
    } else {
        from_flat(tasks)
    };
    if !out.dropped.is_empty() {
        debug!(
            dropped = out.dropped.len(),
            ids = ?out.dropped.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            "subtasks without a visible parent"
        );
    }
    out
}

fn from_flat<'a>(tasks: &[&'a Task]) -> Hierarchy<'a> {
    let mut rows: Vec<TaskRow<'a>> = Vec::new();
    let mut row_of: HashMap<&str, usize> = HashMap::new();
    for t in tasks.iter().copied().filter(|t| !t.is_subtask()) {
        row_of.insert(t.id.as_str(), rows.len());
        rows.push(TaskRow { task: t, subtasks: Vec::new(), has_subtasks: false });
    }

    let mut dropped = Vec::new();
    for t in tasks.iter().copied() {
        let Some(parent) = t.parent_task_id.as_deref() else {
            continue;
        };
        match row_of.get(parent) {
            Some(&i) => rows[i].subtasks.push(t),
            None => dropped.push(t),
        }
    }

    for r in &mut rows {
        r.has_subtasks = !r.subtasks.is_empty();
    }
    Hierarchy { rows, dropped }
}

fn from_nested<'a>(tasks: &[&'a Task]) -> Hierarchy<'a> {
    let rows: Vec<TaskRow<'a>> = tasks
        .iter()
        .copied()
        .filter(|t| !t.is_subtask())
        .map(|t| TaskRow {
            task: t,
            subtasks: t.subtasks.iter().collect(),
            has_subtasks: !t.subtasks.is_empty(),
        })
        .collect();

    // Subtasks listed at the top level as well as embedded are not orphans.
    let dropped = tasks
        .iter()
        .copied()
        .filter(|t| t.is_subtask())
        .filter(|t| !rows.iter().any(|r| r.subtasks.iter().any(|s| s.id == t.id)))
        .collect();
    Hierarchy { rows, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(id: &str, parent: &str) -> Task {
        let mut t = Task::new(id, id);
        t.parent_task_id = Some(parent.into());
        t
    }

    fn row_ids(h: &Hierarchy<'_>) -> Vec<(String, Vec<String>)> {
        h.rows
            .iter()
            .map(|r| (r.task.id.clone(), r.subtasks.iter().map(|s| s.id.clone()).collect()))
            .collect()
    }

    #[test]
    fn flat_input_groups_under_parents_in_input_order() {
        let tasks = vec![sub("s2", "p1"), Task::new("p2", "p2"), sub("s1", "p1"), Task::new("p1", "p1"), sub("s3", "p2")];
        let refs: Vec<&Task> = tasks.iter().collect();
        let h = build_hierarchy(&refs);
        assert_eq!(
            row_ids(&h),
            vec![
                ("p2".to_string(), vec!["s3".to_string()]),
                ("p1".to_string(), vec!["s2".to_string(), "s1".to_string()]),
            ]
        );
        assert!(h.rows.iter().all(|r| r.has_subtasks));
        assert!(h.dropped.is_empty());
        assert_eq!(h.visible_count(), 5);
    }

    #[test]
    fn childless_parent_has_no_subtasks_flag() {
        let tasks = vec![Task::new("p", "p")];
        let refs: Vec<&Task> = tasks.iter().collect();
        let h = build_hierarchy(&refs);
        assert!(!h.rows[0].has_subtasks);
    }

    #[test]
    fn orphans_are_dropped_everywhere() {
        let tasks = vec![Task::new("p", "p"), sub("orphan", "missing"), sub("ok", "p")];
        let refs: Vec<&Task> = tasks.iter().collect();
        let h = build_hierarchy(&refs);
        assert_eq!(row_ids(&h), vec![("p".to_string(), vec!["ok".to_string()])]);
        assert_eq!(h.dropped.len(), 1);
        assert_eq!(h.dropped[0].id, "orphan");
    }

    #[test]
    fn grandchildren_are_not_attached() {
        let tasks = vec![Task::new("p", "p"), sub("c", "p"), sub("g", "c")];
        let refs: Vec<&Task> = tasks.iter().collect();
        let h = build_hierarchy(&refs);
        assert_eq!(row_ids(&h), vec![("p".to_string(), vec!["c".to_string()])]);
        assert_eq!(h.dropped.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec!["g"]);
    }

    #[test]
    fn pre_nested_input_is_not_regrouped() {
        let mut parent = Task::new("p", "p");
        parent.subtasks = vec![sub("b", "p"), sub("a", "p")];
        let lone = Task::new("q", "q");
        let tasks = vec![lone, parent];
        let refs: Vec<&Task> = tasks.iter().collect();
        let h = build_hierarchy(&refs);
        assert_eq!(
            row_ids(&h),
            vec![
                ("q".to_string(), vec![]),
                ("p".to_string(), vec!["b".to_string(), "a".to_string()]),
            ]
        );
        assert!(!h.rows[0].has_subtasks);
        assert!(h.rows[1].has_subtasks);
    }

    #[test]
    fn both_shapes_agree_on_the_same_data() {
        let flat = vec![Task::new("p", "p"), sub("s1", "p"), sub("s2", "p")];
        let mut nested_parent = Task::new("p", "p");
        nested_parent.subtasks = vec![sub("s1", "p"), sub("s2", "p")];
        let nested = vec![nested_parent];

        let flat_refs: Vec<&Task> = flat.iter().collect();
        let nested_refs: Vec<&Task> = nested.iter().collect();
        assert_eq!(row_ids(&build_hierarchy(&flat_refs)), row_ids(&build_hierarchy(&nested_refs)));
    }
}
