//! Lookup structures derived once per data snapshot.
//!
//! `DepartmentIndex` resolves department ids to names and root-to-leaf paths
//! ("Engineering > Platform > Storage"). `UserDirectory` projects the full
//! user list down to the users a task list actually references. Both are
//! plain values rebuilt whenever the snapshot reloads; nothing is cached
//! across snapshots.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::task::{Department, Task, UserProfile};

/// Separator between department names in a path.
pub const PATH_SEPARATOR: &str = " > ";

/// Department names, paths and subtree membership for one department tree.
#[derive(Debug, Clone, Default)]
pub struct DepartmentIndex {
    names: HashMap<String, String>,
    parents: HashMap<String, Option<String>>,
    paths: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,
}

impl DepartmentIndex {
    /// Build the index, computing every department's path up front.
    ///
    /// Each parent walk stops at the first ancestor whose path is already
    /// known, so every department is walked at most once. A walk that
    /// revisits a department it has already passed through is a cycle; the
    /// walk stops there and treats the last department reached as the root.
    pub fn new(departments: &[Department]) -> Self {
        let mut index = DepartmentIndex::default();
        for d in departments {
            index.names.insert(d.id.clone(), d.name.clone());
            index.parents.insert(d.id.clone(), d.parent_id.clone());
            if let Some(p) = &d.parent_id {
                index.children.entry(p.clone()).or_default().push(d.id.clone());
            }
        }
        for d in departments {
            index.memoize_path(&d.id);
        }
        index
    }

    fn memoize_path(&mut self, id: &str) {
        if self.paths.contains_key(id) {
            return;
        }

        // Walk up until a memoized ancestor, the root, a dangling parent, or a cycle.
        let mut chain: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut prefix = String::new();
        let mut cur = Some(id);
        while let Some(cid) = cur {
            if let Some(known) = self.paths.get(cid) {
                prefix = known.clone();
                break;
            }
            if !self.names.contains_key(cid) {
                break;
            }
            if !seen.insert(cid) {
                warn!(department = cid, "cyclic department parent chain");
                break;
            }
            chain.push(cid.to_string());
            cur = self.parents.get(cid).and_then(|p| p.as_deref());
        }

        for cid in chain.into_iter().rev() {
            let name = &self.names[&cid];
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}{PATH_SEPARATOR}{name}")
            };
            prefix = path.clone();
            self.paths.insert(cid, path);
        }
    }

    /// Root-to-leaf path for a department, or "" when the id is unknown.
    pub fn path(&self, id: &str) -> &str {
        self.paths.get(id).map(String::as_str).unwrap_or("")
    }

    /// Department name, if the id resolves.
    pub fn name(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.names.contains_key(id)
    }

    /// The department itself plus every department below it.
    pub fn subtree(&self, id: &str) -> HashSet<String> {
        let mut out = HashSet::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id.to_string()];
        while let Some(cur) = stack.pop() {
            if !out.insert(cur.clone()) {
                continue;
            }
            if let Some(kids) = self.children.get(&cur) {
                stack.extend(kids.iter().cloned());
            }
        }
        out
    }
}

/// Display fields for a user referenced by a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDisplay {
    pub name: String,
    pub email: String,
}

impl UserDisplay {
    fn unknown() -> Self {
        UserDisplay { name: "Unknown".into(), email: "No email".into() }
    }
}

/// User id to display name/email, limited to the users a task list references.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: HashMap<String, UserDisplay>,
    fallback: UserDisplay,
}

impl Default for UserDirectory {
    fn default() -> Self {
        UserDirectory { users: HashMap::new(), fallback: UserDisplay::unknown() }
    }
}

impl UserDirectory {
    /// Project `directory` onto the assignees of `tasks`, including any
    /// embedded subtasks.
    pub fn for_tasks<'a>(directory: &[UserProfile], tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut referenced: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&Task> = tasks.into_iter().collect();
        while let Some(t) = stack.pop() {
            referenced.extend(t.assignee_ids());
            stack.extend(t.subtasks.iter());
        }

        let users = directory
            .iter()
            .filter(|u| referenced.contains(u.id.as_str()))
            .map(|u| (u.id.clone(), UserDisplay { name: u.name.clone(), email: u.email.clone() }))
            .collect();
        UserDirectory { users, ..Default::default() }
    }

    /// Display fields for a user, falling back to "Unknown" / "No email".
    pub fn get(&self, id: &str) -> &UserDisplay {
        self.users.get(id).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Role;
    use crate::task::Assignment;

    fn dept(id: &str, name: &str, parent: Option<&str>) -> Department {
        Department {
            id: id.into(),
            name: name.into(),
            parent_id: parent.map(Into::into),
            manager_id: None,
            is_active: true,
            level: 0,
        }
    }

    #[test]
    fn paths_walk_to_the_root() {
        // Children listed before parents to exercise memoization order.
        let idx = DepartmentIndex::new(&[
            dept("st", "Storage", Some("pl")),
            dept("pl", "Platform", Some("en")),
            dept("en", "Engineering", None),
        ]);
        assert_eq!(idx.path("st"), "Engineering > Platform > Storage");
        assert_eq!(idx.path("pl"), "Engineering > Platform");
        assert_eq!(idx.path("en"), "Engineering");
        assert_eq!(idx.path("missing"), "");
        assert_eq!(idx.path("st"), idx.path("st"));
    }

    #[test]
    fn dangling_parent_is_a_root() {
        let idx = DepartmentIndex::new(&[dept("a", "Alpha", Some("gone"))]);
        assert_eq!(idx.path("a"), "Alpha");
    }

    #[test]
    fn cycles_terminate() {
        let idx = DepartmentIndex::new(&[
            dept("a", "A", Some("c")),
            dept("b", "B", Some("a")),
            dept("c", "C", Some("b")),
        ]);
        assert_eq!(idx.path("a"), "B > C > A");
        assert_eq!(idx.path("c"), "B > C");
        assert_eq!(idx.path("b"), "B");
        assert_eq!(idx.subtree("a").len(), 3);
    }

    #[test]
    fn subtree_includes_descendants_only() {
        let idx = DepartmentIndex::new(&[
            dept("en", "Engineering", None),
            dept("pl", "Platform", Some("en")),
            dept("st", "Storage", Some("pl")),
            dept("hr", "People", None),
        ]);
        let sub = idx.subtree("pl");
        assert!(sub.contains("pl") && sub.contains("st"));
        assert!(!sub.contains("en") && !sub.contains("hr"));
        assert!(idx.subtree("nope").is_empty());
    }

    #[test]
    fn directory_projects_referenced_users() {
        let users = vec![
            UserProfile {
                id: "u1".into(),
                email: "ana@example.com".into(),
                name: "Ana".into(),
                role: Role::Staff,
                department_id: None,
                is_hr_admin: false,
                is_active: true,
            },
            UserProfile {
                id: "u2".into(),
                email: "bo@example.com".into(),
                name: "Bo".into(),
                role: Role::Manager,
                department_id: None,
                is_hr_admin: false,
                is_active: true,
            },
        ];
        let mut t = Task::new("1", "x");
        t.assignments = vec![
            Assignment { task_id: "1".into(), user_id: "u1".into() },
            Assignment { task_id: "1".into(), user_id: "ghost".into() },
        ];
        let dir = UserDirectory::for_tasks(&users, [&t]);
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.get("u1").name, "Ana");
        assert_eq!(dir.get("ghost").name, "Unknown");
        assert_eq!(dir.get("ghost").email, "No email");
        assert_eq!(dir.get("u2").name, "Unknown");
    }
}
