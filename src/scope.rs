//! Role-scoped task queries.
//!
//! Each dashboard asks its source for the tasks visible in its context. The
//! pipeline treats the answer as the authoritative snapshot for one pass.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BoardError, Result};
use crate::fields::Scope;
use crate::index::DepartmentIndex;
use crate::snapshot::Snapshot;
use crate::task::{Department, Task, UserProfile};

/// Parameters of a task list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub scope: Scope,
    /// Id of the user the dashboard is shown to.
    pub viewer: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub include_archived: bool,
}

impl TaskQuery {
    pub fn new(scope: Scope, viewer: impl Into<String>) -> Self {
        TaskQuery { scope, viewer: viewer.into(), limit: None, offset: 0, include_archived: false }
    }
}

/// Where dashboards get their data from.
pub trait BoardSource {
    /// Tasks visible to `query.viewer` in `query.scope`, paged by offset/limit.
    fn query_tasks(&self, query: &TaskQuery) -> Result<Vec<&Task>>;

    /// The full user directory.
    fn user_directory(&self) -> &[UserProfile];

    /// The full department tree.
    fn department_tree(&self) -> &[Department];
}

impl BoardSource for Snapshot {
    fn query_tasks(&self, query: &TaskQuery) -> Result<Vec<&Task>> {
        let viewer = self.user(&query.viewer).ok_or_else(|| BoardError::not_found("user", &query.viewer))?;

        let visible: Vec<&Task> = match query.scope {
            Scope::Personal => self
                .tasks
                .iter()
                .filter(|t| t.owner_id.as_deref() == Some(viewer.id.as_str()) || t.is_assigned_to(&viewer.id))
                .collect(),
            Scope::Department => {
                let Some(home) = viewer.department_id.as_deref() else {
                    warn!(user = %viewer.id, "department dashboard for a user without a department");
                    return Ok(Vec::new());
                };
                let subtree = DepartmentIndex::new(&self.departments).subtree(home);
                self.tasks.iter().filter(|t| subtree.contains(&t.department_id)).collect()
            }
            Scope::Company => self.tasks.iter().collect(),
            Scope::HrAdmin => {
                if !viewer.has_hr_access() {
                    return Err(BoardError::Forbidden(format!("{} is not an HR administrator", viewer.id)));
                }
                self.tasks.iter().collect()
            }
        };

        let page: Vec<&Task> = visible
            .into_iter()
            .filter(|t| query.include_archived || !t.archived)
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();
        debug!(scope = ?query.scope, viewer = %viewer.id, returned = page.len(), "task query");
        Ok(page)
    }

    fn user_directory(&self) -> &[UserProfile] {
        &self.users
    }

    fn department_tree(&self) -> &[Department] {
        &self.departments
    }
}
