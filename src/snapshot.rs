//! File-backed board snapshot.
//!
//! A snapshot holds everything a dashboard reads: tasks, the user directory
//! and the department tree. It stands in for the remote task, user and
//! department sources and is written back after every mutation.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{BoardError, Result};
use crate::task::{Department, Task, UserProfile};

/// In-memory copy of the board data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient_records")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub users: Vec<UserProfile>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub departments: Vec<Department>,
}

/// Read a record array, skipping records that do not fit their shape so one
/// bad row does not hide the rest of the board.
fn lenient_records<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match T::deserialize(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(record = std::any::type_name::<T>(), index = i, error = %e, "skipping malformed record");
                None
            }
        })
        .collect())
}

impl Snapshot {
    /// Load a snapshot from a JSON file. A missing file is an empty board.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no snapshot file, starting empty");
            return Ok(Snapshot::default());
        }
        let buf = fs::read_to_string(path).map_err(|source| BoardError::Io { path: path.to_path_buf(), source })?;
        let snapshot: Snapshot =
            serde_json::from_str(&buf).map_err(|source| BoardError::Parse { path: path.to_path_buf(), source })?;
        debug!(
            path = %path.display(),
            tasks = snapshot.tasks.len(),
            users = snapshot.users.len(),
            departments = snapshot.departments.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Save the snapshot as pretty JSON via a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source| BoardError::Io { path: path.to_path_buf(), source };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self).map_err(|source| BoardError::Parse { path: path.to_path_buf(), source })?;
        let mut f = File::create(&tmp).map_err(io_err)?;
        f.write_all(data.as_bytes()).map_err(io_err)?;
        f.flush().map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        debug!(path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Get a top-level task by id.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn user(&self, id: &str) -> Option<&UserProfile> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn department(&self, id: &str) -> Option<&Department> {
        self.departments.iter().find(|d| d.id == id)
    }

    /// Direct children of a task, whether flat or embedded.
    pub fn children_of<'a>(&'a self, id: &'a str) -> Vec<&'a Task> {
        let mut out: Vec<&Task> = self.tasks.iter().filter(|t| t.parent_task_id.as_deref() == Some(id)).collect();
        if let Some(parent) = self.task(id) {
            for s in &parent.subtasks {
                if !out.iter().any(|o| o.id == s.id) {
                    out.push(s);
                }
            }
        }
        out
    }

    /// Generate the next numeric task id.
    ///
    /// Fails once the largest numeric id is `u64::MAX`, since wrapping would
    /// hand out an id that may already be taken.
    pub fn next_task_id(&self) -> Result<String> {
        let max = self.tasks.iter().filter_map(|t| t.id.parse::<u64>().ok()).max().unwrap_or(0);
        max.checked_add(1)
            .map(|id| id.to_string())
            .ok_or_else(|| BoardError::Validation(format!("task id space exhausted after {max}")))
    }
}
