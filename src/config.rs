//! Board configuration.
//!
//! Read from `config.json` next to the snapshot file. Every field is
//! optional and an absent file means defaults throughout.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BoardError, Result};
use crate::fields::{Scope, TogglePolicy};
use crate::pipeline::Pipeline;
use crate::sort::{default_criteria, SortCriterion};

/// File name of the config, resolved relative to the snapshot's directory.
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the snapshot path.
pub const DATA_ENV: &str = "TASKBOARD_DATA";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "TASKBOARD_LOG";

/// Header toggle policy per dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TogglePolicies {
    pub personal: TogglePolicy,
    pub department: TogglePolicy,
    pub company: TogglePolicy,
    pub hr_admin: TogglePolicy,
}

impl Default for TogglePolicies {
    fn default() -> Self {
        TogglePolicies {
            personal: TogglePolicy::Cycle,
            department: TogglePolicy::Cycle,
            company: TogglePolicy::Flip,
            hr_admin: TogglePolicy::Flip,
        }
    }
}

impl TogglePolicies {
    pub fn for_scope(&self, scope: Scope) -> TogglePolicy {
        match scope {
            Scope::Personal => self.personal,
            Scope::Department => self.department,
            Scope::Company => self.company,
            Scope::HrAdmin => self.hr_admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardConfig {
    /// Top-level rows per page; 0 disables paging.
    pub page_size: usize,
    pub toggle_policies: TogglePolicies,
    /// Ordering used when no column is selected.
    pub default_sort: Vec<SortCriterion>,
    /// User the dashboards are shown to when `--user` is not given.
    pub default_user: Option<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            page_size: 25,
            toggle_policies: TogglePolicies::default(),
            default_sort: default_criteria(),
            default_user: None,
        }
    }
}

impl BoardConfig {
    /// Load `config.json` from `dir`, or defaults if it does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(BoardConfig::default());
        }
        let buf = fs::read_to_string(&path).map_err(|source| BoardError::Io { path: path.clone(), source })?;
        let config: BoardConfig =
            serde_json::from_str(&buf).map_err(|source| BoardError::Parse { path: path.clone(), source })?;
        config.validate()?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (i, c) in self.default_sort.iter().enumerate() {
            if self.default_sort[..i].iter().any(|p| p.key == c.key) {
                return Err(BoardError::Config(format!("defaultSort lists {:?} more than once", c.key)));
            }
        }
        Ok(())
    }

    /// Pipeline configured for one dashboard.
    pub fn pipeline(&self, scope: Scope) -> Pipeline {
        let default = if self.default_sort.is_empty() {
            default_criteria()
        } else {
            self.default_sort.clone()
        };
        Pipeline::new(default, self.toggle_policies.for_scope(scope))
    }
}

/// Default snapshot location: `~/.taskboard/board.json`.
pub fn default_data_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".taskboard").join("board.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::SortColumn;

    #[test]
    fn absent_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BoardConfig::load(dir.path()).unwrap();
        assert_eq!(cfg, BoardConfig::default());
        assert_eq!(cfg.pipeline(Scope::Company).toggle_policy, TogglePolicy::Flip);
        assert_eq!(cfg.pipeline(Scope::Personal).toggle_policy, TogglePolicy::Cycle);
    }

    #[test]
    fn partial_file_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "pageSize": 10, "togglePolicies": { "personal": "flip" }, "defaultSort": [{ "key": "title" }] }"#,
        )
        .unwrap();
        let cfg = BoardConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.toggle_policies.personal, TogglePolicy::Flip);
        assert_eq!(cfg.toggle_policies.department, TogglePolicy::Cycle);
        assert_eq!(cfg.pipeline(Scope::Personal).default_criteria, vec![SortCriterion::asc(SortColumn::Title)]);
    }

    #[test]
    fn duplicate_default_columns_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{ "defaultSort": [{ "key": "title" }, { "key": "title", "direction": "desc" }] }"#)
            .unwrap();
        assert!(matches!(BoardConfig::load(dir.path()), Err(BoardError::Config(_))));
    }
}
