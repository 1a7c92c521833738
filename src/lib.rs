//! # taskboard
//!
//! Role-scoped task dashboards over a snapshot of tasks, users and
//! departments.
//!
//! The heart of the crate is the task list view pipeline:
//!
//! 1. **Filter** ([`filter`]): title substring plus multi-select status,
//!    department, assignee and project fields.
//! 2. **Sort** ([`sort`]): multi-key ordering with a default chain (due date,
//!    priority, status, title) when no column is chosen.
//! 3. **Hierarchy** ([`hierarchy`]): nest subtasks under their parents.
//!
//! [`pipeline`] wires the stages together with view state (filters, sort
//! criteria, expanded rows, page). [`index`] builds the department path and
//! user display lookups the stages read. Around the pipeline sit a JSON
//! [`snapshot`] store, role-scoped queries ([`scope`]), per-field
//! [`mutation`]s, and a terminal dashboard ([`tui`]).
//!
//! ```no_run
//! use std::path::Path;
//! use taskboard::{pipeline::{BoardIndex, Pipeline, ViewState}, snapshot::Snapshot};
//!
//! let snap = Snapshot::load(Path::new("board.json")).unwrap();
//! let index = BoardIndex::build(&snap.tasks, &snap.users, &snap.departments);
//! let mut view = ViewState::default();
//! let board = Pipeline::default().run(&snap.tasks, &mut view, &index);
//! for row in &board.hierarchy.rows {
//!     println!("{} ({} subtasks)", row.task.title, row.subtasks.len());
//! }
//! ```

pub mod collate;
pub mod config;
pub mod display;
pub mod error;
pub mod fields;
pub mod filter;
pub mod hierarchy;
pub mod index;
pub mod mutation;
pub mod pipeline;
pub mod scope;
pub mod snapshot;
pub mod sort;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod input;
    pub mod run;
}

pub use error::{BoardError, Result};
