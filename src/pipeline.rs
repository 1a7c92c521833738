//! The task list view pipeline: filter, then sort, then nest.
//!
//! `Pipeline` holds the per-dashboard configuration (default ordering and
//! header toggle policy). `ViewState` holds what the user changes while the
//! dashboard is open: filters, explicit sort criteria, expanded rows and the
//! current page. Each `run` is a complete pass over the snapshot it is given.

use std::collections::HashSet;

use tracing::trace;

use crate::fields::{SortColumn, TogglePolicy};
use crate::filter::{filter_tasks, Filters};
use crate::hierarchy::{build_hierarchy, Hierarchy, TaskRow};
use crate::index::{DepartmentIndex, UserDirectory};
use crate::sort::{default_criteria, resolve_criteria, sort_tasks, toggle, SortContext, SortCriterion};
use crate::task::{Department, Task, UserProfile};

/// Lookup structures for one snapshot.
#[derive(Debug, Clone, Default)]
pub struct BoardIndex {
    pub departments: DepartmentIndex,
    pub users: UserDirectory,
}

impl BoardIndex {
    /// Build lookups for `tasks`; only the users they reference are kept.
    pub fn build<'a>(tasks: impl IntoIterator<Item = &'a Task>, users: &[UserProfile], departments: &[Department]) -> Self {
        BoardIndex {
            departments: DepartmentIndex::new(departments),
            users: UserDirectory::for_tasks(users, tasks),
        }
    }

    pub fn sort_context(&self) -> SortContext<'_> {
        SortContext { departments: &self.departments, users: &self.users }
    }
}

/// Page position over the top-level rows. A `page_size` of zero shows all rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Pagination { page: 0, page_size }
    }

    /// Number of pages needed for `rows`; never less than one.
    pub fn page_count(&self, rows: usize) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        rows.div_ceil(self.page_size).max(1)
    }

    /// Clamp the current page after the row count changed.
    pub fn reconcile(&mut self, rows: usize) {
        let last = self.page_count(rows) - 1;
        if self.page > last {
            self.page = last;
        }
    }

    /// Index range of the current page.
    pub fn range(&self, rows: usize) -> std::ops::Range<usize> {
        if self.page_size == 0 {
            return 0..rows;
        }
        let start = self.page.saturating_mul(self.page_size).min(rows);
        start..start.saturating_add(self.page_size).min(rows)
    }

    pub fn next(&mut self, rows: usize) {
        if self.page.saturating_add(1) < self.page_count(rows) {
            self.page += 1;
        }
    }

    pub fn prev(&mut self) {
        self.page = self.page.saturating_sub(1);
    }
}

/// Dashboard state the user manipulates.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub filters: Filters,
    /// Explicit criteria; empty means the pipeline's default ordering.
    pub criteria: Vec<SortCriterion>,
    /// Ids of expanded rows. Survives re-filtering and re-sorting.
    pub expanded: HashSet<String>,
    pub pagination: Pagination,
}

impl ViewState {
    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Toggle expansion of a row; returns the new state.
    pub fn toggle_expanded(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }
}

/// Per-dashboard pipeline configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub default_criteria: Vec<SortCriterion>,
    pub toggle_policy: TogglePolicy,
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline { default_criteria: default_criteria(), toggle_policy: TogglePolicy::Cycle }
    }
}

/// Result of one pipeline pass.
#[derive(Debug, Clone)]
pub struct BoardView<'a> {
    pub hierarchy: Hierarchy<'a>,
    /// Criteria the list was actually ordered by.
    pub criteria: Vec<SortCriterion>,
    /// Tasks that passed the filter stage.
    pub matched: usize,
    /// Tasks in the snapshot handed to the pipeline.
    pub total: usize,
}

impl<'a> BoardView<'a> {
    /// Top-level rows of the current page.
    pub fn page(&self, pagination: &Pagination) -> &[TaskRow<'a>] {
        &self.hierarchy.rows[pagination.range(self.hierarchy.rows.len())]
    }
}

impl Pipeline {
    pub fn new(default_criteria: Vec<SortCriterion>, toggle_policy: TogglePolicy) -> Self {
        Pipeline { default_criteria, toggle_policy }
    }

    /// Criteria in effect for `view`.
    pub fn active_criteria<'c>(&'c self, view: &'c ViewState) -> &'c [SortCriterion] {
        resolve_criteria(&view.criteria, &self.default_criteria)
    }

    /// Apply a column header interaction under this dashboard's policy.
    pub fn toggle_sort(&self, view: &mut ViewState, column: SortColumn) {
        toggle(&mut view.criteria, column, self.toggle_policy);
    }

    /// Run filter, sort and hierarchy over `tasks`, then clamp the page.
    pub fn run<'a, I>(&self, tasks: I, view: &mut ViewState, index: &BoardIndex) -> BoardView<'a>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let tasks: Vec<&'a Task> = tasks.into_iter().collect();
        let total = tasks.len();

        let mut filtered = filter_tasks(tasks, &view.filters, &index.departments);
        let matched = filtered.len();

        let criteria = self.active_criteria(view).to_vec();
        sort_tasks(&mut filtered, &criteria, &index.sort_context());

        let hierarchy = build_hierarchy(&filtered);
        view.pagination.reconcile(hierarchy.rows.len());
        trace!(total, matched, rows = hierarchy.rows.len(), page = view.pagination.page, "pipeline pass");

        BoardView { hierarchy, criteria, matched, total }
    }
}
