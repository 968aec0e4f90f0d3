//! Per-scope cache of the last settled page of paginated data.
//!
//! Paginated fetches report an empty result while their first page is in
//! flight. Trusting that result would flash "not found" states during
//! normal navigation, so consumers fall back to the last settled page
//! captured here for the same scope.
//!
//! The cache never stores a page whose status is
//! [`PageStatus::LoadingFirstPage`](teamboard_proto::page::PageStatus).
//! Writes are not ordered by request: whichever settled page is written
//! last wins, even if it came from an older, slower request.

use std::collections::HashMap;

use teamboard_proto::page::Page;

/// Last settled page per scope id (workspace slug or project id).
#[derive(Debug, Clone)]
pub struct SnapshotCache<T> {
    entries: HashMap<String, Page<T>>,
    workspace_slug: Option<String>,
}

impl<T> Default for SnapshotCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            workspace_slug: None,
        }
    }
}

impl<T: Clone> SnapshotCache<T> {
    /// An empty cache bound to no workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last settled page for `scope_id`.
    #[must_use]
    pub fn get(&self, scope_id: &str) -> Option<&Page<T>> {
        self.entries.get(scope_id)
    }

    /// Stores `page` for `scope_id` if it is settled.
    ///
    /// Returns `true` if the page was stored.
    pub fn set(&mut self, scope_id: &str, page: &Page<T>) -> bool {
        if !page.is_settled() {
            tracing::trace!(scope_id, "ignoring page still loading its first page");
            return false;
        }
        self.entries.insert(scope_id.to_string(), page.clone());
        true
    }

    /// Drops every cached page.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(entries = self.entries.len(), "snapshot cache cleared");
        }
        self.entries.clear();
    }

    /// Records the bound workspace slug, clearing the cache when it changes.
    ///
    /// Returns `true` if the cache was cleared.
    pub fn bind_workspace(&mut self, slug: Option<&str>) -> bool {
        if self.workspace_slug.as_deref() == slug {
            return false;
        }
        tracing::info!(
            from = self.workspace_slug.as_deref().unwrap_or("-"),
            to = slug.unwrap_or("-"),
            "workspace changed, dropping cached pages"
        );
        self.workspace_slug = slug.map(str::to_string);
        self.clear();
        true
    }

    /// The slug the cache is currently bound to.
    #[must_use]
    pub fn workspace_slug(&self) -> Option<&str> {
        self.workspace_slug.as_deref()
    }

    /// Rows to show for `scope_id`: the live rows once settled, otherwise
    /// the cached rows, otherwise nothing.
    #[must_use]
    pub fn resolve<'a>(&'a self, scope_id: &str, live: &'a Page<T>) -> &'a [T] {
        if live.is_settled() {
            return &live.results;
        }
        match self.get(scope_id) {
            Some(page) => &page.results,
            None => &[],
        }
    }

    /// Finds a row by looking in live data first, then in the cached page.
    pub fn find<'a, F>(&'a self, scope_id: &str, live: &'a Page<T>, predicate: F) -> Option<&'a T>
    where
        F: Fn(&T) -> bool,
    {
        live.results.iter().find(|row| predicate(row)).or_else(|| {
            self.get(scope_id)
                .and_then(|page| page.results.iter().find(|row| predicate(row)))
        })
    }

    /// Number of cached scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
