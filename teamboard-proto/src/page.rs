//! Paginated query results.
//!
//! Every list the client shows comes from a paginated fetch that reports
//! one of four statuses. While the first page is in flight the result is
//! transiently empty, so only the other three statuses are "settled" and
//! trustworthy enough to cache or to act on.

use serde::{Deserialize, Serialize};

/// Loading status of a paginated fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageStatus {
    /// The first page has not arrived yet; `results` is empty and untrusted.
    LoadingFirstPage,
    /// Some pages are loaded and more are available.
    CanLoadMore,
    /// Some pages are loaded and another is in flight.
    LoadingMore,
    /// Every page is loaded.
    Exhausted,
}

impl PageStatus {
    /// Returns `true` for every status except [`PageStatus::LoadingFirstPage`].
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::LoadingFirstPage)
    }

    /// Returns `true` when the whole result set is loaded.
    #[must_use]
    pub const fn is_drained(self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

impl std::fmt::Display for PageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadingFirstPage => write!(f, "loading_first_page"),
            Self::CanLoadMore => write!(f, "can_load_more"),
            Self::LoadingMore => write!(f, "loading_more"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// The current result of a paginated fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows loaded so far.
    pub results: Vec<T>,
    /// Loading status.
    pub status: PageStatus,
}

impl<T> Page<T> {
    /// A page whose first page is still in flight.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            results: Vec::new(),
            status: PageStatus::LoadingFirstPage,
        }
    }

    /// A fully loaded page.
    #[must_use]
    pub const fn exhausted(results: Vec<T>) -> Self {
        Self {
            results,
            status: PageStatus::Exhausted,
        }
    }

    /// A partially loaded page with more rows available.
    #[must_use]
    pub const fn partial(results: Vec<T>) -> Self {
        Self {
            results,
            status: PageStatus::CanLoadMore,
        }
    }

    /// Shorthand for `self.status.is_settled()`.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.status.is_settled()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::loading()
    }
}
