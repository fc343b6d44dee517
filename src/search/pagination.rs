//! Pagination metadata for a result page.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::search::RESULTS_PER_PAGE;

/// Number of page links shown around the current page.
const WINDOW_SIZE: u64 = 5;

/// Where a result page sits in the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u64,
    pub per_page: u64,
    pub total_results: u64,
    pub last_page: u64,
    pub window_start: u64,
    pub window_end: u64,
}

impl Pagination {
    /// Derive the last page and the link window for `current_page`.
    ///
    /// The window starts two pages before the current one (never below 1)
    /// and spans at most five pages, ending no later than the last page.
    /// With no results the window is empty.
    #[must_use]
    pub fn compute(current_page: u64, total_results: u64) -> Self {
        let last_page = total_results.div_ceil(RESULTS_PER_PAGE);
        let window_start = current_page.saturating_sub(2).max(1);
        let window_end = window_start.saturating_add(WINDOW_SIZE - 1).min(last_page);
        Self {
            current_page,
            per_page: RESULTS_PER_PAGE,
            total_results,
            last_page,
            window_start,
            window_end,
        }
    }

    /// Page numbers to show as links; empty when there are no results.
    #[must_use]
    pub fn window(&self) -> RangeInclusive<u64> {
        self.window_start..=self.window_end
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_results == 0
    }
}
