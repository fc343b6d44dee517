//! Query building, result paging and term highlighting.
//!
//! A search runs in three steps: [`query`] turns terms or a pattern into a
//! [`QueryDescriptor`], [`fetch_page`] runs it against a storage backend to
//! get tablet ids plus the total match count, and [`highlight`] marks the
//! terms in each reconstructed tablet.

pub mod highlight;
pub mod pagination;
pub mod query;
pub mod terms;

use serde::{Deserialize, Serialize};

use crate::corpus::{Tablet, TabletId};
use crate::error::SearchError;
use crate::storage::StorageBackend;

pub use highlight::{Markup, annotate};
pub use pagination::Pagination;
pub use query::{QueryDescriptor, build_pattern_query, build_ranked_query};
pub use terms::SearchTerms;

/// Fixed number of tablets per result page.
pub const RESULTS_PER_PAGE: u64 = 10;

/// Highest page number a search accepts.
pub const MAX_PAGE: u64 = 1_000_000_000;

/// How the query string is interpreted. Always chosen explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Full-text match requiring every term, ordered by relevance.
    #[default]
    Ranked,
    /// Regular-expression match on section text, storage order.
    Pattern,
}

/// A tablet id returned by a search, with its relevance when ranked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredMatch {
    pub id: TabletId,
    pub score: Option<f64>,
}

/// The ids on one page together with pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage {
    pub matches: Vec<ScoredMatch>,
    pub pagination: Pagination,
}

impl ResultPage {
    /// Tablet ids in page order.
    pub fn ids(&self) -> impl Iterator<Item = TabletId> + '_ {
        self.matches.iter().map(|m| m.id)
    }
}

/// Run a descriptor and collect the page of ids plus the total count.
///
/// # Errors
///
/// Returns `SearchError::InvalidPattern` if a pattern is rejected by the
/// backend's matcher, and `SearchError::StorageFailure` if either the page
/// query or the count query fails. A failed count is never reported as zero.
pub fn fetch_page<S>(storage: &S, descriptor: &QueryDescriptor) -> Result<ResultPage, SearchError>
where
    S: StorageBackend + ?Sized,
{
    if let query::MatchFilter::Pattern { pattern } = &descriptor.filter {
        storage
            .check_pattern(pattern)
            .map_err(|reason| SearchError::InvalidPattern {
                pattern: pattern.clone(),
                reason,
            })?;
    }

    let matches = storage.fetch_matches(descriptor)?;
    let total = storage.count_matches(descriptor.count_request())?;

    Ok(ResultPage {
        matches,
        pagination: Pagination::compute(descriptor.page, total),
    })
}

/// Highlight `terms` in every line of `tablet`, returning an annotated copy.
#[must_use]
pub fn highlight_tablet(tablet: &Tablet, terms: &SearchTerms, markup: Markup) -> Tablet {
    tablet.map_sections(|section| annotate(section, terms, markup))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::corpus::DetailRow;
    use crate::search::query::CountRequest;
    use crate::storage::StorageError;

    /// Backend returning canned results, optionally failing the count.
    struct FakeStorage {
        matches: Vec<ScoredMatch>,
        total: u64,
        fail_count: bool,
        count_calls: Cell<usize>,
    }

    impl FakeStorage {
        fn new(ids: &[i64], total: u64) -> Self {
            Self {
                matches: ids
                    .iter()
                    .map(|&id| ScoredMatch {
                        id: TabletId(id),
                        score: None,
                    })
                    .collect(),
                total,
                fail_count: false,
                count_calls: Cell::new(0),
            }
        }
    }

    impl StorageBackend for FakeStorage {
        fn fetch_matches(
            &self,
            _descriptor: &QueryDescriptor,
        ) -> Result<Vec<ScoredMatch>, StorageError> {
            Ok(self.matches.clone())
        }

        fn count_matches(&self, _request: CountRequest<'_>) -> Result<u64, StorageError> {
            self.count_calls.set(self.count_calls.get() + 1);
            if self.fail_count {
                return Err(StorageError::Query("connection lost".to_string()));
            }
            Ok(self.total)
        }

        fn fetch_rows(&self, _id: TabletId) -> Result<Vec<DetailRow>, StorageError> {
            Ok(Vec::new())
        }

        fn check_pattern(&self, pattern: &str) -> Result<(), String> {
            if pattern.contains('(') && !pattern.contains(')') {
                Err("unclosed group".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn total_comes_from_count_not_page() {
        let storage = FakeStorage::new(&[4, 2, 9], 23);
        let descriptor = build_ranked_query(&SearchTerms::parse("udu"), 3);
        let page = fetch_page(&storage, &descriptor).unwrap();

        assert_eq!(page.ids().collect::<Vec<_>>(), vec![TabletId(4), TabletId(2), TabletId(9)]);
        assert_eq!(page.pagination.total_results, 23);
        assert_eq!(page.pagination.last_page, 3);
        assert_eq!(page.pagination.current_page, 3);
        assert_eq!(storage.count_calls.get(), 1);
    }

    #[test]
    fn count_failure_is_not_zero() {
        let mut storage = FakeStorage::new(&[1], 1);
        storage.fail_count = true;
        let descriptor = build_ranked_query(&SearchTerms::parse("udu"), 1);

        let result = fetch_page(&storage, &descriptor);
        assert!(matches!(result, Err(SearchError::StorageFailure(_))));
    }

    #[test]
    fn invalid_pattern_is_distinct_from_storage_failure() {
        let storage = FakeStorage::new(&[], 0);
        let descriptor = build_pattern_query("lugal-(e", 1);

        let result = fetch_page(&storage, &descriptor);
        assert!(matches!(result, Err(SearchError::InvalidPattern { .. })));
        assert_eq!(storage.count_calls.get(), 0);
    }

    #[test]
    fn zero_matches_is_an_empty_page() {
        let storage = FakeStorage::new(&[], 0);
        let descriptor = build_pattern_query("nothing", 1);
        let page = fetch_page(&storage, &descriptor).unwrap();

        assert!(page.matches.is_empty());
        assert_eq!(page.pagination.last_page, 0);
    }

    #[test]
    fn highlight_tablet_annotates_every_section() {
        let rows = vec![
            DetailRow {
                tablet_name: "P1".to_string(),
                lang: "sux".to_string(),
                object_id: 1,
                object_name: "tablet".to_string(),
                section_id: 1,
                section_name: "obverse".to_string(),
                text: "udu lugal".to_string(),
            },
            DetailRow {
                tablet_name: "P1".to_string(),
                lang: "sux".to_string(),
                object_id: 1,
                object_name: "tablet".to_string(),
                section_id: 2,
                section_name: "reverse".to_string(),
                text: "mu udu".to_string(),
            },
        ];
        let tablet = crate::corpus::reconstruct_rows(TabletId(1), rows).unwrap();
        let marked = highlight_tablet(&tablet, &SearchTerms::parse("udu"), Markup::Html);

        assert_eq!(marked.objects[0].sections[0].lines, vec!["<mark>udu</mark> lugal"]);
        assert_eq!(marked.objects[0].sections[1].lines, vec!["mu <mark>udu</mark>"]);
        assert_eq!(tablet.objects[0].sections[0].lines, vec!["udu lugal"]);
    }
}
