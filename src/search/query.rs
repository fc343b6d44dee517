//! Builds storage query descriptors for ranked and pattern searches.
//!
//! Nothing here touches the database. User input never becomes SQL text:
//! the descriptor carries it as a bound parameter value.

use serde::Serialize;

use crate::search::RESULTS_PER_PAGE;
use crate::search::terms::SearchTerms;

/// Which rows of `text_section` count as a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchFilter {
    /// An FTS5 boolean expression requiring every quoted phrase.
    FullText { expression: String },
    /// A regular expression applied to the whole section text.
    Pattern { pattern: String },
}

/// How matching tablets are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrder {
    /// Highest summed relevance first, ties broken by tablet id.
    Relevance,
    /// Whatever order the storage layer produces.
    Natural,
}

/// One page worth of search, ready for a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryDescriptor {
    pub filter: MatchFilter,
    pub order: ResultOrder,
    /// 1-based page number the offset was derived from.
    pub page: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Request for the number of matching tablets before pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRequest<'a> {
    pub filter: &'a MatchFilter,
}

impl QueryDescriptor {
    fn paged(filter: MatchFilter, order: ResultOrder, page: u64) -> Self {
        Self {
            filter,
            order,
            page,
            offset: page.saturating_sub(1).saturating_mul(RESULTS_PER_PAGE),
            limit: RESULTS_PER_PAGE,
        }
    }

    /// The count-of-all-matches request sharing this descriptor's filter.
    #[must_use]
    pub fn count_request(&self) -> CountRequest<'_> {
        CountRequest {
            filter: &self.filter,
        }
    }
}

/// Ranked full-text search requiring every term as a literal phrase.
///
/// Terms with no letters or digits cannot match an indexed token and are
/// left out; if none remain the expression is empty and matches nothing.
/// `page` is 1-based; validating it is the caller's job.
#[must_use]
pub fn build_ranked_query(terms: &SearchTerms, page: u64) -> QueryDescriptor {
    let expression = terms
        .iter()
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .map(quote_phrase)
        .collect::<Vec<_>>()
        .join(" AND ");
    QueryDescriptor::paged(
        MatchFilter::FullText { expression },
        ResultOrder::Relevance,
        page,
    )
}

/// Unranked regular-expression search over section text.
#[must_use]
pub fn build_pattern_query(pattern: &str, page: u64) -> QueryDescriptor {
    QueryDescriptor::paged(
        MatchFilter::Pattern {
            pattern: pattern.to_string(),
        },
        ResultOrder::Natural,
        page,
    )
}

/// Quote a term as an FTS5 string so its characters are never operators.
fn quote_phrase(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}
