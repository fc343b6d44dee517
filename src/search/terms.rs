//! Splits a raw query into search terms.

use serde::Serialize;

/// The unique, whitespace-delimited terms of a query, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SearchTerms(Vec<String>);

impl SearchTerms {
    /// Tokenize a raw query string.
    ///
    /// An empty or all-whitespace query yields no terms.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let mut terms: Vec<String> = Vec::new();
        for token in query.split_whitespace() {
            if !terms.iter().any(|t| t == token) {
                terms.push(token.to_string());
            }
        }
        Self(terms)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Exact, case-sensitive membership.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a SearchTerms {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
