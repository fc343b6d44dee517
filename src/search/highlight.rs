//! Marks search terms in section lines for display.

use std::borrow::Cow;

use crate::corpus::TextSection;
use crate::search::terms::SearchTerms;

/// Output markup a highlighted line is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Markup {
    /// HTML-escaped text with `<mark>` elements.
    #[default]
    Html,
    /// Terminal text with ANSI reverse-video highlights.
    Ansi,
}

impl Markup {
    /// Escape raw text so it is inert in this markup.
    #[must_use]
    pub fn escape(self, text: &str) -> Cow<'_, str> {
        match self {
            Self::Html => escape_html(text),
            Self::Ansi => {
                let is_unsafe = |c: &char| c.is_control() && !c.is_whitespace();
                if text.chars().any(|c| is_unsafe(&c)) {
                    Cow::Owned(text.chars().filter(|c| !is_unsafe(c)).collect())
                } else {
                    Cow::Borrowed(text)
                }
            }
        }
    }

    fn open(self) -> &'static str {
        match self {
            Self::Html => "<mark>",
            Self::Ansi => "\x1b[7m",
        }
    }

    fn close(self) -> &'static str {
        match self {
            Self::Html => "</mark>",
            Self::Ansi => "\x1b[0m",
        }
    }
}

/// Escape text for HTML element content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Annotate every line of `section`, in order.
///
/// Each line is escaped first, then split on whitespace; tokens exactly
/// equal to a (likewise escaped) term are wrapped in highlight markers and
/// the tokens are rejoined with single spaces. Matching is case-sensitive
/// and whole-token: `king` does not mark `kingdom`.
#[must_use]
pub fn annotate(section: &TextSection, terms: &SearchTerms, markup: Markup) -> Vec<String> {
    let escaped_terms: Vec<Cow<'_, str>> = terms.iter().map(|t| markup.escape(t)).collect();
    section
        .lines
        .iter()
        .map(|line| annotate_line(line, &escaped_terms, markup))
        .collect()
}

fn annotate_line(line: &str, escaped_terms: &[Cow<'_, str>], markup: Markup) -> String {
    let escaped = markup.escape(line);
    escaped
        .split_whitespace()
        .map(|token| {
            if escaped_terms.iter().any(|t| t.as_ref() == token) {
                format!("{}{token}{}", markup.open(), markup.close())
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(lines: &[&str]) -> TextSection {
        TextSection {
            id: 1,
            name: "obverse".to_string(),
            lines: lines.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn marks_exact_tokens_only() {
        let out = annotate(
            &section(&["the king of kings"]),
            &SearchTerms::parse("king"),
            Markup::Html,
        );
        assert_eq!(out, vec!["the <mark>king</mark> of kings"]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let out = annotate(&section(&["King king"]), &SearchTerms::parse("king"), Markup::Html);
        assert_eq!(out, vec!["King <mark>king</mark>"]);
    }

    #[test]
    fn escapes_before_marking() {
        let out = annotate(
            &section(&["<b> & a<b"]),
            &SearchTerms::parse("a<b"),
            Markup::Html,
        );
        assert_eq!(out, vec!["&lt;b&gt; &amp; <mark>a&lt;b</mark>"]);
    }

    #[test]
    fn collapses_whitespace_and_keeps_line_order() {
        let out = annotate(
            &section(&["1(disz)   udu", "lugal  e", "udu"]),
            &SearchTerms::parse("udu"),
            Markup::Html,
        );
        assert_eq!(
            out,
            vec!["1(disz) <mark>udu</mark>", "lugal e", "<mark>udu</mark>"]
        );
    }

    #[test]
    fn no_terms_only_escapes() {
        let out = annotate(&section(&["a > b"]), &SearchTerms::default(), Markup::Html);
        assert_eq!(out, vec!["a &gt; b"]);
    }

    #[test]
    fn ansi_markers() {
        let out = annotate(&section(&["lugal e"]), &SearchTerms::parse("lugal"), Markup::Ansi);
        assert_eq!(out, vec!["\x1b[7mlugal\x1b[0m e"]);
    }

    #[test]
    fn section_is_not_mutated() {
        let s = section(&["udu"]);
        let _ = annotate(&s, &SearchTerms::parse("udu"), Markup::Html);
        assert_eq!(s.lines, vec!["udu"]);
    }
}
