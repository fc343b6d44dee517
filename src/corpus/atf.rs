//! Parser for ATF transliteration files, used to import tablets.
//!
//! Only the structural subset needed for search is understood:
//!
//! - `&P123456 = name` starts a tablet
//! - `#atf: lang sux` sets the tablet language
//! - `@tablet`, `@envelope`, ... start an object
//! - any other `@` line starts a section (`@obverse`, `@reverse`, `@seal 1`)
//! - numbered lines (`1. text`, `2'. text`) are transliteration lines
//!
//! Other `#` comments and `$` state lines are skipped.

use thiserror::Error;

/// Language stored for tablets that do not declare one.
pub const DEFAULT_LANG: &str = "sux";

/// Directive names that open a new object rather than a section.
const OBJECT_DIRECTIVES: &[&str] = &["tablet", "envelope", "bulla", "object", "prism", "fragment"];

/// Object opened for content that appears before any object directive.
const IMPLICIT_OBJECT: &str = "tablet";

/// Section opened for lines that appear before any section directive.
const IMPLICIT_SECTION: &str = "obverse";

/// Errors that can occur when parsing an ATF file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AtfError {
    #[error("line {line}: content before the first '&' tablet header")]
    ContentBeforeTablet { line: usize },

    #[error("line {line}: tablet header has no name")]
    EmptyTabletName { line: usize },

    #[error("line {line}: unrecognised line '{text}'")]
    Unrecognised { line: usize, text: String },
}

/// A tablet parsed from ATF, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtfTablet {
    pub name: String,
    pub lang: Option<String>,
    pub objects: Vec<AtfObject>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtfObject {
    pub name: String,
    pub sections: Vec<AtfSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtfSection {
    pub name: String,
    pub lines: Vec<String>,
}

impl AtfTablet {
    /// Language to store, falling back to [`DEFAULT_LANG`].
    #[must_use]
    pub fn lang_or_default(&self) -> &str {
        self.lang.as_deref().unwrap_or(DEFAULT_LANG)
    }

    fn current_object(&mut self) -> &mut AtfObject {
        if self.objects.is_empty() {
            self.objects.push(AtfObject {
                name: IMPLICIT_OBJECT.to_string(),
                sections: Vec::new(),
            });
        }
        let last = self.objects.len() - 1;
        &mut self.objects[last]
    }

    fn current_section(&mut self) -> &mut AtfSection {
        let object = self.current_object();
        if object.sections.is_empty() {
            object.sections.push(AtfSection {
                name: IMPLICIT_SECTION.to_string(),
                lines: Vec::new(),
            });
        }
        let last = object.sections.len() - 1;
        &mut object.sections[last]
    }

    /// Drop sections without lines and objects without sections.
    fn prune(&mut self) {
        for object in &mut self.objects {
            object.sections.retain(|s| !s.lines.is_empty());
        }
        self.objects.retain(|o| !o.sections.is_empty());
    }
}

/// Database section type for a section name, if it is a known surface.
#[must_use]
pub fn section_type_id(name: &str) -> Option<i64> {
    let name = name.trim().trim_start_matches('@');
    if name.starts_with("seal") {
        return Some(9);
    }
    match name {
        "bottom" => Some(1),
        "bulla" => Some(2),
        "edge" => Some(3),
        "envelope" => Some(4),
        "left" => Some(5),
        "object" => Some(6),
        "obverse" => Some(7),
        "reverse" => Some(8),
        "tablet" => Some(10),
        "top" => Some(11),
        _ => None,
    }
}

/// Parse every tablet in an ATF document.
///
/// Tablets that end up with no lines are dropped.
///
/// # Errors
///
/// Returns `AtfError` for content before the first tablet header, for a
/// header without a name, and for lines that are none of the forms above.
pub fn parse(input: &str) -> Result<Vec<AtfTablet>, AtfError> {
    let mut tablets: Vec<AtfTablet> = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('&') {
            let name = header.trim();
            if name.is_empty() {
                return Err(AtfError::EmptyTabletName { line: line_no });
            }
            tablets.push(AtfTablet {
                name: name.to_string(),
                lang: None,
                objects: Vec::new(),
            });
            continue;
        }

        let Some(tablet) = tablets.last_mut() else {
            if line.starts_with('#') {
                continue;
            }
            return Err(AtfError::ContentBeforeTablet { line: line_no });
        };

        if let Some(comment) = line.strip_prefix('#') {
            if let Some(lang) = comment.trim().strip_prefix("atf:").map(str::trim)
                && let Some(code) = lang.strip_prefix("lang")
            {
                let code = code.trim();
                if !code.is_empty() {
                    tablet.lang = Some(code.to_string());
                }
            }
            continue;
        }

        if line.starts_with('$') {
            continue;
        }

        if let Some(directive) = line.strip_prefix('@') {
            let name = directive.trim().to_string();
            let keyword = name.split_whitespace().next().unwrap_or_default();
            if OBJECT_DIRECTIVES.contains(&keyword) {
                tablet.objects.push(AtfObject {
                    name,
                    sections: Vec::new(),
                });
            } else {
                tablet.current_object().sections.push(AtfSection {
                    name,
                    lines: Vec::new(),
                });
            }
            continue;
        }

        match strip_line_number(line) {
            Some(text) if !text.is_empty() => {
                tablet.current_section().lines.push(text.to_string());
            }
            Some(_) => {}
            None => {
                return Err(AtfError::Unrecognised {
                    line: line_no,
                    text: line.to_string(),
                });
            }
        }
    }

    for tablet in &mut tablets {
        tablet.prune();
    }
    tablets.retain(|t| !t.objects.is_empty());
    Ok(tablets)
}

/// Strip a leading line number (`12.`, `3'.`, `a+1.`) and return the text.
fn strip_line_number(line: &str) -> Option<&str> {
    let (label, text) = line.split_once(". ").or_else(|| {
        line.strip_suffix('.').map(|label| (label, ""))
    })?;
    let is_label = !label.is_empty()
        && label.chars().any(|c| c.is_ascii_digit())
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '\'' | '+' | '-'));
    is_label.then(|| text.trim())
}
