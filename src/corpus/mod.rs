//! Tablet document model: tablets, their objects, sections and lines.

pub mod atf;
pub mod hierarchy;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use hierarchy::{reconstruct, reconstruct_rows};

/// Stable identifier of a tablet in the corpus database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabletId(pub i64);

impl fmt::Display for TabletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the tablet/object/section/line join, in storage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub tablet_name: String,
    pub lang: String,
    pub object_id: i64,
    pub object_name: String,
    pub section_id: i64,
    pub section_name: String,
    pub text: String,
}

/// A reconstructed tablet.
///
/// Built once from a row stream and never mutated afterwards; annotated
/// copies are produced with [`Tablet::map_sections`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tablet {
    pub id: TabletId,
    pub name: String,
    pub lang: String,
    pub objects: Vec<TabletObject>,
}

/// A named subdivision of a tablet (e.g. the tablet itself, an envelope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabletObject {
    pub id: i64,
    pub name: String,
    pub sections: Vec<TextSection>,
}

/// A named subdivision of an object holding lines in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSection {
    pub id: i64,
    pub name: String,
    pub lines: Vec<String>,
}

impl Tablet {
    /// CDLI catalogue number, the first word of the tablet name (`P123456`).
    #[must_use]
    pub fn cdli_number(&self) -> Option<&str> {
        self.name
            .split_whitespace()
            .next()
            .filter(|word| word.len() > 1 && word.starts_with(['P', 'Q', 'X']))
    }

    /// Total number of lines across all objects and sections.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.sections().map(|s| s.lines.len()).sum()
    }

    /// Iterate every section in reading order.
    pub fn sections(&self) -> impl Iterator<Item = &TextSection> {
        self.objects.iter().flat_map(|o| o.sections.iter())
    }

    /// Build a copy of this tablet whose section lines are replaced by `f`.
    #[must_use]
    pub fn map_sections<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&TextSection) -> Vec<String>,
    {
        Self {
            id: self.id,
            name: self.name.clone(),
            lang: self.lang.clone(),
            objects: self
                .objects
                .iter()
                .map(|object| TabletObject {
                    id: object.id,
                    name: object.name.clone(),
                    sections: object
                        .sections
                        .iter()
                        .map(|section| TextSection {
                            id: section.id,
                            name: section.name.clone(),
                            lines: f(section),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl TextSection {
    /// Lines joined the way they are indexed for full-text search.
    #[must_use]
    pub fn indexed_text(lines: &[String]) -> String {
        let mut text = String::new();
        for line in lines {
            text.push_str(line);
            text.push(' ');
        }
        text
    }
}
