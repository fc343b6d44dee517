//! Reassembles the flat tablet/object/section/line join into a tablet tree.
//!
//! The rows for one tablet arrive with every object's rows contiguous and,
//! inside an object, every section's rows contiguous. A single left-to-right
//! pass detects the object and section boundaries and closes the open
//! accumulators as it crosses them. Rows are never re-sorted: an object or
//! section that reappears after being closed is reported as an error.

use std::collections::HashSet;

use crate::corpus::{DetailRow, Tablet, TabletId, TabletObject, TextSection};
use crate::error::SearchError;
use crate::storage::StorageBackend;

/// Fetch the detail rows for `id` and fold them into a [`Tablet`].
///
/// # Errors
///
/// Returns `SearchError::StorageFailure` if the row fetch fails,
/// `SearchError::EmptyDocument` if the tablet has no rows, and
/// `SearchError::UngroupedRows` if the rows break the grouping order.
pub fn reconstruct<S>(storage: &S, id: TabletId) -> Result<Tablet, SearchError>
where
    S: StorageBackend + ?Sized,
{
    let rows = storage.fetch_rows(id)?;
    reconstruct_rows(id, rows)
}

/// Fold an ordered row stream into a [`Tablet`].
///
/// Pure: the same rows always produce the same tree.
///
/// # Errors
///
/// Returns `SearchError::EmptyDocument` for an empty stream and
/// `SearchError::UngroupedRows` if an object or section is split.
pub fn reconstruct_rows<I>(id: TabletId, rows: I) -> Result<Tablet, SearchError>
where
    I: IntoIterator<Item = DetailRow>,
{
    rows.into_iter()
        .try_fold(Fold::new(id), Fold::push)?
        .finish()
}

/// Where the scan currently is.
enum State {
    NoObject,
    InSection {
        object: TabletObject,
        section: TextSection,
    },
}

/// Accumulator threaded through the scan.
struct Fold {
    id: TabletId,
    header: Option<(String, String)>,
    objects: Vec<TabletObject>,
    state: State,
    closed_objects: HashSet<i64>,
    closed_sections: HashSet<(i64, i64)>,
}

impl Fold {
    fn new(id: TabletId) -> Self {
        Self {
            id,
            header: None,
            objects: Vec::new(),
            state: State::NoObject,
            closed_objects: HashSet::new(),
            closed_sections: HashSet::new(),
        }
    }

    fn push(mut self, row: DetailRow) -> Result<Self, SearchError> {
        if self.header.is_none() {
            self.header = Some((row.tablet_name.clone(), row.lang.clone()));
        }

        let state = std::mem::replace(&mut self.state, State::NoObject);
        self.state = match state {
            State::NoObject => self.open_object(&row)?,
            State::InSection {
                mut object,
                section,
            } => {
                if row.object_id != object.id {
                    self.close_section(&mut object, section);
                    self.close_object(object);
                    self.open_object(&row)?
                } else if row.section_id != section.id {
                    self.close_section(&mut object, section);
                    let section = self.open_section(object.id, &row)?;
                    State::InSection { object, section }
                } else {
                    State::InSection { object, section }
                }
            }
        };

        if let State::InSection { section, .. } = &mut self.state {
            section.lines.push(row.text);
        }
        Ok(self)
    }

    fn finish(mut self) -> Result<Tablet, SearchError> {
        match std::mem::replace(&mut self.state, State::NoObject) {
            State::NoObject => return Err(SearchError::EmptyDocument { id: self.id }),
            State::InSection {
                mut object,
                section,
            } => {
                self.close_section(&mut object, section);
                self.close_object(object);
            }
        }

        let (name, lang) = self.header.unwrap_or_default();
        Ok(Tablet {
            id: self.id,
            name,
            lang,
            objects: self.objects,
        })
    }

    fn open_object(&self, row: &DetailRow) -> Result<State, SearchError> {
        if self.closed_objects.contains(&row.object_id) {
            return Err(self.ungrouped(format!("object {} appears twice", row.object_id)));
        }
        let object = TabletObject {
            id: row.object_id,
            name: row.object_name.clone(),
            sections: Vec::new(),
        };
        let section = self.open_section(object.id, row)?;
        Ok(State::InSection { object, section })
    }

    fn open_section(&self, object_id: i64, row: &DetailRow) -> Result<TextSection, SearchError> {
        if self.closed_sections.contains(&(object_id, row.section_id)) {
            return Err(self.ungrouped(format!(
                "section {} of object {object_id} appears twice",
                row.section_id
            )));
        }
        Ok(TextSection {
            id: row.section_id,
            name: row.section_name.clone(),
            lines: Vec::new(),
        })
    }

    fn close_section(&mut self, object: &mut TabletObject, section: TextSection) {
        self.closed_sections.insert((object.id, section.id));
        object.sections.push(section);
    }

    fn close_object(&mut self, object: TabletObject) {
        self.closed_objects.insert(object.id);
        self.objects.push(object);
    }

    fn ungrouped(&self, reason: String) -> SearchError {
        SearchError::UngroupedRows {
            id: self.id,
            reason,
        }
    }
}
