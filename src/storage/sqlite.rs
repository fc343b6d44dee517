//! SQLite storage backend.
//!
//! Tablets are stored in four normalized tables (`tablet`, `tablet_object`,
//! `text_section`, `line`). Each section's joined text is also indexed in
//! the FTS5 table `section_fts`, keyed by `text_section_id`, for ranked
//! search; pattern search goes through a `REGEXP` function backed by the
//! `regex` crate.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, params};

use crate::corpus::atf::{AtfTablet, section_type_id};
use crate::corpus::{DetailRow, TabletId, TextSection};
use crate::search::ScoredMatch;
use crate::search::query::{CountRequest, MatchFilter, QueryDescriptor};
use crate::storage::{StorageBackend, StorageError};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS tablet (
        tablet_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        lang TEXT NOT NULL DEFAULT 'sux'
    );
    CREATE TABLE IF NOT EXISTS tablet_object (
        tablet_object_id INTEGER PRIMARY KEY,
        tablet_id INTEGER NOT NULL REFERENCES tablet(tablet_id) ON DELETE CASCADE,
        obj_name TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS tablet_object_by_tablet ON tablet_object(tablet_id);
    CREATE TABLE IF NOT EXISTS text_section (
        text_section_id INTEGER PRIMARY KEY,
        tablet_object_id INTEGER NOT NULL
            REFERENCES tablet_object(tablet_object_id) ON DELETE CASCADE,
        text_section_type_id INTEGER,
        text_section_name TEXT NOT NULL,
        section_text TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS text_section_by_object ON text_section(tablet_object_id);
    CREATE TABLE IF NOT EXISTS line (
        line_id INTEGER PRIMARY KEY,
        text_section_id INTEGER NOT NULL
            REFERENCES text_section(text_section_id) ON DELETE CASCADE,
        text TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS line_by_section ON line(text_section_id);
    CREATE VIRTUAL TABLE IF NOT EXISTS section_fts USING fts5(
        section_text,
        tokenize = 'unicode61 remove_diacritics 0'
    );
";

const RANKED_PAGE_SQL: &str = "
    WITH hits AS MATERIALIZED (
        SELECT rowid AS text_section_id, -bm25(section_fts) AS score
        FROM section_fts
        WHERE section_fts MATCH ?1
    )
    SELECT o.tablet_id, SUM(h.score) AS score
    FROM hits h
    JOIN text_section ts ON ts.text_section_id = h.text_section_id
    JOIN tablet_object o ON o.tablet_object_id = ts.tablet_object_id
    GROUP BY o.tablet_id
    ORDER BY score DESC, o.tablet_id ASC
    LIMIT ?2 OFFSET ?3
";

const RANKED_COUNT_SQL: &str = "
    WITH hits AS MATERIALIZED (
        SELECT rowid AS text_section_id
        FROM section_fts
        WHERE section_fts MATCH ?1
    )
    SELECT COUNT(DISTINCT o.tablet_id)
    FROM hits h
    JOIN text_section ts ON ts.text_section_id = h.text_section_id
    JOIN tablet_object o ON o.tablet_object_id = ts.tablet_object_id
";

const PATTERN_PAGE_SQL: &str = "
    SELECT o.tablet_id
    FROM text_section ts
    JOIN tablet_object o ON o.tablet_object_id = ts.tablet_object_id
    WHERE ts.section_text REGEXP ?1
    GROUP BY o.tablet_id
    LIMIT ?2 OFFSET ?3
";

const PATTERN_COUNT_SQL: &str = "
    SELECT COUNT(DISTINCT o.tablet_id)
    FROM text_section ts
    JOIN tablet_object o ON o.tablet_object_id = ts.tablet_object_id
    WHERE ts.section_text REGEXP ?1
";

const DETAIL_ROWS_SQL: &str = "
    SELECT t.name, t.lang, o.tablet_object_id, o.obj_name,
           ts.text_section_id, ts.text_section_name, l.text
    FROM tablet t
    JOIN tablet_object o ON o.tablet_id = t.tablet_id
    JOIN text_section ts ON ts.tablet_object_id = o.tablet_object_id
    JOIN line l ON l.text_section_id = ts.text_section_id
    WHERE t.tablet_id = ?1
    ORDER BY o.tablet_object_id, ts.text_section_id, l.line_id
";

/// Options for the SQLite backend.
#[derive(Debug, Clone, Copy)]
pub struct SqliteOptions {
    /// Whether `REGEXP` ignores case.
    pub pattern_case_insensitive: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            pattern_case_insensitive: true,
        }
    }
}

/// Storage backend over a single SQLite database.
pub struct SqliteStorage {
    conn: Connection,
    options: SqliteOptions,
}

impl SqliteStorage {
    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Open` if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: &Path, options: SqliteOptions) -> Result<Self, StorageError> {
        let open_error = |reason: String| StorageError::Open {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| open_error(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| open_error(e.to_string()))?;
        Self::from_connection(conn, options).map_err(|e| open_error(e.to_string()))
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the schema cannot be created.
    pub fn open_in_memory(options: SqliteOptions) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, options)
    }

    fn from_connection(conn: Connection, options: SqliteOptions) -> Result<Self, StorageError> {
        register_regexp(&conn, options.pattern_case_insensitive)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, options })
    }

    /// Insert parsed tablets in a single transaction.
    ///
    /// Returns the ids assigned to the tablets, in input order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::WriteError` if any insert fails; nothing is
    /// written in that case.
    pub fn import(&mut self, tablets: &[AtfTablet]) -> Result<Vec<TabletId>, StorageError> {
        let tx = self.conn.transaction().map_err(write_error)?;
        let mut ids = Vec::with_capacity(tablets.len());

        for tablet in tablets {
            tx.prepare_cached("INSERT INTO tablet (name, lang) VALUES (?1, ?2)")
                .and_then(|mut stmt| stmt.execute(params![tablet.name, tablet.lang_or_default()]))
                .map_err(write_error)?;
            let tablet_id = tx.last_insert_rowid();

            for object in &tablet.objects {
                tx.prepare_cached("INSERT INTO tablet_object (tablet_id, obj_name) VALUES (?1, ?2)")
                    .and_then(|mut stmt| stmt.execute(params![tablet_id, object.name]))
                    .map_err(write_error)?;
                let object_id = tx.last_insert_rowid();

                for section in &object.sections {
                    let text = TextSection::indexed_text(&section.lines);
                    tx.prepare_cached(
                        "INSERT INTO text_section
                             (tablet_object_id, text_section_type_id, text_section_name, section_text)
                         VALUES (?1, ?2, ?3, ?4)",
                    )
                    .and_then(|mut stmt| {
                        stmt.execute(params![
                            object_id,
                            section_type_id(&section.name),
                            section.name,
                            text
                        ])
                    })
                    .map_err(write_error)?;
                    let section_id = tx.last_insert_rowid();

                    tx.prepare_cached("INSERT INTO section_fts (rowid, section_text) VALUES (?1, ?2)")
                        .and_then(|mut stmt| stmt.execute(params![section_id, text]))
                        .map_err(write_error)?;

                    let mut insert_line = tx
                        .prepare_cached("INSERT INTO line (text_section_id, text) VALUES (?1, ?2)")
                        .map_err(write_error)?;
                    for line in &section.lines {
                        insert_line
                            .execute(params![section_id, line])
                            .map_err(write_error)?;
                    }
                }
            }
            ids.push(TabletId(tablet_id));
        }

        tx.commit().map_err(write_error)?;
        Ok(ids)
    }

    /// Number of tablets stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the count query fails.
    pub fn tablet_count(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tablet", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

impl StorageBackend for SqliteStorage {
    fn fetch_matches(&self, descriptor: &QueryDescriptor) -> Result<Vec<ScoredMatch>, StorageError> {
        let limit = to_sql_int(descriptor.limit);
        let offset = to_sql_int(descriptor.offset);

        match &descriptor.filter {
            MatchFilter::FullText { expression } => {
                if expression.is_empty() {
                    return Ok(Vec::new());
                }
                let mut stmt = self.conn.prepare_cached(RANKED_PAGE_SQL)?;
                let rows = stmt.query_map(params![expression, limit, offset], |row| {
                    Ok(ScoredMatch {
                        id: TabletId(row.get(0)?),
                        score: Some(row.get(1)?),
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
            MatchFilter::Pattern { pattern } => {
                let mut stmt = self.conn.prepare_cached(PATTERN_PAGE_SQL)?;
                let rows = stmt.query_map(params![pattern, limit, offset], |row| {
                    Ok(ScoredMatch {
                        id: TabletId(row.get(0)?),
                        score: None,
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
        }
    }

    fn count_matches(&self, request: CountRequest<'_>) -> Result<u64, StorageError> {
        let count: i64 = match request.filter {
            MatchFilter::FullText { expression } => {
                if expression.is_empty() {
                    return Ok(0);
                }
                self.conn
                    .query_row(RANKED_COUNT_SQL, params![expression], |row| row.get(0))?
            }
            MatchFilter::Pattern { pattern } => {
                self.conn
                    .query_row(PATTERN_COUNT_SQL, params![pattern], |row| row.get(0))?
            }
        };
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn fetch_rows(&self, id: TabletId) -> Result<Vec<DetailRow>, StorageError> {
        let mut stmt = self.conn.prepare_cached(DETAIL_ROWS_SQL)?;
        let rows = stmt.query_map(params![id.0], |row| {
            Ok(DetailRow {
                tablet_name: row.get(0)?,
                lang: row.get(1)?,
                object_id: row.get(2)?,
                object_name: row.get(3)?,
                section_id: row.get(4)?,
                section_name: row.get(5)?,
                text: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn check_pattern(&self, pattern: &str) -> Result<(), String> {
        compile_pattern(pattern, self.options.pattern_case_insensitive)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

fn compile_pattern(pattern: &str, case_insensitive: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
}

/// Install `regexp(pattern, text)`, which SQLite calls for `text REGEXP pattern`.
///
/// The compiled pattern is cached per statement as auxiliary data.
fn register_regexp(conn: &Connection, case_insensitive: bool) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        move |ctx| {
            let regex: Arc<Regex> = ctx.get_or_create_aux(0, |value| -> Result<Regex, BoxError> {
                Ok(compile_pattern(value.as_str()?, case_insensitive)?)
            })?;
            let text: Option<String> = ctx.get(1)?;
            Ok(text.is_some_and(|t| regex.is_match(&t)))
        },
    )
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn write_error(e: rusqlite::Error) -> StorageError {
    StorageError::WriteError(e.to_string())
}
