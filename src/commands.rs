//! Command implementations shared by CLI and MCP server.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::corpus::{self, Tablet, TabletId, atf};
use crate::error::SearchError;
use crate::render::render;
use crate::search::{
    self, Markup, Pagination, SearchMode, SearchTerms, build_pattern_query, build_ranked_query,
};
use crate::storage::StorageBackend;
use crate::storage::sqlite::SqliteStorage;

/// Maximum length for a user-provided query string.
pub const MAX_QUERY_LENGTH: usize = 1000;

/// Everything needed to present one page of search results.
#[derive(Debug, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub mode: SearchMode,
    pub terms: SearchTerms,
    pub pagination: Pagination,
    pub documents: Vec<DocumentOutcome>,
}

impl SearchOutcome {
    fn empty(query: &str, mode: SearchMode, terms: SearchTerms, page: u64) -> Self {
        Self {
            query: query.to_string(),
            mode,
            terms,
            pagination: Pagination::compute(page, 0),
            documents: Vec::new(),
        }
    }

    /// Whether the search matched nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pagination.is_empty()
    }

    /// Tablets that failed to assemble on this page.
    pub fn failures(&self) -> impl Iterator<Item = (TabletId, &SearchError)> {
        self.documents.iter().filter_map(|doc| match doc {
            DocumentOutcome::Failed { id, error } => Some((*id, error)),
            DocumentOutcome::Found(_) => None,
        })
    }
}

/// One slot of a result page: a highlighted tablet, or why it is missing.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DocumentOutcome {
    Found(Tablet),
    Failed {
        id: TabletId,
        #[serde(serialize_with = "serialize_display")]
        error: SearchError,
    },
}

fn serialize_display<S: Serializer>(error: &SearchError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// A file imported into the corpus and the ids assigned to its tablets.
#[derive(Debug, Clone)]
pub struct ImportedFile {
    pub path: PathBuf,
    pub tablets: Vec<TabletId>,
}

/// Result of an import run.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub files: Vec<ImportedFile>,
    /// Tablets in the database after the import.
    pub corpus_size: u64,
}

/// Run one search against `storage`: query, count, reconstruct, highlight.
///
/// A whitespace-only query performs no search. A tablet that cannot be
/// reconstructed, for whatever reason, is reported in its slot and the rest
/// of the page still renders.
///
/// # Errors
///
/// Returns `SearchError::InvalidPattern` for a rejected pattern and
/// `SearchError::StorageFailure` when the page or count query fails.
pub fn search_with<S>(
    storage: &S,
    query: &str,
    mode: SearchMode,
    page: u64,
    markup: Markup,
) -> Result<SearchOutcome, SearchError>
where
    S: StorageBackend + ?Sized,
{
    let terms = SearchTerms::parse(query);
    if terms.is_empty() {
        debug!("empty query, no search performed");
        return Ok(SearchOutcome::empty(query, mode, terms, page));
    }

    let descriptor = match mode {
        SearchMode::Ranked => build_ranked_query(&terms, page),
        SearchMode::Pattern => build_pattern_query(query, page),
    };
    let result_page = search::fetch_page(storage, &descriptor)?;
    debug!(
        ?mode,
        page,
        total = result_page.pagination.total_results,
        returned = result_page.matches.len(),
        "search complete"
    );

    let mut documents = Vec::with_capacity(result_page.matches.len());
    for id in result_page.ids() {
        match corpus::reconstruct(storage, id) {
            Ok(tablet) => documents.push(DocumentOutcome::Found(search::highlight_tablet(
                &tablet, &terms, markup,
            ))),
            Err(error) => {
                warn!(tablet = %id, %error, "skipping tablet");
                documents.push(DocumentOutcome::Failed { id, error });
            }
        }
    }

    Ok(SearchOutcome {
        query: query.to_string(),
        mode,
        terms,
        pagination: result_page.pagination,
        documents,
    })
}

/// Search the configured corpus database.
///
/// # Errors
///
/// Returns an error if the query is too long, the page is zero or past
/// the allowed maximum, the database is missing, or the search itself fails.
pub fn search(
    config: &Config,
    query: &str,
    mode: SearchMode,
    page: u64,
    markup: Markup,
) -> anyhow::Result<SearchOutcome> {
    if query.len() > MAX_QUERY_LENGTH {
        anyhow::bail!(
            "Query too long: {} chars (max {MAX_QUERY_LENGTH})",
            query.len()
        );
    }
    if page == 0 {
        anyhow::bail!("Page numbers start at 1");
    }
    if page > search::MAX_PAGE {
        anyhow::bail!("Page {page} is past the last allowed page ({})", search::MAX_PAGE);
    }

    let storage = open_existing(config)?;
    Ok(search_with(&storage, query, mode, page, markup)?)
}

/// Search and render the result page in `format`, highlighting with the
/// markup that format displays.
///
/// # Errors
///
/// Returns an error if [`search`] fails or the page cannot be rendered.
pub fn search_report(
    config: &Config,
    query: &str,
    mode: SearchMode,
    page: u64,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let outcome = search(config, query, mode, page, format.markup())?;
    render(&outcome, format)
}

/// Reconstruct a single tablet without highlighting.
///
/// With a `markup` the lines are escaped for it; without one they are
/// returned as stored.
///
/// # Errors
///
/// Returns an error if the database is missing or the tablet has no rows.
pub fn show(config: &Config, id: i64, markup: Option<Markup>) -> anyhow::Result<Tablet> {
    let storage = open_existing(config)?;
    let tablet = corpus::reconstruct(&storage, TabletId(id))?;
    Ok(match markup {
        Some(markup) => search::highlight_tablet(&tablet, &SearchTerms::default(), markup),
        None => tablet,
    })
}

/// Create the database and its schema at the configured path.
///
/// # Errors
///
/// Returns an error if the database cannot be created.
pub fn init(config: &Config) -> anyhow::Result<PathBuf> {
    let path = config.database_path();
    SqliteStorage::open(&path, config.storage_options())?;
    debug!(path = %path.display(), "database initialised");
    Ok(path)
}

/// Parse ATF files and insert their tablets, one transaction per file.
///
/// # Errors
///
/// Returns an error on the first file that cannot be read, parsed or
/// stored. Files before it stay imported.
pub fn import(config: &Config, files: &[PathBuf]) -> anyhow::Result<ImportSummary> {
    let mut storage = SqliteStorage::open(&config.database_path(), config.storage_options())?;
    let files = files
        .iter()
        .map(|path| import_file(&mut storage, path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(ImportSummary {
        files,
        corpus_size: storage.tablet_count()?,
    })
}

fn import_file(storage: &mut SqliteStorage, path: &Path) -> anyhow::Result<ImportedFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let tablets =
        atf::parse(&contents).with_context(|| format!("Failed to parse {}", path.display()))?;
    if tablets.is_empty() {
        warn!(path = %path.display(), "no tablets found");
    }
    let ids = storage
        .import(&tablets)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    debug!(path = %path.display(), count = ids.len(), "imported");
    Ok(ImportedFile {
        path: path.to_path_buf(),
        tablets: ids,
    })
}

fn open_existing(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = config.database_path();
    if !path.exists() {
        anyhow::bail!(
            "No database found at {}. Run `tablets init` first.",
            path.display()
        );
    }
    Ok(SqliteStorage::open(&path, config.storage_options())?)
}
