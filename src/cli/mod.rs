//! CLI interface for tablets.
//!
//! Provides command-line argument parsing using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::search::{MAX_PAGE, Markup, SearchMode};

/// Output format for search results and tablets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented plain text with numbered lines (default).
    #[default]
    Text,
    /// The tablet render model as JSON.
    Json,
    /// Nested HTML panels with `<mark>` highlights.
    Html,
}

impl OutputFormat {
    /// Highlight markup matching this format.
    #[must_use]
    pub fn markup(self) -> Markup {
        match self {
            Self::Text => Markup::Ansi,
            Self::Json | Self::Html => Markup::Html,
        }
    }
}

/// Command-line interface for tablets.
#[derive(Parser)]
#[command(name = "tablets")]
#[command(author, version, about = "Search a corpus of cuneiform tablet transliterations", long_about = None)]
pub struct Cli {
    /// Database file to use instead of the configured one.
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Search tablets for a query.
    Search {
        /// Space-separated terms, or a regular expression with --regex.
        query: String,

        /// Treat the query as a regular expression over section text.
        #[arg(short, long)]
        regex: bool,

        /// Result page to show, starting at 1.
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=MAX_PAGE))]
        page: u64,

        /// Output format.
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show every object, section and line of one tablet.
    Show {
        /// Numeric tablet id as printed by search.
        id: i64,

        /// Output format.
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Import tablets from ATF transliteration files.
    Import {
        /// ATF files to import.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Create the database schema at the configured path.
    Init,

    /// Start the MCP server for AI editor integration.
    #[cfg(feature = "mcp")]
    Serve,
}

/// Search mode selected by the `--regex` flag.
#[must_use]
pub fn search_mode(regex: bool) -> SearchMode {
    if regex {
        SearchMode::Pattern
    } else {
        SearchMode::Ranked
    }
}
