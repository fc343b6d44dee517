//! tablets - search a corpus of cuneiform tablet transliterations.
//!
//! Tablets are stored in SQLite as tablet, object, section and line rows.
//! A search runs either ranked full-text matching over section text or a
//! regular-expression pattern match, pages the matching tablets, rebuilds
//! each tablet's hierarchy and highlights the query terms in it.
//!
//! # Modules
//!
//! - [`commands`] - High-level operations (search, show, import, init)
//! - [`corpus`] - Tablet model, hierarchy reconstruction, ATF parsing
//! - [`search`] - Terms, query building, pagination, highlighting
//! - [`storage`] - Storage backend trait and the SQLite implementation
//! - [`render`] - Text, JSON and HTML output
//! - [`error`] - Search pipeline errors
//! - [`config`] - Configuration loading
//! - [`cli`] - Command-line interface definitions

pub mod cli;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod error;
pub mod render;
pub mod search;
pub mod storage;

#[cfg(feature = "mcp")]
pub mod mcp;
