//! Configuration loading for tablets.

use std::path::PathBuf;

use anyhow::Context;
use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;

use crate::storage::sqlite::SqliteOptions;

/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV: &str = "TABLETS_CONFIG";

/// Top-level configuration loaded from config.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Location of the corpus database.
#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Search behaviour.
#[derive(Debug, Deserialize)]
pub struct SearchConfig {
    /// Whether pattern searches ignore case.
    #[serde(default = "default_true")]
    pub pattern_case_insensitive: bool,
}

fn default_database_path() -> String {
    ProjectDirs::from("", "", "tablets").map_or_else(
        || "./tablets.db".to_string(),
        |dirs| dirs.data_dir().join("corpus.db").display().to_string(),
    )
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pattern_case_insensitive: true,
        }
    }
}

impl Config {
    /// Load config from `$TABLETS_CONFIG` or the platform config dir, or
    /// return defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if let Some(path) = config_path
            && path.exists()
        {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config {}", path.display()))?;
            return Ok(config);
        }

        Ok(Config::default())
    }

    /// Path of the config file that [`Config::load`] reads.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("", "", "tablets").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Database path with `~` expanded.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        expand_tilde(&self.database.path)
    }

    #[must_use]
    pub fn storage_options(&self) -> SqliteOptions {
        SqliteOptions {
            pattern_case_insensitive: self.search.pattern_case_insensitive,
        }
    }
}

/// Expand ~ to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(base_dirs) = BaseDirs::new()
    {
        return base_dirs.home_dir().join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            "[database]\npath = \"/tmp/corpus.db\"\n\n[search]\npattern_case_insensitive = false\n",
        )
        .unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/corpus.db"));
        assert!(!config.storage_options().pattern_case_insensitive);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.search.pattern_case_insensitive);
        assert!(config.database.path.ends_with(".db"));
    }

    #[test]
    fn expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("/var/db"), PathBuf::from("/var/db"));
        assert_eq!(expand_tilde("rel/db"), PathBuf::from("rel/db"));
    }
}
