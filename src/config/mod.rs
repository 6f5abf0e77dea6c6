//! Application configuration management

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory with extra YAML indexer definitions
    pub definitions_path: Option<PathBuf>,

    /// Log output format
    pub log_format: LogFormat,

    /// Maximum concurrent searches per indexer
    pub max_concurrent_searches: usize,

    /// Per-indexer search timeout
    pub search_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup function
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let log_format = match var("INDEXARR_LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("Invalid INDEXARR_LOG_FORMAT: {}", other),
        };

        Ok(Self {
            definitions_path: var("INDEXARR_DEFINITIONS_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),

            log_format,

            max_concurrent_searches: var("INDEXARR_MAX_CONCURRENT_SEARCHES")
                .unwrap_or_else(|| "2".to_string())
                .parse()
                .context("Invalid INDEXARR_MAX_CONCURRENT_SEARCHES")?,

            search_timeout: Duration::from_secs(
                var("INDEXARR_SEARCH_TIMEOUT_SECS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse()
                    .context("Invalid INDEXARR_SEARCH_TIMEOUT_SECS")?,
            ),
        })
    }
}
