//! Lookup configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::http::{FetchPolicy, DEFAULT_USER_AGENTS};

/// Default web search endpoint (DuckDuckGo instant answers).
pub const DEFAULT_SEARCH_URL: &str = "https://api.duckduckgo.com/";

/// Default encyclopedia host.
pub const DEFAULT_WIKI_BASE_URL: &str = "https://en.wikipedia.org";

pub const DEFAULT_MAX_WORKERS: usize = 6;
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_SEARCH_ATTEMPTS: u32 = 4;
pub const DEFAULT_WIKI_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_WIKI_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_MS: u64 = 1200;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },
}

/// Everything the resolver needs besides an HTTP client.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Upper bound on concurrently resolving ingredients.
    pub max_workers: usize,
    /// Timeout and attempts for the web search API.
    pub search: FetchPolicy,
    /// Timeout and attempts for encyclopedia requests.
    pub wiki: FetchPolicy,
    /// Linear backoff unit between failed attempts.
    pub backoff_unit: Duration,
    /// Minimum delay between requests to one host. Zero disables pacing.
    pub rate_limit: Duration,
    pub user_agents: Vec<String>,
    pub search_url: String,
    pub wiki_base_url: String,
    /// Optional JSON file of externally maintained INS entries.
    pub ins_table_path: Option<PathBuf>,
    /// Optional JSON file mapping ingredient names to banning jurisdictions.
    pub banned_table_path: Option<PathBuf>,
    /// Directory for the record cache. None disables caching.
    pub cache_dir: Option<PathBuf>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            search: FetchPolicy {
                timeout: Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
                attempts: DEFAULT_SEARCH_ATTEMPTS,
            },
            wiki: FetchPolicy {
                timeout: Duration::from_secs(DEFAULT_WIKI_TIMEOUT_SECS),
                attempts: DEFAULT_WIKI_ATTEMPTS,
            },
            backoff_unit: Duration::from_millis(DEFAULT_BACKOFF_MS),
            rate_limit: Duration::ZERO,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            wiki_base_url: DEFAULT_WIKI_BASE_URL.to_string(),
            ins_table_path: None,
            banned_table_path: None,
            cache_dir: None,
        }
    }
}

impl LookupConfig {
    /// Load configuration from environment variables.
    ///
    /// All optional:
    /// - `LABEL_READER_MAX_WORKERS` (default: 6)
    /// - `LABEL_READER_SEARCH_TIMEOUT_SECS` / `LABEL_READER_SEARCH_ATTEMPTS` (default: 20 / 4)
    /// - `LABEL_READER_WIKI_TIMEOUT_SECS` / `LABEL_READER_WIKI_ATTEMPTS` (default: 10 / 3)
    /// - `LABEL_READER_BACKOFF_MS` (default: 1200)
    /// - `LABEL_READER_RATE_LIMIT_MS` (default: 0, disabled)
    /// - `LABEL_READER_SEARCH_URL`, `LABEL_READER_WIKI_BASE_URL`
    /// - `LABEL_READER_INS_TABLE`, `LABEL_READER_BANNED_TABLE`: JSON table files
    /// - `LABEL_READER_CACHE`: "none", "disk" (~/.label-reader/record-cache) or a path
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let search = FetchPolicy {
            timeout: Duration::from_secs(parse_var(
                "LABEL_READER_SEARCH_TIMEOUT_SECS",
                DEFAULT_SEARCH_TIMEOUT_SECS,
            )?),
            attempts: parse_var("LABEL_READER_SEARCH_ATTEMPTS", DEFAULT_SEARCH_ATTEMPTS)?,
        };
        let wiki = FetchPolicy {
            timeout: Duration::from_secs(parse_var(
                "LABEL_READER_WIKI_TIMEOUT_SECS",
                DEFAULT_WIKI_TIMEOUT_SECS,
            )?),
            attempts: parse_var("LABEL_READER_WIKI_ATTEMPTS", DEFAULT_WIKI_ATTEMPTS)?,
        };

        let cache_dir = match env::var("LABEL_READER_CACHE").ok() {
            Some(val) if val == "none" => None,
            Some(val) if val == "disk" => Some(Self::default_cache_dir()),
            Some(path) => Some(PathBuf::from(path)),
            None => None,
        };

        Ok(Self {
            max_workers: parse_var("LABEL_READER_MAX_WORKERS", DEFAULT_MAX_WORKERS)?,
            search,
            wiki,
            backoff_unit: Duration::from_millis(parse_var(
                "LABEL_READER_BACKOFF_MS",
                DEFAULT_BACKOFF_MS,
            )?),
            rate_limit: Duration::from_millis(parse_var("LABEL_READER_RATE_LIMIT_MS", 0u64)?),
            search_url: env::var("LABEL_READER_SEARCH_URL").unwrap_or(defaults.search_url),
            wiki_base_url: env::var("LABEL_READER_WIKI_BASE_URL")
                .unwrap_or(defaults.wiki_base_url),
            ins_table_path: env::var("LABEL_READER_INS_TABLE").ok().map(PathBuf::from),
            banned_table_path: env::var("LABEL_READER_BANNED_TABLE").ok().map(PathBuf::from),
            cache_dir,
            user_agents: defaults.user_agents,
        })
    }

    /// Get the default cache directory: ~/.label-reader/record-cache
    pub fn default_cache_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".label-reader").join("record-cache"))
            .unwrap_or_else(|| PathBuf::from("data/record-cache"))
    }
}

fn parse_var<T: FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => parse_value(var, &value),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var: var.to_string(),
        value: value.to_string(),
    })
}
