//! Run configuration for the harvest pipeline.
//!
//! Defaults are a 120 s request timeout and pools of 5 probes and 4
//! downloads. A few values can be overridden from the environment; `refresh` only
//! ever comes from the command line.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::download::{
    DOWNLOAD_CONCURRENCY, MIN_INVENTORY_BYTES, PROBE_CONCURRENCY, REQUEST_TIMEOUT_SECS,
};
use crate::layout::DataLayout;

/// Directory of registered .gov domains (GSA snapshot, December 2014).
pub const DEFAULT_SOURCE_URL: &str =
    "https://gsa.github.io/data/dotgov-domains/2014-12-01-full.csv";

/// Data directory used when no override is set, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Overrides the data directory.
pub const DATA_DIR_ENV: &str = "HARVESTER_DATA_DIR";

/// Overrides the domain directory URL.
pub const SOURCE_URL_ENV: &str = "HARVESTER_SOURCE_URL";

/// Overrides the request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "HARVESTER_TIMEOUT_SECS";

const MAX_TIMEOUT_SECS: u64 = 3600;

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Timeout override is not an integer in range.
    #[error("invalid value for {var}: {value:?}. Expected seconds in range 1..={MAX_TIMEOUT_SECS}")]
    InvalidTimeout {
        /// Environment variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// Source URL override does not parse as an absolute URL.
    #[error("invalid value for {var}: {value:?} is not an absolute URL")]
    InvalidSourceUrl {
        /// Environment variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of the on-disk cache and outputs.
    pub data_dir: PathBuf,
    /// URL of the domain directory CSV.
    pub source_url: String,
    /// Whole-request timeout for every fetch.
    pub request_timeout: Duration,
    /// Concurrent probes.
    pub probe_concurrency: usize,
    /// Concurrent inventory downloads.
    pub download_concurrency: usize,
    /// Inventory bodies must be strictly longer than this.
    pub min_inventory_bytes: usize,
    /// Rerun every stage regardless of cached files.
    pub refresh: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            probe_concurrency: PROBE_CONCURRENCY,
            download_concurrency: DOWNLOAD_CONCURRENCY,
            min_inventory_bytes: MIN_INVENTORY_BYTES,
            refresh: false,
        }
    }
}

impl PipelineConfig {
    /// Builds the configuration from defaults plus process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an override is present but invalid.
    pub fn from_env(refresh: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(refresh, |name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable lookup.
    ///
    /// Empty or whitespace-only values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an override is present but invalid.
    pub fn from_lookup<F>(refresh: bool, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self {
            refresh,
            ..Self::default()
        };

        if let Some(data_dir) = non_empty(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Some(source_url) = non_empty(SOURCE_URL_ENV) {
            if Url::parse(&source_url).is_err() {
                return Err(ConfigError::InvalidSourceUrl {
                    var: SOURCE_URL_ENV,
                    value: source_url,
                });
            }
            config.source_url = source_url;
        }

        if let Some(raw) = non_empty(TIMEOUT_ENV) {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| (1..=MAX_TIMEOUT_SECS).contains(secs))
                .ok_or_else(|| ConfigError::InvalidTimeout {
                    var: TIMEOUT_ENV,
                    value: raw.clone(),
                })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Returns the file layout rooted at [`data_dir`](Self::data_dir).
    #[must_use]
    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }
}
