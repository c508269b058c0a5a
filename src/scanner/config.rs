// src/scanner/config.rs
// =============================================================================
// Run parameters for one scan.
//
// A Config is built once (by the CLI, or by hand in tests) and never changes
// after the Scanner is created. `normalized()` fills in the defaults the
// scanner relies on, and `validate()` rejects targets we can't scan.
// =============================================================================

use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default number of workers when the caller passes 0
pub const DEFAULT_THREADS: usize = 10;

/// Default per-request timeout when the caller passes zero
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Problems that stop a scan before it starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing target URL (use -u <url>)")]
    MissingTarget,

    #[error("missing wordlist path (use -w <wordlist>)")]
    MissingWordlist,

    #[error("invalid target URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("wordlist '{0}' contains no usable entries")]
    EmptyWordlist(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL every wordlist entry is appended to
    pub base_url: String,
    /// Number of concurrent workers per batch
    pub threads: usize,
    /// Per-request timeout
    pub timeout: Duration,
    /// Status codes worth reporting (empty = report everything)
    pub status_codes: Vec<u16>,
    /// Extra attempts after a transient network failure
    pub max_retries: u32,
    /// Requests per second (0 = unlimited)
    pub rate_limit: u32,
    pub recursive: bool,
    pub max_depth: usize,
    /// Extensions appended to each word, like ".php"
    pub extensions: Vec<String>,
    pub enable_smart_filter: bool,
    /// Skip TLS certificate verification (lab targets are often self-signed)
    pub insecure_tls: bool,
    /// Time unit for retry backoff: attempt k waits k units
    pub retry_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            threads: DEFAULT_THREADS,
            timeout: DEFAULT_TIMEOUT,
            status_codes: Vec::new(),
            max_retries: 0,
            rate_limit: 0,
            recursive: false,
            max_depth: 1,
            extensions: Vec::new(),
            enable_smart_filter: true,
            insecure_tls: true,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Creates a config for `base_url` with every other field defaulted
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Replaces zero values with the scanner defaults
    pub fn normalized(mut self) -> Self {
        if self.threads == 0 {
            self.threads = DEFAULT_THREADS;
        }
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_TIMEOUT;
        }
        if self.max_depth == 0 {
            self.max_depth = 1;
        }
        self
    }

    /// Checks that the base URL is an absolute http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingTarget);
        }

        let parsed = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidTarget {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidTarget {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }

    /// Whether a status code passes the allow-list
    pub fn accepts_status(&self, status: u16) -> bool {
        self.status_codes.is_empty() || self.status_codes.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_fills_defaults() {
        let config = Config {
            threads: 0,
            timeout: Duration::ZERO,
            max_depth: 0,
            ..Config::new("http://example.com")
        }
        .normalized();

        assert_eq!(config.threads, DEFAULT_THREADS);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.max_depth, 1);
    }

    #[test]
    fn test_validate_rejects_missing_and_bad_targets() {
        assert!(matches!(Config::new("").validate(), Err(ConfigError::MissingTarget)));
        assert!(matches!(
            Config::new("not a url").validate(),
            Err(ConfigError::InvalidTarget { .. })
        ));
        assert!(matches!(
            Config::new("ftp://example.com").validate(),
            Err(ConfigError::InvalidTarget { .. })
        ));
        assert!(Config::new("https://example.com/app").validate().is_ok());
    }

    #[test]
    fn test_empty_allow_list_accepts_everything() {
        let mut config = Config::new("http://example.com");
        assert!(config.accepts_status(404));

        config.status_codes = vec![200, 301];
        assert!(config.accepts_status(301));
        assert!(!config.accepts_status(404));
    }
}
