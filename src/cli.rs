// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The flags mirror classic directory brute-forcers (-u, -w, -t, --mc, ...).
// `Cli::to_config()` turns the parsed flags into the scanner's Config; the
// scanner itself never sees clap types.
//
// Rust concepts:
// - Derive macros: clap generates the parser from the struct definition
// - Option<T>: the target and wordlist are checked by us, not by clap, so a
//   missing one becomes a ConfigError with a friendly message
// =============================================================================

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::scanner::{Config, ConfigError};

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dirprobe",
    version,
    about = "Probe a web server for hidden paths using a wordlist",
    long_about = "dirprobe requests every wordlist entry under a target URL concurrently and \
                  reports the paths that exist. A calibration request filters out servers \
                  that answer 200 for everything."
)]
pub struct Cli {
    /// Target URL (e.g., https://example.com/app)
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// Path to the wordlist (one entry per line)
    #[arg(short = 'w', long = "wordlist")]
    pub wordlist: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(short = 't', long = "threads", default_value_t = 50)]
    pub threads: usize,

    /// Request timeout in seconds
    #[arg(long = "timeout", default_value_t = 10)]
    pub timeout: u64,

    /// Status codes to report, comma separated (empty = all)
    #[arg(long = "mc", default_value = "200,301,302,401,403")]
    pub match_codes: String,

    /// Write results to a plain text file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Write results to a JSON file
    #[arg(long = "json")]
    pub json: Option<PathBuf>,

    /// Show network errors and retries
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Follow redirects into new directories
    #[arg(short = 'r', long = "recursive", action = ArgAction::SetTrue)]
    pub recursive: bool,

    /// Maximum recursion depth (1 = only the target)
    #[arg(long = "depth", default_value_t = 1)]
    pub depth: usize,

    /// Maximum requests per second (0 = unlimited)
    #[arg(long = "rate", default_value_t = 0)]
    pub rate: u32,

    /// Retries for transient network errors
    #[arg(long = "retries", default_value_t = 2)]
    pub retries: u32,

    /// Extensions to try, comma separated (e.g., php,html,.bak)
    #[arg(short = 'e', long = "extensions", default_value = "")]
    pub extensions: String,

    /// Disable the soft-404 filter
    #[arg(long = "no-filter", action = ArgAction::SetTrue)]
    pub no_filter: bool,

    /// Verify TLS certificates (off by default for lab targets)
    #[arg(long = "verify-tls", action = ArgAction::SetTrue)]
    pub verify_tls: bool,
}

impl Cli {
    /// Builds the scanner Config from the parsed flags
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingTarget)?;

        Ok(Config {
            base_url: url.trim_end_matches('/').to_string(),
            threads: self.threads,
            timeout: Duration::from_secs(self.timeout),
            status_codes: parse_status_codes(&self.match_codes),
            max_retries: self.retries,
            rate_limit: self.rate,
            recursive: self.recursive,
            max_depth: self.depth,
            extensions: parse_extensions(&self.extensions),
            enable_smart_filter: !self.no_filter,
            insecure_tls: !self.verify_tls,
            ..Config::default()
        })
    }

    pub fn wordlist_path(&self) -> Result<&PathBuf, ConfigError> {
        self.wordlist.as_ref().ok_or(ConfigError::MissingWordlist)
    }
}

/// Parses "200, 301,abc" into [200, 301], warning about the bad entries
pub fn parse_status_codes(codes: &str) -> Vec<u16> {
    codes
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| match part.parse::<u16>() {
            Ok(code) => Some(code),
            Err(e) => {
                warn!("Invalid status code '{}': {}", part, e);
                None
            }
        })
        .collect()
}

/// Parses "php, .bak" into [".php", ".bak"]
pub fn parse_extensions(extensions: &str) -> Vec<String> {
    extensions
        .split(',')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            if ext.starts_with('.') {
                ext.to_string()
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}
