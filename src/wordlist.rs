// src/wordlist.rs
// =============================================================================
// Loads the wordlist file.
//
// One entry per line. Lines are trimmed; blank lines and lines starting with
// '#' are skipped. Order is kept so runs are reproducible.
// =============================================================================

use anyhow::{Context, Result};
use std::path::Path;

use crate::scanner::ConfigError;

pub async fn load(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read wordlist '{}'", path.display()))?;

    let words = parse(&content);
    if words.is_empty() {
        return Err(ConfigError::EmptyWordlist(path.display().to_string()).into());
    }

    Ok(words)
}

pub fn parse(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
