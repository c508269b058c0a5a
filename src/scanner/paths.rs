// src/scanner/paths.rs
// =============================================================================
// Turning wordlist entries into request URLs.
// =============================================================================

/// Joins a base URL and a path segment with exactly one slash between them
///
/// build_url("http://h/app/", "/admin") == "http://h/app/admin"
/// An empty segment gives back the base without its trailing slash.
pub fn build_url(base: &str, segment: &str) -> String {
    let base = base.trim_end_matches('/');
    if segment.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base, segment.trim_start_matches('/'))
}

/// Expands each word into itself plus word+extension for every extension
///
/// Extensions the word already ends with are skipped, so "index.php" with
/// [".php", ".bak"] becomes ["index.php", "index.php.bak"].
pub fn expand_words(words: &[String], extensions: &[String]) -> Vec<String> {
    if extensions.is_empty() {
        return words.to_vec();
    }

    let mut expanded = Vec::with_capacity(words.len() * (extensions.len() + 1));
    for word in words {
        expanded.push(word.clone());
        for ext in extensions {
            if !word.ends_with(ext.as_str()) {
                expanded.push(format!("{}{}", word, ext));
            }
        }
    }
    expanded
}
