// src/crawl/recursive.rs
// =============================================================================
// Depth-bounded recursive scanning that follows redirects.
//
// How it works:
// 1. Mark the base URL as visited and scan it with the full word list
// 2. Unless we're at the last allowed depth, look at every redirect result
//    (301/302/307/308) and resolve its Location against the current base
// 3. Skip targets we've already scanned, otherwise recurse into them
// 4. Concatenate parent results, then each child's results, and finally sort
//    everything by (status, url)
//
// We only follow redirects, never links inside pages. The visited set only
// grows, and each URL is scanned at most once, so the crawl always ends.
//
// Rust concepts:
// - Recursive async functions need boxing: an async fn's future contains
//   itself, so we return a BoxFuture instead
// - HashSet: to track visited URLs (O(1) lookup)
// =============================================================================

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

use crate::scanner::{sort_results, ScanResult, Scanner};

impl Scanner {
    /// Scans the configured base URL, then every redirect target it finds,
    /// up to `max_depth` levels (1 = just the base URL)
    pub async fn scan_recursive(&self, words: &[String], max_depth: usize) -> Vec<ScanResult> {
        let base = normalize_base(&self.config().base_url);

        let mut visited = HashSet::new();
        visited.insert(base.clone());

        let mut results = self
            .crawl(base, words, 0, max_depth.max(1), &mut visited)
            .await;
        sort_results(&mut results);
        results
    }

    fn crawl<'a>(
        &'a self,
        base: String,
        words: &'a [String],
        depth: usize,
        max_depth: usize,
        visited: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, Vec<ScanResult>> {
        async move {
            info!("Scanning [depth {}]: {}", depth, base);
            let mut results = self.scan_base(&base, words).await;

            if depth + 1 >= max_depth {
                return results;
            }

            // Parent results stay first; children are appended in discovery order
            let redirects: Vec<ScanResult> = results
                .iter()
                .filter(|r| r.is_redirect())
                .cloned()
                .collect();

            for result in redirects {
                let location = if result.redirect_location.is_empty() {
                    result.url.as_str()
                } else {
                    result.redirect_location.as_str()
                };

                let Some(next) = resolve_redirect(&base, location) else {
                    continue;
                };

                // insert() returns false if it was already there
                if !visited.insert(next.clone()) {
                    debug!("Already scanned {}, skipping", next);
                    continue;
                }

                let child = self
                    .crawl(next, words, depth + 1, max_depth, visited)
                    .await;
                results.extend(child);
            }

            results
        }
        .boxed()
    }
}

/// Resolves a Location value against the current base
///
/// The result has its path cleaned ("." / ".." / duplicate slashes) and no
/// trailing slash, so different spellings of one directory compare equal.
pub fn resolve_redirect(base: &str, location: &str) -> Option<String> {
    if location.is_empty() {
        return None;
    }

    let base = Url::parse(base).ok()?;
    let mut resolved = base.join(location).ok()?;
    let cleaned = clean_path(resolved.path());
    resolved.set_path(&cleaned);

    Some(resolved.to_string().trim_end_matches('/').to_string())
}

/// The base URL as it is stored in the visited set
pub fn normalize_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

// Lexically cleans an absolute URL path
fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why depth-first?
//    - A child's results are appended right after its parent's, which keeps
//      related paths together before the final sort
//    - The visited set is shared across all branches, so two redirects that
//      end up at the same directory are only scanned once
//
// 2. Why does the Location fall back to the result's own URL?
//    - A redirect without a Location header still says "something is here";
//      resolving our own URL gives us that directory as the next base
// -----------------------------------------------------------------------------
