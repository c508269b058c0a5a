// src/scanner/result.rs
// =============================================================================
// What a scan produces: one ScanResult per discovered path, plus the Stats
// counters for the whole run.
//
// ScanState is the single shared aggregate every worker writes into. It sits
// behind one mutex in the Scanner, so the methods here are plain &mut self.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// A request that passed the status allow-list and the smart filter
///
/// The JSON field names match what downstream tooling expects:
/// url, statusCode, size, time (nanoseconds), redirectLocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub url: String,
    pub status_code: u16,
    /// Response size in bytes
    pub size: u64,
    /// Time until the response headers arrived
    #[serde(with = "duration_nanos")]
    pub time: Duration,
    /// Location header of a 3xx response (empty otherwise)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub redirect_location: String,
}

impl ScanResult {
    pub fn is_redirect(&self) -> bool {
        is_redirect_status(self.status_code)
    }
}

/// 301, 302, 307 and 308 are the redirects we follow when crawling
pub fn is_redirect_status(status: u16) -> bool {
    matches!(status, 301 | 302 | 307 | 308)
}

/// Sorts by status code, then URL, so output doesn't depend on timing
pub fn sort_results(results: &mut [ScanResult]) {
    results.sort_by(|a, b| {
        a.status_code
            .cmp(&b.status_code)
            .then_with(|| a.url.cmp(&b.url))
    });
}

/// Counters for one run (all batches together)
///
/// `failed` lumps together network errors, excluded status codes and
/// filtered soft-404s.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub start_time: Option<Instant>,
    pub end_time: Option<Instant>,
}

impl Stats {
    /// Wall-clock time of the run. Falls back to "time since start" when
    /// the end mark is missing or not after the start.
    pub fn elapsed(&self) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end > start => end - start,
            (Some(start), _) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    pub fn requests_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.total as f64 / secs
        } else {
            0.0
        }
    }
}

/// Shared, mutex-guarded state of a Scanner
#[derive(Debug, Default)]
pub struct ScanState {
    pub stats: Stats,
    pub results: Vec<ScanResult>,
}

impl ScanState {
    /// Called when a batch of `count` jobs is submitted
    pub fn track_total(&mut self, count: usize, now: Instant) {
        if self.stats.start_time.is_none() {
            self.stats.start_time = Some(now);
        }
        self.stats.total += count;
    }

    pub fn record_success(&mut self, result: ScanResult) {
        self.stats.success += 1;
        self.results.push(result);
    }

    pub fn record_failure(&mut self) {
        self.stats.failed += 1;
    }

    pub fn finish(&mut self, now: Instant) {
        self.stats.end_time = Some(now);
    }
}

// Durations are written as integer nanoseconds
mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(value.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}
