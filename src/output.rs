// src/output.rs
// =============================================================================
// Everything the user sees after a scan.
//
// - print_results: human-readable table in the terminal
// - save_text: one line per result, "<status> <url> <size> <time> <redirect>"
// - save_json: pretty JSON array (field names fixed for other tools)
// - print_stats: totals, duration and request rate
//
// Writing files can fail; the caller reports it and carries on, since the
// results were already printed.
// =============================================================================

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use crate::scanner::{sort_results, ScanResult, Stats};

// Prints results as a table, sorted by status then URL
pub fn print_results(results: &[ScanResult]) {
    if results.is_empty() {
        println!("[!] No results found");
        return;
    }

    let mut sorted = results.to_vec();
    sort_results(&mut sorted);

    let url_width = sorted
        .iter()
        .map(|r| r.url.len())
        .max()
        .unwrap_or(0)
        .max("URL".len());

    println!();
    println!(
        "{:<8} {:<url_width$} {:>10} {:>10}  {}",
        "STATUS", "URL", "SIZE", "TIME", "REDIRECT"
    );
    println!("{}", "=".repeat(8 + url_width + 10 + 10 + 14));

    for result in &sorted {
        // Pad before coloring, escape codes would break the alignment
        let status = format!("{:<8}", result.status_code);
        println!(
            "{} {:<url_width$} {:>10} {:>10}  {}",
            color_status(result.status_code, &status),
            result.url,
            result.size,
            format_duration(result.time),
            result.redirect_location
        );
    }
    println!();
}

fn color_status(code: u16, text: &str) -> ColoredString {
    match code {
        200..=299 => text.green(),
        300..=399 => text.cyan(),
        400..=499 => text.yellow(),
        500..=599 => text.red(),
        _ => text.normal(),
    }
}

/// Writes the plain-text report
pub fn save_text(results: &[ScanResult], path: &Path) -> Result<()> {
    let mut content = String::new();
    for result in results {
        // Writing into a String can't fail
        let _ = writeln!(
            content,
            "{} {} {} {} {}",
            result.status_code,
            result.url,
            result.size,
            format_duration(result.time),
            result.redirect_location
        );
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write results to '{}'", path.display()))
}

/// Writes the JSON report
pub fn save_json(results: &[ScanResult], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results).context("Failed to serialize results")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write JSON to '{}'", path.display()))
}

pub fn print_stats(stats: &Stats) {
    println!("[*] Scan Statistics:");
    println!("    Total Requests:  {}", stats.total);
    println!("    Successful:      {}", stats.success);
    println!("    Failed:          {}", stats.failed);
    println!("    Duration:        {}", format_duration(stats.elapsed()));
    println!("    Req/sec:         {:.2}", stats.requests_per_second());
}

/// Rounds to milliseconds and prints like "250ms", "1.5s" or "2m3.25s"
pub fn format_duration(duration: Duration) -> String {
    let ms = (duration.as_nanos() + 500_000) / 1_000_000;
    if ms == 0 {
        return "0s".to_string();
    }
    if ms < 1000 {
        return format!("{}ms", ms);
    }

    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{}h", hours);
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{}m", minutes);
    }
    if millis == 0 {
        let _ = write!(out, "{}s", seconds);
    } else {
        let fraction = format!("{:03}", millis);
        let _ = write!(out, "{}.{}s", seconds, fraction.trim_end_matches('0'));
    }
    out
}
