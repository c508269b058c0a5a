// src/crawl/mod.rs
// =============================================================================
// This module handles recursive scanning.
//
// Features:
// - Depth-first descent into redirect targets found by a scan
// - Configurable depth limit
// - A visited set so each directory is scanned at most once
//
// Why follow redirects?
// - Servers usually answer "/admin" with a 301 to "/admin/" when it's a
//   directory, which makes redirects a cheap hint for where to dig deeper
// =============================================================================

mod recursive;
