// src/probe/mod.rs
// =============================================================================
// Everything needed to request and judge a single path.
//
// Submodules:
// - http: pooled client, GET with retry, response snapshots
// - rate_limit: token bucket shared by all workers
// - filter: soft-404 detection (the "smart filter")
//
// The scanner composes these; none of them know about wordlists or workers.
// =============================================================================

mod filter;
mod http;
mod rate_limit;

pub use filter::SmartFilter;
pub use http::{HttpClient, ProbeResponse};
pub use rate_limit::RateLimiter;
