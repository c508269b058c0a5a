// src/scanner/worker.rs
// =============================================================================
// One worker of the pool.
//
// A worker loops over the shared job queue until it's closed. For every word:
// 1. Wait for a rate-limiter token
// 2. Build the URL and GET it (with retry), timing the request
// 3. Read the response (capped body) and work out its size
// 4. Report it if the status is allowed AND the smart filter says it's real,
//    otherwise count it as failed
//
// Rust concepts:
// - Arc<Mutex<Receiver>>: several tasks pulling from one mpsc queue
// - Sender clones: the result queue closes once every worker has dropped its
//   sender, which is how the orchestrator knows the batch is done
// =============================================================================

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::Mutex;
use tracing::debug;

use super::config::Config;
use super::paths::build_url;
use super::result::{ScanResult, ScanState};
use crate::probe::{HttpClient, ProbeResponse, RateLimiter, SmartFilter};

pub type JobQueue = Arc<Mutex<Receiver<String>>>;

/// Everything a worker needs, cloned cheaply from the Scanner
#[derive(Clone)]
pub struct Worker {
    pub base_url: String,
    pub config: Arc<Config>,
    pub client: HttpClient,
    pub filter: Option<Arc<SmartFilter>>,
    pub rate_limiter: Arc<RateLimiter>,
    pub state: Arc<Mutex<ScanState>>,
}

impl Worker {
    /// Processes jobs until the queue is closed and empty
    pub async fn run(self, jobs: JobQueue, results: Sender<ScanResult>) {
        loop {
            // Only hold the lock while taking the next job
            let next = jobs.lock().await.recv().await;
            let Some(word) = next else {
                break;
            };

            if let Some(result) = self.probe(&word).await {
                // The channel holds a whole batch, so this never blocks;
                // an error means the orchestrator is gone
                if results.send(result).await.is_err() {
                    break;
                }
            }
        }
    }

    /// Probes one word, updating the shared counters
    ///
    /// Returns the result only when it should be reported.
    async fn probe(&self, word: &str) -> Option<ScanResult> {
        self.rate_limiter.wait().await;

        let target = build_url(&self.base_url, word);
        let start = Instant::now();
        let response = self
            .client
            .get_with_retry(&target, self.config.max_retries)
            .await;
        let elapsed = start.elapsed();

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                debug!("[-] {} - Error: {}", target, e);
                self.state.lock().await.record_failure();
                return None;
            }
        };

        let probe = ProbeResponse::read(response).await;

        let allowed = self.config.accepts_status(probe.status);
        let real = match &self.filter {
            Some(filter) if allowed => filter.is_real(&probe).await,
            _ => true,
        };

        let mut state = self.state.lock().await;
        if allowed && real {
            let result = ScanResult {
                url: target,
                status_code: probe.status,
                size: probe.size(),
                time: elapsed,
                redirect_location: probe.location,
            };
            state.record_success(result.clone());
            Some(result)
        } else {
            state.record_failure();
            None
        }
    }
}
