// src/scanner/mod.rs
// =============================================================================
// The scanning engine.
//
// A Scanner lives for exactly one run. It owns:
// - the HTTP client (and with it the connection pool)
// - the rate limiter shared by every worker
// - the smart filter, calibrated once on first use
// - the shared Stats/results aggregate, behind one mutex
//
// Each batch (one base URL + one word list) runs a fixed pool of workers
// that pull from a single job queue and push into a single result queue.
// Recursive and extension modes just run several batches on the same
// Scanner, so the counters add up across the whole run.
//
// Submodules:
// - config: Config and ConfigError
// - result: ScanResult, Stats and the shared state
// - paths: URL joining and extension expansion
// - worker: what each worker does per job
// =============================================================================

mod config;
mod paths;
mod result;
mod worker;

pub use config::{Config, ConfigError};
pub use paths::{build_url, expand_words};
pub use result::{sort_results, ScanResult, Stats};

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, OnceCell};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::probe::{HttpClient, RateLimiter, SmartFilter};
use result::ScanState;
use worker::Worker;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct Scanner {
    config: Arc<Config>,
    client: HttpClient,
    filter: Option<Arc<SmartFilter>>,
    calibrated: OnceCell<()>,
    rate_limiter: Arc<RateLimiter>,
    state: Arc<Mutex<ScanState>>,
}

impl Scanner {
    /// Creates a scanner for one run
    ///
    /// Zero values in the config are replaced with defaults first. Must be
    /// called inside a tokio runtime (the rate limiter spawns a task).
    pub fn new(config: Config) -> Result<Self, ScanError> {
        let config = config.normalized();
        config.validate()?;

        let client = HttpClient::new(&config)?;
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit));
        if rate_limiter.is_enabled() {
            info!("Rate limit: {} req/s", config.rate_limit);
        }
        let filter = config
            .enable_smart_filter
            .then(|| Arc::new(SmartFilter::new()));

        Ok(Self {
            config: Arc::new(config),
            client,
            filter,
            calibrated: OnceCell::new(),
            rate_limiter,
            state: Arc::new(Mutex::new(ScanState::default())),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scans the configured base URL with `words`
    pub async fn scan(&self, words: &[String]) -> Vec<ScanResult> {
        let mut results = self.scan_base(&self.config.base_url, words).await;
        sort_results(&mut results);
        results
    }

    /// Like `scan`, but also tries every word with each extension appended
    pub async fn scan_with_extensions(
        &self,
        words: &[String],
        extensions: &[String],
    ) -> Vec<ScanResult> {
        let expanded = expand_words(words, extensions);
        self.scan(&expanded).await
    }

    /// Snapshot of the counters so far
    pub async fn stats(&self) -> Stats {
        self.state.lock().await.stats.clone()
    }

    /// Every result reported during this run, in arrival order
    pub async fn all_results(&self) -> Vec<ScanResult> {
        self.state.lock().await.results.clone()
    }

    /// Runs one batch of `words` against `base_url`
    ///
    /// Results come back in completion order (unsorted).
    pub(crate) async fn scan_base(&self, base_url: &str, words: &[String]) -> Vec<ScanResult> {
        if words.is_empty() {
            return Vec::new();
        }

        self.ensure_calibrated().await;
        self.state.lock().await.track_total(words.len(), Instant::now());

        // The result queue can hold the whole batch, so workers never block on it
        let (job_tx, job_rx) = mpsc::channel::<String>(self.config.threads);
        let (result_tx, mut result_rx) = mpsc::channel::<ScanResult>(words.len());
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut workers = JoinSet::new();
        for _ in 0..self.config.threads {
            let worker = self.worker(base_url);
            let jobs = Arc::clone(&job_rx);
            let results = result_tx.clone();
            workers.spawn(worker.run(jobs, results));
        }
        // Only the workers hold senders now
        drop(result_tx);

        // Feed the jobs; dropping job_tx at the end closes the queue
        let feed = words.to_vec();
        let feeder = tokio::spawn(async move {
            for word in feed {
                if job_tx.send(word).await.is_err() {
                    break;
                }
            }
        });

        let mut batch = Vec::new();
        while let Some(result) = result_rx.recv().await {
            info!(
                "[+] {} - {} [Size: {}] [Time: {:?}]",
                result.status_code, result.url, result.size, result.time
            );
            batch.push(result);
        }

        // The result queue only closes after every worker returned
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!("Worker task failed: {}", e);
            }
        }
        if let Err(e) = feeder.await {
            warn!("Job feeder failed: {}", e);
        }

        self.state.lock().await.finish(Instant::now());
        batch
    }

    /// Calibrates the smart filter the first time any batch starts
    async fn ensure_calibrated(&self) {
        let Some(filter) = &self.filter else {
            return;
        };

        self.calibrated
            .get_or_init(|| async {
                filter.calibrate(&self.client, &self.config.base_url).await;
                if !filter.is_calibrated().await {
                    warn!("Smart filter calibration failed, soft-404 filtering is off");
                }
            })
            .await;
    }

    fn worker(&self, base_url: &str) -> Worker {
        Worker {
            base_url: base_url.to_string(),
            config: Arc::clone(&self.config),
            client: self.client.clone(),
            filter: self.filter.clone(),
            rate_limiter: Arc::clone(&self.rate_limiter),
            state: Arc::clone(&self.state),
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a fixed pool instead of one task per word?
//    - A wordlist can have hundreds of thousands of entries
//    - `threads` workers pulling from one queue caps how many requests are
//      in flight, no matter how long the list is
//
// 2. How does the batch know it's finished?
//    - mpsc channels close when every Sender is dropped
//    - The feeder drops the job sender after the last word, so workers
//      see `None` and return
//    - Each worker owns a result sender; when the last worker returns, the
//      result loop above ends
//
// 3. What is OnceCell::get_or_init?
//    - The first caller runs the async closure, everyone else waits for it
//    - Later callers return immediately, so calibration happens once even
//      when two scans start at the same moment
//
// 4. Why tokio::sync::Mutex and not std::sync::Mutex?
//    - It can be held across .await and never poisons, so locking never
//      needs unwrap()
// -----------------------------------------------------------------------------
