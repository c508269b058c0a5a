// src/probe/filter.rs
// =============================================================================
// Soft-404 detection.
//
// Some servers answer every unknown path with "200 OK" and a generic page.
// Without filtering, every word in the wordlist would look like a hit.
//
// How it works:
// 1. Calibrate: request a random path that surely doesn't exist and remember
//    the declared Content-Length and a checksum of the body
// 2. For each later response:
//    - same Content-Length as the calibration page -> fake
//    - otherwise, same body checksum -> fake
//    - anything else -> real
// 3. Until calibration succeeds, everything counts as real (fail open)
//
// The checksum is FNV-1a (32 bit). It only needs to be fast and good enough
// for equality, not secure.
// =============================================================================

use rand::RngCore;
use tokio::sync::RwLock;
use tracing::debug;

use super::http::{HttpClient, ProbeResponse};
use crate::scanner::build_url;

/// What the server returns for a path that doesn't exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationSample {
    pub not_found_size: Option<u64>,
    /// None when the calibration body was empty
    pub not_found_digest: Option<u32>,
}

#[derive(Debug, Default)]
pub struct SmartFilter {
    sample: RwLock<Option<CalibrationSample>>,
}

impl SmartFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probes a random path under `base_url` and stores the result
    ///
    /// A failed calibration request leaves the filter uncalibrated.
    pub async fn calibrate(&self, client: &HttpClient, base_url: &str) {
        let url = build_url(base_url, &random_path());

        let response = match client.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                debug!("Calibration request to {} failed: {}", url, e);
                return;
            }
        };

        let probe = ProbeResponse::read(response).await;
        let sample = CalibrationSample {
            not_found_size: probe.content_length,
            not_found_digest: digest(&probe.body),
        };

        debug!(
            "Calibrated against {} (status {}, size {:?})",
            url, probe.status, sample.not_found_size
        );
        self.set_sample(sample).await;
    }

    pub async fn set_sample(&self, sample: CalibrationSample) {
        *self.sample.write().await = Some(sample);
    }

    pub async fn is_calibrated(&self) -> bool {
        self.sample.read().await.is_some()
    }

    /// Returns false if the response looks like the calibration page
    pub async fn is_real(&self, response: &ProbeResponse) -> bool {
        let sample = self.sample.read().await;
        let Some(sample) = sample.as_ref() else {
            return true;
        };

        if let (Some(expected), Some(actual)) = (sample.not_found_size, response.content_length) {
            if expected == actual {
                return false;
            }
        }

        let Some(expected) = sample.not_found_digest else {
            return true;
        };

        digest(&response.body) != Some(expected)
    }
}

/// FNV-1a over the bytes; None for an empty body
pub fn digest(data: &[u8]) -> Option<u32> {
    if data.is_empty() {
        return None;
    }

    let hash = data.iter().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(0x0100_0193)
    });
    Some(hash)
}

/// 32 hex characters, practically guaranteed not to exist on the target
fn random_path() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
