// src/probe/http.rs
// =============================================================================
// The HTTP side of probing: one shared client, a GET with retry, and a
// small snapshot type for responses.
//
// Key behaviour:
// - Every request is a GET with our own User-Agent and `Accept: */*`
// - Redirects are NOT followed; a 3xx is itself something worth reporting
// - Certificate checks are off by default (lab targets are often self-signed)
// - Only transient network failures are retried, never an HTTP status
//
// Rust concepts:
// - Clone on reqwest::Client: it's an Arc internally, so every worker shares
//   one connection pool
// - Error source chains: we walk `source()` to find the underlying io::Error
// =============================================================================

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LOCATION};
use reqwest::{redirect, Client, Response};
use std::error::Error as _;
use std::io::ErrorKind;
use std::time::Duration;
use tracing::debug;

use crate::scanner::Config;

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("dirprobe/", env!("CARGO_PKG_VERSION"));

/// We never look at more than 1 MiB of a response body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const KEEPALIVE: Duration = Duration::from_secs(30);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE_PER_HOST: usize = 500;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    backoff_unit: Duration,
}

impl HttpClient {
    /// Builds the pooled client for a scan
    ///
    /// The client is reused for every request (connection pooling), and
    /// cloning an HttpClient only clones the handle to that pool.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .tcp_keepalive(KEEPALIVE)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .redirect(redirect::Policy::none())
            .danger_accept_invalid_certs(config.insecure_tls)
            .build()?;

        Ok(Self {
            client,
            backoff_unit: config.retry_backoff,
        })
    }

    /// Issues a single GET
    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        self.client.get(url).send().await
    }

    /// GET with up to `max_retries` extra attempts
    ///
    /// Only transient failures are retried. Before retry k we sleep k
    /// backoff units (1, 2, 3, ...). If every attempt fails, the error of
    /// the last attempt is returned.
    pub async fn get_with_retry(
        &self,
        url: &str,
        max_retries: u32,
    ) -> Result<Response, reqwest::Error> {
        let mut attempt: u32 = 0;

        loop {
            match self.get(url).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    attempt += 1;

                    if attempt > max_retries || !is_transient(&e) {
                        return Err(e);
                    }

                    let backoff = self.backoff_unit * attempt;
                    debug!(
                        "Attempt {}/{} for {} failed: {}. Retrying in {:?}",
                        attempt,
                        max_retries + 1,
                        url,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

/// Decides whether a failed request is worth retrying
///
/// Retryable:
/// - timeouts (connect or whole request)
/// - connection failures: refused, unreachable, DNS lookup errors
/// - an io::Error of a "connection went away" kind anywhere in the cause chain
///
/// Everything else (bad URL, builder errors, body decoding) is permanent.
pub fn is_transient(error: &reqwest::Error) -> bool {
    if error.is_timeout() || error.is_connect() {
        return true;
    }
    if error.is_builder() {
        return false;
    }

    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            return matches!(
                io_error.kind(),
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
                    | ErrorKind::TimedOut
                    | ErrorKind::Interrupted
            );
        }
        source = cause.source();
    }

    false
}

/// The parts of a response the scanner cares about, with the body already
/// read (up to MAX_BODY_BYTES)
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    /// Declared Content-Length, if the server sent one
    pub content_length: Option<u64>,
    /// Location header (empty when absent)
    pub location: String,
    pub body: Vec<u8>,
}

impl ProbeResponse {
    /// Reads status, headers and a capped body, closing the response
    pub async fn read(mut response: Response) -> Self {
        let status = response.status().as_u16();
        let content_length = response.content_length();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = match read_capped(&mut response, MAX_BODY_BYTES).await {
            Ok(body) => body,
            Err(e) => {
                debug!("Failed to read body of {}: {}", response.url(), e);
                Vec::new()
            }
        };

        Self {
            status,
            content_length,
            location,
            body,
        }
    }

    /// Declared length if known, otherwise the number of bytes we read
    pub fn size(&self) -> u64 {
        self.content_length.unwrap_or(self.body.len() as u64)
    }
}

async fn read_capped(response: &mut Response, limit: usize) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Policy::none() for redirects?
//    - A 301 from "/admin" to "/admin/" tells us the directory exists
//    - Following it would hide that and report the final page instead
//
// 2. What does `self.backoff_unit * attempt` do?
//    - Duration implements Mul<u32>, so 1s * 3 is 3s
//    - Attempt 1 failed -> wait 1 unit, attempt 2 failed -> wait 2 units
//
// 3. Why read at most 1 MiB?
//    - We only need enough bytes to compare against the calibration page
//    - A huge file on the target shouldn't eat our memory
//
// 4. What is `downcast_ref`?
//    - Errors are often wrapped several times (reqwest -> hyper -> io)
//    - downcast_ref checks whether a `dyn Error` is really a specific type
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockReply, MockServer};
    use std::time::Instant;

    fn test_client(timeout_ms: u64) -> HttpClient {
        let config = Config {
            timeout: Duration::from_millis(timeout_ms),
            retry_backoff: Duration::from_millis(10),
            ..Config::new("http://127.0.0.1")
        };
        HttpClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_redirects_are_not_followed() {
        let server = MockServer::start(|path, _| match path {
            "/old" => MockReply::status(301).header("Location", "/new"),
            _ => MockReply::status(200).body("new page"),
        })
        .await;

        let response = test_client(2000).get(&server.url("/old")).await.unwrap();
        let probe = ProbeResponse::read(response).await;

        assert_eq!(probe.status, 301);
        assert_eq!(probe.location, "/new");
        assert_eq!(server.hits("/new"), 0);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries_plus_one() {
        let server = MockServer::start(|_, _| {
            MockReply::status(200).delay(Duration::from_secs(3))
        })
        .await;

        let result = test_client(200).get_with_retry(&server.url("/slow"), 2).await;

        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(server.hits("/slow"), 3);
    }

    #[tokio::test]
    async fn test_backoff_grows_linearly_without_trailing_sleep() {
        let server = MockServer::start(|_, _| {
            MockReply::status(200).delay(Duration::from_secs(5))
        })
        .await;
        let config = Config {
            timeout: Duration::from_millis(100),
            retry_backoff: Duration::from_millis(300),
            ..Config::new("http://127.0.0.1")
        };
        let client = HttpClient::new(&config).unwrap();

        let start = Instant::now();
        let result = client.get_with_retry(&server.url("/slow"), 2).await;
        let elapsed = start.elapsed();

        // 3 timeouts of 100ms + backoffs of 300ms and 600ms = 1.2s.
        // Constant backoff gives 0.9s, exponential or a sleep after the
        // last attempt gives 1.5s or more.
        assert!(result.is_err());
        assert_eq!(server.hits("/slow"), 3);
        assert!(elapsed >= Duration::from_millis(1150), "too fast: {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(1450), "too slow: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_second_attempt() {
        let server = MockServer::start(|_, attempt| {
            if attempt == 1 {
                MockReply::status(200).delay(Duration::from_secs(3))
            } else {
                MockReply::status(200).body("ok")
            }
        })
        .await;

        let response = test_client(200)
            .get_with_retry(&server.url("/flaky"), 2)
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(server.hits("/flaky"), 2);
    }

    #[tokio::test]
    async fn test_http_errors_are_not_retried() {
        let server = MockServer::start(|_, _| MockReply::status(503)).await;

        let response = test_client(2000)
            .get_with_retry(&server.url("/down"), 3)
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 503);
        assert_eq!(server.hits("/down"), 1);
    }

    #[tokio::test]
    async fn test_permanent_errors_return_immediately() {
        let config = Config {
            retry_backoff: Duration::from_secs(5),
            ..Config::new("http://127.0.0.1")
        };
        let client = HttpClient::new(&config).unwrap();

        let start = Instant::now();
        let err = client.get_with_retry("not a url", 3).await.unwrap_err();

        assert!(!is_transient(&err));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        // Grab a free port, then close it again
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = test_client(1000)
            .get_with_retry(&format!("http://{}/x", addr), 1)
            .await
            .unwrap_err();

        assert!(is_transient(&err));
    }

    #[tokio::test]
    async fn test_size_falls_back_to_body_length() {
        let server = MockServer::start(|_, _| {
            MockReply::status(200).body("twelve bytes").without_length()
        })
        .await;

        let response = test_client(2000).get(&server.url("/")).await.unwrap();
        let probe = ProbeResponse::read(response).await;

        assert_eq!(probe.content_length, None);
        assert_eq!(probe.size(), 12);
        assert_eq!(probe.body, b"twelve bytes");
    }
}
