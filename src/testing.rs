// src/testing.rs
// =============================================================================
// A tiny scripted HTTP/1.1 server for tests.
//
// Each connection serves exactly one request and then closes. The route
// closure receives the request path and how many times that path has been
// requested so far (1 for the first hit), so a test can make the first
// attempt stall and the second one succeed.
// =============================================================================

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

type Route = Arc<dyn Fn(&str, usize) -> MockReply + Send + Sync>;
type Hits = Arc<Mutex<HashMap<String, usize>>>;

#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub delay: Option<Duration>,
    pub declare_length: bool,
}

impl MockReply {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            delay: None,
            declare_length: true,
        }
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Wait before answering (to trigger client timeouts)
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Leave out Content-Length; the body ends when the socket closes
    pub fn without_length(mut self) -> Self {
        self.declare_length = false;
        self
    }
}

pub struct MockServer {
    addr: SocketAddr,
    hits: Hits,
    task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start<F>(route: F) -> Self
    where
        F: Fn(&str, usize) -> MockReply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits: Hits = Arc::new(Mutex::new(HashMap::new()));
        let route: Route = Arc::new(route);

        let task = tokio::spawn({
            let hits = Arc::clone(&hits);
            async move {
                while let Ok((socket, _)) = listener.accept().await {
                    let route = Arc::clone(&route);
                    let hits = Arc::clone(&hits);
                    tokio::spawn(async move {
                        let _ = serve_one(socket, route, hits).await;
                    });
                }
            }
        });

        Self { addr, hits, task }
    }

    /// Base URL without a trailing slash, e.g. http://127.0.0.1:4321
    pub fn base(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base(), path)
    }

    /// How many requests arrived for `path`
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Every path requested at least once
    pub fn paths(&self) -> Vec<String> {
        self.hits.lock().unwrap().keys().cloned().collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_one(socket: TcpStream, route: Route, hits: Hits) -> std::io::Result<()> {
    let mut reader = BufReader::new(socket);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    // Skip the headers; GET requests have no body
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }

    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();

    let attempt = {
        let mut hits = hits.lock().unwrap();
        let count = hits.entry(path.clone()).or_insert(0);
        *count += 1;
        *count
    };

    let reply = route(&path, attempt);
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let mut head = format!("HTTP/1.1 {} Mock\r\nConnection: close\r\n", reply.status);
    if reply.declare_length {
        head.push_str(&format!("Content-Length: {}\r\n", reply.body.len()));
    }
    for (name, value) in &reply.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    let mut socket = reader.into_inner();
    socket.write_all(head.as_bytes()).await?;
    socket.write_all(&reply.body).await?;
    socket.shutdown().await?;
    Ok(())
}
