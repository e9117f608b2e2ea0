//! HTTP session of a virtual user
//!
//! Wraps the shared `reqwest::Client` and records the outcome of every
//! request into the run statistics. Transport errors and HTTP status codes
//! of 400 and above count as failures.

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::metrics::RequestStats;

/// Response of a completed request
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl Reply {
    /// Status below 400
    pub fn ok(&self) -> bool {
        !(self.status.is_client_error() || self.status.is_server_error())
    }
}

/// Request issuer bound to a base URL and a stats collector
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: reqwest::Client,
    base_url: String,
    stats: Arc<RequestStats>,
}

impl HttpSession {
    pub fn new(client: reqwest::Client, base_url: &str, stats: Arc<RequestStats>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            stats,
        }
    }

    pub fn stats(&self) -> &Arc<RequestStats> {
        &self.stats
    }

    /// GET `path`, recorded under `name` (defaults to the path)
    pub async fn get(&self, path: &str, name: Option<&str>) -> Option<Reply> {
        let request = self.client.get(self.url(path));
        self.send(Method::GET, name.unwrap_or(path), request).await
    }

    /// POST `body` as JSON to `path`, recorded under `name` (defaults to the path)
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        name: Option<&str>,
        body: &T,
    ) -> Option<Reply> {
        let request = self.client.post(self.url(path)).json(body);
        self.send(Method::POST, name.unwrap_or(path), request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send and record. `None` when no response was received.
    async fn send(&self, method: Method, name: &str, request: RequestBuilder) -> Option<Reply> {
        let start = Instant::now();

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("{} {} failed: {}", method, name, e);
                self.stats
                    .record_failure(method.as_str(), name, start.elapsed(), &transport_error(&e));
                return None;
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                debug!("{} {} body read failed: {}", method, name, e);
                self.stats
                    .record_failure(method.as_str(), name, start.elapsed(), &transport_error(&e));
                return None;
            }
        };
        let elapsed = start.elapsed();

        let reply = Reply { status, body };
        if reply.ok() {
            self.stats
                .record_success(method.as_str(), name, elapsed, reply.body.len() as u64);
        } else {
            self.stats
                .record_failure(method.as_str(), name, elapsed, &format!("HTTP {}", status.as_u16()));
        }
        Some(reply)
    }
}

/// Short error class for the failures table
fn transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "timeout".to_string()
    } else if e.is_connect() {
        "connection error".to_string()
    } else if e.is_body() || e.is_decode() {
        "body error".to_string()
    } else {
        e.to_string()
            .split(':')
            .next()
            .unwrap_or("unknown")
            .to_string()
    }
}
