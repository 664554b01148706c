//! Backend transport
//!
//! One request in, one classified outcome out. No retries: callers decide.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use std::fmt;
use tracing::{debug, warn};

use crate::error::TransportError;

/// Seam between the console components and the backend
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a single request against `path` on the backend origin
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError>;
}

/// reqwest-backed transport against a fixed origin
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport; `timeout` of `None` leaves requests unbounded
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut req = self.client.request(method, &url);
        if let Some(body) = &body {
            // sets Content-Type: application/json
            req = req.json(body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_error(status.as_u16(), response.text().await));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        decode_body(&bytes)
    }
}

/// Non-2xx outcome; an unreadable body is logged and kept empty
fn http_error<E: fmt::Display>(status: u16, body: Result<String, E>) -> TransportError {
    let body = body.unwrap_or_else(|e| {
        warn!("Could not read HTTP {} error body: {}", status, e);
        String::new()
    });
    TransportError::Http { status, body }
}

/// Parse a 2xx body; empty bodies decode to `null`
pub(crate) fn decode_body(bytes: &[u8]) -> Result<Value, TransportError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| TransportError::Decode(e.to_string()))
}
