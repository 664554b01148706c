//! Wire and snapshot types shared across the console

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

/// Backend acknowledgement: `{ "message": "..." }`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Ack {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogsResponse {
    pub logs: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Latest `/logs` body, replaced wholesale on each successful poll
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogSnapshot {
    pub text: String,
    pub fetched_at: DateTime<Utc>,
    /// Sequence number of the request that produced this snapshot
    pub seq: u64,
}

/// One market data fetch; never cached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketDataResult {
    pub symbol: String,
    pub payload: Value,
    pub fetched_at: DateTime<Utc>,
}

/// Decode a JSON value into a typed response
pub(crate) fn from_value<T: serde::de::DeserializeOwned>(
    value: Value,
) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
}
