//! Symbol watch-list submission

use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::TransportError;
use crate::transport::Transport;
use crate::types::{from_value, Ack};

const UPDATE_SYMBOLS_PATH: &str = "/update_symbols";

/// Split on commas, trim, drop empties. Case and duplicates are left alone.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct WatchlistManager {
    transport: Arc<dyn Transport>,
}

impl WatchlistManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Replace the backend watch-list with the symbols in `raw`.
    ///
    /// An empty list is sent as-is and clears the watch-list. Ticker syntax
    /// is not checked here; a backend rejection comes back as
    /// [`TransportError::Http`] with the body untouched.
    pub async fn submit(&self, raw: &str) -> Result<Ack, TransportError> {
        let symbols = parse_symbols(raw);
        let body = json!({ "symbols": symbols });

        match self
            .transport
            .request(Method::POST, UPDATE_SYMBOLS_PATH, Some(body))
            .await
        {
            Ok(value) => {
                let ack: Ack = from_value(value)?;
                info!("Watch-list updated to {:?}: {}", symbols, ack.message);
                Ok(ack)
            }
            Err(e) => {
                warn!("Watch-list update failed: {}", e);
                Err(e)
            }
        }
    }
}
