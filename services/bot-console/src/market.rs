//! Market data fetch for a single symbol

use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ConsoleError, Result};
use crate::transport::Transport;
use crate::types::MarketDataResult;

pub struct MarketDataFetcher {
    transport: Arc<dyn Transport>,
}

impl MarketDataFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `GET /market_data/{symbol}`. Each call goes to the backend.
    pub async fn fetch(&self, symbol: &str) -> Result<MarketDataResult> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(ConsoleError::PreconditionViolation(
                "market data symbol is empty".to_string(),
            ));
        }

        let path = format!("/market_data/{}", symbol);
        debug!("Fetching market data for {}", symbol);

        let payload = self
            .transport
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| {
                warn!("Market data fetch for {} failed: {}", symbol, e);
                e
            })?;

        Ok(MarketDataResult {
            symbol: symbol.to_string(),
            payload,
            fetched_at: chrono::Utc::now(),
        })
    }
}
