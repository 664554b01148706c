//! Console Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConsoleError, Result};

/// Default backend origin (the FastAPI control plane)
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default strategy routing suffix
pub const DEFAULT_STRATEGY: &str = "lumibot_trend";

/// Default auto-poll interval for `/logs`
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Environment prefix for overrides, e.g. `BOT_CONSOLE_BACKEND_URL`
const ENV_PREFIX: &str = "BOT_CONSOLE";

/// Console configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ConsoleConfig {
    /// Backend origin, without trailing slash
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Opaque suffix for `/start_<strategy>` and `/stop_<strategy>`
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Per-request timeout; `None` means no timeout
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            strategy: default_strategy(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: None,
        }
    }
}

impl ConsoleConfig {
    /// Load defaults, then apply `BOT_CONSOLE_*` environment overrides
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("backend_url", DEFAULT_BACKEND_URL)?
            .set_default("strategy", DEFAULT_STRATEGY)?
            .set_default("poll_interval_secs", DEFAULT_POLL_INTERVAL_SECS as i64)?
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: ConsoleConfig = settings.try_deserialize()?;
        config.normalized()
    }

    /// Config pointing at a specific backend, defaults elsewhere
    pub fn with_backend(backend_url: &str) -> Self {
        Self {
            backend_url: backend_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, strategy: &str) -> Self {
        self.strategy = strategy.to_string();
        self
    }

    /// Trim the origin and reject values the client cannot route with
    pub fn normalized(mut self) -> Result<Self> {
        self.backend_url = self.backend_url.trim().trim_end_matches('/').to_string();
        self.strategy = self.strategy.trim().to_string();

        if self.backend_url.is_empty() {
            return Err(ConsoleError::Config("backend_url is empty".to_string()));
        }
        if self.strategy.is_empty() {
            return Err(ConsoleError::Config("strategy is empty".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConsoleError::Config(
                "poll_interval_secs must be positive".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn start_path(&self) -> String {
        format!("/start_{}", self.strategy)
    }

    pub fn stop_path(&self) -> String {
        format!("/stop_{}", self.strategy)
    }
}

fn default_backend_url() -> String { DEFAULT_BACKEND_URL.to_string() }
fn default_strategy() -> String { DEFAULT_STRATEGY.to_string() }
fn default_poll_interval_secs() -> u64 { DEFAULT_POLL_INTERVAL_SECS }
