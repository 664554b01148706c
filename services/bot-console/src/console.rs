//! Bot Console - the client session
//!
//! Owns every component plus the event channel, the liveness flag and the
//! auto-poll task. Renderers subscribe to [`ConsoleEvent`]s and read state
//! through the accessors; nothing here draws anything.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

use crate::chat::ChatRelay;
use crate::config::ConsoleConfig;
use crate::controller::BotController;
use crate::error::{ConsoleError, Result};
use crate::events::{ConsoleEvent, EventBus};
use crate::market::MarketDataFetcher;
use crate::poller::{LogPoller, LogView, PollTask};
use crate::state::{BotState, BotStatus, Liveness};
use crate::transport::{HttpTransport, Transport};
use crate::types::{Ack, LogSnapshot, MarketDataResult};
use crate::watchlist::WatchlistManager;

pub struct BotConsole {
    config: ConsoleConfig,
    events: EventBus,
    alive: Liveness,
    poller: Arc<LogPoller>,
    controller: BotController,
    watchlist: WatchlistManager,
    market: MarketDataFetcher,
    chat: ChatRelay,
    poll_task: Mutex<Option<PollTask>>,
}

impl BotConsole {
    /// Create a console talking HTTP to `config.backend_url`
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        let config = config.normalized()?;
        let transport = HttpTransport::new(&config.backend_url, config.request_timeout())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a console over any transport
    pub fn with_transport(config: ConsoleConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let config = config.normalized()?;
        let events = EventBus::new();
        let alive = Liveness::new();

        let poller = Arc::new(LogPoller::new(
            transport.clone(),
            events.clone(),
            alive.clone(),
        ));
        let controller = BotController::new(
            &config,
            transport.clone(),
            poller.clone(),
            events.clone(),
            alive.clone(),
        );

        info!(
            "Bot console ready: backend={}, strategy={}",
            config.backend_url, config.strategy
        );

        Ok(Self {
            watchlist: WatchlistManager::new(transport.clone()),
            market: MarketDataFetcher::new(transport.clone()),
            chat: ChatRelay::new(transport),
            config,
            events,
            alive,
            poller,
            controller,
            poll_task: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Subscribe to state, log, market data and chat events
    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.events.subscribe()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.is_alive()
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.alive.is_alive() {
            Ok(())
        } else {
            Err(ConsoleError::PreconditionViolation(
                "console has been shut down".to_string(),
            ))
        }
    }

    // Bot control

    pub async fn start(&self) -> Result<Ack> {
        self.ensure_alive()?;
        self.controller.start().await
    }

    pub async fn stop(&self) -> Result<Ack> {
        self.ensure_alive()?;
        self.controller.stop().await
    }

    pub fn reset(&self) -> Result<()> {
        self.ensure_alive()?;
        self.controller.reset()
    }

    pub fn status(&self) -> BotStatus {
        self.controller.status()
    }

    pub fn state(&self) -> BotState {
        self.controller.state()
    }

    pub fn last_error(&self) -> Option<String> {
        self.controller.last_error()
    }

    pub fn watch_status(&self) -> tokio::sync::watch::Receiver<BotStatus> {
        self.controller.watch()
    }

    // Logs

    pub async fn refresh_logs(&self) -> Result<LogSnapshot> {
        self.ensure_alive()?;
        Ok(self.poller.refresh().await?)
    }

    pub fn logs(&self) -> Option<LogSnapshot> {
        self.poller.snapshot()
    }

    pub fn logs_error(&self) -> Option<String> {
        self.poller.error()
    }

    pub fn log_view(&self) -> LogView {
        self.poller.view()
    }

    /// Start (or restart) auto-polling; `None` uses the configured interval
    pub fn start_polling(&self, period: Option<Duration>) -> Result<()> {
        self.ensure_alive()?;
        let period = period.unwrap_or_else(|| self.config.poll_interval());
        if period.is_zero() {
            return Err(ConsoleError::PreconditionViolation(
                "poll interval must be positive".to_string(),
            ));
        }

        let mut slot = self.poll_slot();
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
        *slot = Some(PollTask::spawn(self.poller.clone(), period));
        Ok(())
    }

    /// Cancel auto-polling; returns whether a task was running
    pub fn stop_polling(&self) -> bool {
        match self.poll_slot().take() {
            Some(task) => {
                task.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll_slot()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    fn poll_slot(&self) -> MutexGuard<'_, Option<PollTask>> {
        // a panic while holding the slot leaves a valid Option behind
        self.poll_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Watch-list, market data, chat

    pub async fn submit_symbols(&self, raw: &str) -> Result<Ack> {
        self.ensure_alive()?;
        Ok(self.watchlist.submit(raw).await?)
    }

    pub async fn fetch_market_data(&self, symbol: &str) -> Result<MarketDataResult> {
        self.ensure_alive()?;
        let result = self.market.fetch(symbol).await?;
        if self.alive.is_alive() {
            self.events.publish(ConsoleEvent::MarketData(result.clone()));
        }
        Ok(result)
    }

    pub async fn send_chat(&self, message: &str) -> Result<String> {
        self.ensure_alive()?;
        let reply = self.chat.send(message).await?;
        if self.alive.is_alive() {
            self.events.publish(ConsoleEvent::ChatReply(reply.clone()));
        }
        Ok(reply)
    }

    /// Tear the session down: cancel the poll timer and discard late results
    pub fn shutdown(&self) {
        if !self.alive.is_alive() {
            return;
        }
        self.alive.kill();
        self.stop_polling();
        info!("Bot console shut down");
    }
}

impl Drop for BotConsole {
    fn drop(&mut self) {
        self.alive.kill();
    }
}
