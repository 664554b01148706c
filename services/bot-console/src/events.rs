//! Events published to rendering collaborators

use tokio::sync::broadcast;

use crate::state::BotState;
use crate::types::{LogSnapshot, MarketDataResult};

/// Capacity of the event channel; slow subscribers see `Lagged`
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    /// Bot lifecycle state changed
    StateChanged {
        state: BotState,
        last_error: Option<String>,
    },

    /// A newer log snapshot was applied
    LogsUpdated(LogSnapshot),

    /// Log refresh failed; the previous snapshot is kept
    LogsFailed { message: String },

    MarketData(MarketDataResult),

    ChatReply(String),
}

/// Cloneable publisher handle shared by the console components
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ConsoleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.tx.subscribe()
    }

    /// Publish to current subscribers; having none is fine
    pub fn publish(&self, event: ConsoleEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
