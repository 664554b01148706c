//! Bot Console Library
//!
//! Client-side control surface for the strategy backend: start/stop the
//! strategy, keep the operational logs fresh, push the symbol watch-list and
//! fetch market data and chat replies.

pub mod chat;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod events;
pub mod market;
pub mod poller;
pub mod state;
pub mod transport;
pub mod types;
pub mod watchlist;

// Re-export main types for convenience
pub use crate::config::ConsoleConfig;
pub use console::BotConsole;
pub use error::{ConsoleError, TransportError};
pub use events::ConsoleEvent;
pub use poller::{LogPoller, LogView, PollTask};
pub use state::{BotState, BotStatus, Liveness};
pub use transport::{HttpTransport, Transport};
pub use types::{Ack, LogSnapshot, MarketDataResult};
