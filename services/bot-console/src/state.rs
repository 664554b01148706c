//! Bot lifecycle state

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle of the single strategy instance on the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BotState {
    #[default]
    Idle,
    /// `POST /start_<strategy>` in flight
    Starting,
    Running,
    /// `POST /stop_<strategy>` in flight
    Stopping,
    Error,
}

impl BotState {
    /// Legal edges of the state machine
    pub fn can_transition_to(self, next: BotState) -> bool {
        use BotState::*;
        matches!(
            (self, next),
            (Idle, Starting)
                | (Error, Starting)
                | (Starting, Running)
                | (Starting, Error)
                | (Running, Stopping)
                | (Stopping, Idle)
                | (Stopping, Error)
                | (Error, Idle)
        )
    }

    /// A command is awaiting its response
    pub fn is_in_flight(self) -> bool {
        matches!(self, BotState::Starting | BotState::Stopping)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BotState::Idle => "Idle",
            BotState::Starting => "Starting",
            BotState::Running => "Running",
            BotState::Stopping => "Stopping",
            BotState::Error => "Error",
        }
    }
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State plus the reason for the last failure
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BotStatus {
    pub state: BotState,
    pub last_error: Option<String>,
}

/// Session liveness flag; results arriving after teardown are discarded
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn kill(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}
