//! Bot Control - lifecycle commands against the backend strategy
//!
//! The state check and the move into `Starting`/`Stopping` happen in one step
//! on the status channel, before the request goes out. A second command
//! arriving while one is in flight therefore sees the in-flight state and is
//! rejected without touching the network. Commands of the opposite kind are
//! rejected the same way; nothing is queued.

use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result, TransportError};
use crate::events::{ConsoleEvent, EventBus};
use crate::poller::LogPoller;
use crate::state::{BotState, BotStatus, Liveness};
use crate::transport::Transport;
use crate::types::{from_value, Ack};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Stop,
}

impl Command {
    fn allowed_from(self, state: BotState) -> bool {
        match self {
            Command::Start => matches!(state, BotState::Idle | BotState::Error),
            Command::Stop => state == BotState::Running,
        }
    }

    fn in_flight(self) -> BotState {
        match self {
            Command::Start => BotState::Starting,
            Command::Stop => BotState::Stopping,
        }
    }

    fn on_success(self) -> BotState {
        match self {
            Command::Start => BotState::Running,
            Command::Stop => BotState::Idle,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start => f.write_str("start"),
            Command::Stop => f.write_str("stop"),
        }
    }
}

/// Recorded as `last_error` when a command future is dropped mid-request
pub const CANCELLED: &str = "command cancelled";

/// Owns the bot lifecycle state
pub struct BotController {
    transport: Arc<dyn Transport>,
    poller: Arc<LogPoller>,
    events: EventBus,
    alive: Liveness,
    start_path: String,
    stop_path: String,
    status: watch::Sender<BotStatus>,
}

impl BotController {
    pub fn new(
        config: &ConsoleConfig,
        transport: Arc<dyn Transport>,
        poller: Arc<LogPoller>,
        events: EventBus,
        alive: Liveness,
    ) -> Self {
        let (status, _rx) = watch::channel(BotStatus::default());
        Self {
            transport,
            poller,
            events,
            alive,
            start_path: config.start_path(),
            stop_path: config.stop_path(),
            status,
        }
    }

    /// Start the strategy. Allowed from `Idle` and `Error`.
    pub async fn start(&self) -> Result<Ack> {
        self.run(Command::Start).await
    }

    /// Stop the strategy. Allowed from `Running` only.
    pub async fn stop(&self) -> Result<Ack> {
        self.run(Command::Stop).await
    }

    /// Acknowledge a failure and return to `Idle` without contacting the backend
    pub fn reset(&self) -> Result<()> {
        let mut current = BotState::Error;
        let events = &self.events;
        let reset = self.status.send_if_modified(|status| {
            current = status.state;
            if status.state != BotState::Error {
                return false;
            }
            status.state = BotState::Idle;
            status.last_error = None;
            events.publish(state_changed(status));
            true
        });

        if reset {
            info!("Bot state reset: Error -> Idle");
            Ok(())
        } else {
            Err(ConsoleError::PreconditionViolation(format!(
                "reset requires Error state, bot is {}",
                current
            )))
        }
    }

    async fn run(&self, command: Command) -> Result<Ack> {
        let guard = self.begin(command)?;

        let path = match command {
            Command::Start => &self.start_path,
            Command::Stop => &self.stop_path,
        };
        info!("Sending {} command: POST {}", command, path);
        let outcome = self.transport.request(Method::POST, path, None).await;
        guard.disarm();

        self.finish(command, outcome).await
    }

    /// Check the precondition and enter the in-flight state atomically
    fn begin(&self, command: Command) -> Result<InFlight<'_>> {
        let mut current = BotState::Idle;
        let events = &self.events;
        let entered = self.status.send_if_modified(|status| {
            current = status.state;
            if !command.allowed_from(status.state) {
                return false;
            }
            status.state = command.in_flight();
            status.last_error = None;
            events.publish(state_changed(status));
            true
        });

        if entered {
            info!("Bot state: {} -> {}", current, command.in_flight());
            Ok(InFlight {
                controller: self,
                command,
                armed: true,
            })
        } else {
            warn!("Rejected {} command while bot is {}", command, current);
            Err(ConsoleError::PreconditionViolation(format!(
                "cannot {} while bot is {}",
                command, current
            )))
        }
    }

    async fn finish(
        &self,
        command: Command,
        outcome: std::result::Result<Value, TransportError>,
    ) -> Result<Ack> {
        let result = outcome.and_then(from_value::<Ack>);

        if !self.alive.is_alive() {
            debug!("Console torn down, discarding {} response", command);
            return result.map_err(ConsoleError::from);
        }

        match &result {
            Ok(ack) => {
                info!("{} command accepted: {}", command, ack.message);
                self.transition(command.on_success(), None);
            }
            Err(e) => {
                error!("{} command failed: {}", command, e);
                self.transition(BotState::Error, Some(e.detail()));
            }
        }

        // refresh even on failure so the operator can see why
        if let Err(e) = self.poller.refresh().await {
            warn!("Log refresh after {} failed: {}", command, e);
        }

        result.map_err(ConsoleError::from)
    }

    fn transition(&self, next: BotState, last_error: Option<String>) {
        let events = &self.events;
        self.status.send_if_modified(|status| {
            if !status.state.can_transition_to(next) {
                error!("Illegal bot state transition {} -> {}", status.state, next);
                return false;
            }
            info!("Bot state: {} -> {}", status.state, next);
            status.state = next;
            status.last_error = last_error;
            events.publish(state_changed(status));
            true
        });
    }

    pub fn status(&self) -> BotStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> BotState {
        self.status.borrow().state
    }

    pub fn last_error(&self) -> Option<String> {
        self.status.borrow().last_error.clone()
    }

    pub fn watch(&self) -> watch::Receiver<BotStatus> {
        self.status.subscribe()
    }
}

/// Held while a command request is outstanding.
///
/// If the command future is dropped before the backend answers, the bot moves
/// to `Error` so a later `start()` or `reset()` can recover it.
struct InFlight<'a> {
    controller: &'a BotController,
    command: Command,
    armed: bool,
}

impl InFlight<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed || !self.controller.alive.is_alive() {
            return;
        }
        warn!("{} command cancelled before the backend answered", self.command);
        self.controller
            .transition(BotState::Error, Some(CANCELLED.to_string()));
    }
}

fn state_changed(status: &BotStatus) -> ConsoleEvent {
    ConsoleEvent::StateChanged {
        state: status.state,
        last_error: status.last_error.clone(),
    }
}
