//! Log Poller - keeps the latest `/logs` snapshot
//!
//! Refreshes come from three places: the bot controller after every terminal
//! transition, the auto-poll task, and manual calls. They can overlap, so each
//! request takes a sequence number when it is issued and only a result newer
//! than the applied one is kept.

use reqwest::Method;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::events::{ConsoleEvent, EventBus};
use crate::state::Liveness;
use crate::transport::Transport;
use crate::types::{from_value, LogSnapshot, LogsResponse};

const LOGS_PATH: &str = "/logs";

/// What a renderer needs to draw the log pane
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogView {
    pub snapshot: Option<LogSnapshot>,
    /// Set when the newest refresh failed; cleared by a newer success
    pub error: Option<String>,
    snapshot_seq: u64,
    error_seq: u64,
}

pub struct LogPoller {
    transport: Arc<dyn Transport>,
    events: EventBus,
    alive: Liveness,
    next_seq: AtomicU64,
    view: watch::Sender<LogView>,
}

impl LogPoller {
    pub fn new(transport: Arc<dyn Transport>, events: EventBus, alive: Liveness) -> Self {
        let (view, _rx) = watch::channel(LogView::default());
        Self {
            transport,
            events,
            alive,
            next_seq: AtomicU64::new(0),
            view,
        }
    }

    /// Fetch `/logs` once and apply the result if it is the newest one
    pub async fn refresh(&self) -> Result<LogSnapshot, TransportError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Log refresh #{} issued", seq);

        let outcome = self.fetch(seq).await;

        if !self.alive.is_alive() {
            debug!("Console torn down, discarding log refresh #{}", seq);
            return outcome;
        }

        match &outcome {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(e) => self.apply_failure(seq, e),
        }
        outcome
    }

    async fn fetch(&self, seq: u64) -> Result<LogSnapshot, TransportError> {
        let value = self.transport.request(Method::GET, LOGS_PATH, None).await?;
        let resp: LogsResponse = from_value(value)?;
        Ok(LogSnapshot {
            text: resp.logs,
            fetched_at: chrono::Utc::now(),
            seq,
        })
    }

    fn apply_snapshot(&self, snapshot: &LogSnapshot) {
        let events = &self.events;
        let applied = self.view.send_if_modified(|view| {
            if snapshot.seq <= view.snapshot_seq {
                return false;
            }
            view.snapshot = Some(snapshot.clone());
            view.snapshot_seq = snapshot.seq;
            if snapshot.seq > view.error_seq {
                view.error = None;
            }
            // publish under the view lock so event order matches apply order
            events.publish(ConsoleEvent::LogsUpdated(snapshot.clone()));
            true
        });

        if !applied {
            debug!("Dropping stale log refresh #{}", snapshot.seq);
        }
    }

    fn apply_failure(&self, seq: u64, err: &TransportError) {
        warn!("Log refresh #{} failed: {}", seq, err);
        let events = &self.events;
        self.view.send_if_modified(|view| {
            if seq <= view.snapshot_seq || seq <= view.error_seq {
                return false;
            }
            let message = err.to_string();
            view.error = Some(message.clone());
            view.error_seq = seq;
            events.publish(ConsoleEvent::LogsFailed { message });
            true
        });
    }

    pub fn view(&self) -> LogView {
        self.view.borrow().clone()
    }

    pub fn snapshot(&self) -> Option<LogSnapshot> {
        self.view.borrow().snapshot.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.view.borrow().error.clone()
    }

    /// Watch the log view without going through the event stream
    pub fn watch(&self) -> watch::Receiver<LogView> {
        self.view.subscribe()
    }
}

/// Handle to the interval refresh task. Cancelled on drop.
pub struct PollTask {
    handle: JoinHandle<()>,
    period: Duration,
}

impl PollTask {
    /// Spawn the auto-poll loop; the first refresh fires immediately
    pub fn spawn(poller: Arc<LogPoller>, period: Duration) -> Self {
        info!("Starting log auto-poll every {:?}", period);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !poller.alive.is_alive() {
                    debug!("Console torn down, auto-poll exiting");
                    break;
                }
                if let Err(e) = poller.refresh().await {
                    debug!("Auto-poll refresh error: {}", e);
                }
            }
        });

        Self { handle, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(self) {
        self.handle.abort();
        info!("Log auto-poll cancelled");
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
