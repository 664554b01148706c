//! Scripted transport for driving the console without a backend

#![allow(dead_code)]

use async_trait::async_trait;
use bot_console::{ConsoleEvent, Transport, TransportError};
use reqwest::Method;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};

type Reply = Result<Value, TransportError>;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Transport whose responses are set per path by the test.
///
/// `hold(path)` parks the next request to `path` until the returned sender
/// fires, which lets a test pick the completion order of overlapping calls.
pub struct ScriptedTransport {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<HashMap<String, Reply>>,
    held: Mutex<HashMap<String, VecDeque<oneshot::Receiver<Reply>>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(HashMap::new()),
            held: Mutex::new(HashMap::new()),
        }
    }

    /// Default reply for every request to `path`
    pub fn respond(&self, path: &str, reply: Reply) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), reply);
    }

    /// Park the next request to `path` until the sender is used
    pub fn hold(&self, path: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.held
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path == path)
            .count()
    }

    /// Yield until `n` requests to `path` have been issued
    pub async fn wait_for_calls(&self, path: &str, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.calls_to(path) < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("timed out waiting for scripted calls");
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Reply {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });

        let held = self
            .held
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|queue| queue.pop_front());
        if let Some(rx) = held {
            return rx
                .await
                .unwrap_or_else(|_| Err(TransportError::Network("reply dropped".to_string())));
        }

        self.responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| {
                Err(TransportError::Network(format!(
                    "no scripted response for {}",
                    path
                )))
            })
    }
}

/// Everything published so far
pub fn drain(rx: &mut broadcast::Receiver<ConsoleEvent>) -> Vec<ConsoleEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
