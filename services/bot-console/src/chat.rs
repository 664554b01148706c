//! Chat relay to the backend advisor endpoint

use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ConsoleError, Result};
use crate::transport::Transport;
use crate::types::{from_value, ChatResponse};

const CHAT_PATH: &str = "/chat";

/// Reply used when the backend answers without any text
pub const FALLBACK_REPLY: &str = "Sorry, I could not understand your question.";

pub struct ChatRelay {
    transport: Arc<dyn Transport>,
}

impl ChatRelay {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send one message and return the reply text
    pub async fn send(&self, message: &str) -> Result<String> {
        if message.trim().is_empty() {
            return Err(ConsoleError::PreconditionViolation(
                "chat message is empty".to_string(),
            ));
        }

        let body = json!({ "message": message });

        let value = self
            .transport
            .request(Method::POST, CHAT_PATH, Some(body))
            .await
            .map_err(|e| {
                warn!("Chat request failed: {}", e);
                e
            })?;

        let resp: ChatResponse = if value.is_null() {
            ChatResponse::default()
        } else {
            from_value(value)?
        };

        let reply = resp
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());
        debug!("Chat reply: {} chars", reply.len());

        Ok(reply)
    }
}
