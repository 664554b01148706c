//! Error types for the console

/// Outcome classification for a single backend request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (refused, DNS, timeout, cut body)
    #[error("Backend unreachable: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status
    #[error("Backend returned HTTP {status}: {}", detail_or_status(*status, body))]
    Http { status: u16, body: String },

    /// 2xx response whose body is not the expected JSON
    #[error("Malformed backend response: {0}")]
    Decode(String),
}

impl TransportError {
    /// HTTP status, if the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human readable reason.
    ///
    /// FastAPI rejections carry `{"detail": ...}` and the log endpoint uses
    /// `{"error": ...}`; either is preferred over the raw body.
    pub fn detail(&self) -> String {
        match self {
            TransportError::Http { status, body } => detail_or_status(*status, body),
            TransportError::Network(msg) | TransportError::Decode(msg) => msg.clone(),
        }
    }
}

fn detail_or_status(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("status {}", status)
    } else {
        trimmed.to_string()
    }
}

/// Errors surfaced by console operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsoleError {
    /// Operation is illegal for the current state; nothing was sent
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ConsoleError {
    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, ConsoleError::PreconditionViolation(_))
    }

    /// Underlying transport failure, if any
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            ConsoleError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ConsoleError {
    fn from(e: config::ConfigError) -> Self {
        ConsoleError::Config(e.to_string())
    }
}

/// Result type for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;
