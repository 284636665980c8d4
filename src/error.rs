//! Error types for Curio.

use serde::Serialize;

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Transaction build error: {0}")]
    TxBuild(#[from] TxBuildError),
}

/// Pipeline stage a message has reached, for status reporting and logs.
///
/// A message advances Received -> Classified -> Verified -> Composed -> Sent;
/// `Error` is terminal and reachable from every stage.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageStage {
    Received,
    Classified,
    Verified,
    Composed,
    Sent,
    Error,
}

impl MessageStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Classified => "classified",
            Self::Verified => "verified",
            Self::Composed => "composed",
            Self::Sent => "sent",
            Self::Error => "error",
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blockchain read errors.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("RPC call {method} failed: {reason}")]
    Rpc { method: String, reason: String },

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Malformed RPC response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Messaging transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to send to conversation {conversation_id}: {reason}")]
    SendFailed {
        conversation_id: String,
        reason: String,
    },

    #[error("Failed to send structured '{content_tag}' payload to {conversation_id}: {reason}")]
    StructuredSendFailed {
        conversation_id: String,
        content_tag: String,
        reason: String,
    },

    #[error("Failed to send direct message to {address}: {reason}")]
    DirectSendFailed { address: String, reason: String },

    #[error("Transport disconnected: {0}")]
    Disconnected(String),
}

/// Action-execution errors.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Action '{id}' not found")]
    NotFound { id: String },

    #[error("Action '{id}' requires {required} tier or above")]
    NotAuthorized { id: String, required: String },
}

/// Transaction construction errors.
#[derive(Debug, thiserror::Error)]
pub enum TxBuildError {
    #[error("Invalid recipient address '{0}'")]
    InvalidAddress(String),

    #[error("Call data encoding failed: {0}")]
    Encode(String),

    #[error("No contract configured for {category}")]
    MissingContract { category: String },
}

/// Result type alias for the agent.
pub type Result<T> = std::result::Result<T, Error>;
