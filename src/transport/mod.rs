//! Messaging transport collaborator surface.
//!
//! The concrete transport (connect/listen loops, identity, encryption) lives
//! outside this crate. The agent only needs the send primitives below plus a
//! stream of inbound messages, which the transport delivers over an mpsc
//! channel into the dispatcher.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

/// A message received from the transport. Immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub id: String,
    pub content: String,
    pub sender_address: String,
    pub sent_at: DateTime<Utc>,
    pub conversation_id: String,
}

impl InboundMessage {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        sender_address: impl Into<String>,
        conversation_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            sender_address: sender_address.into(),
            sent_at: Utc::now(),
            conversation_id: conversation_id.into(),
        }
    }
}

/// Typed payload envelope selector for structured sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTag {
    Actions,
    WalletSendCalls,
}

impl ContentTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Actions => "actions",
            Self::WalletSendCalls => "walletSendCalls",
        }
    }
}

impl std::fmt::Display for ContentTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound side of the messaging transport.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Plain-text send into a conversation.
    async fn send(&self, conversation_id: &str, text: &str) -> Result<(), TransportError>;

    /// Send text plus a typed structured payload (`actions` or
    /// `walletSendCalls` envelope).
    async fn send_structured(
        &self,
        conversation_id: &str,
        text: &str,
        payload: Value,
        content_tag: ContentTag,
    ) -> Result<(), TransportError>;

    /// Open (or reuse) a direct conversation with an address and send text.
    async fn send_direct(&self, address: &str, text: &str) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_tags_match_wire_labels() {
        assert_eq!(ContentTag::Actions.as_str(), "actions");
        assert_eq!(ContentTag::WalletSendCalls.as_str(), "walletSendCalls");
    }

    #[test]
    fn inbound_message_roundtrips_camel_case() {
        let msg = InboundMessage::new("m1", "gm", "0xaa", "conv-1");
        let value = serde_json::to_value(&msg).expect("message serializes");
        assert_eq!(value["senderAddress"], "0xaa");
        assert_eq!(value["conversationId"], "conv-1");
        let back: InboundMessage = serde_json::from_value(value).expect("message deserializes");
        assert_eq!(back, msg);
    }
}
