//! Best-effort side-channel notifications.
//!
//! Some flows want to ping an external surface (ops channel, email bridge)
//! after a user-facing action completes. The core never depends on a
//! concrete backend: callers hold a `dyn Notifier`, failures are logged and
//! never escalated, and the default implementation does nothing.

use async_trait::async_trait;

use crate::error::TransportError;

/// Post-success notification event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyEvent {
    MintPrepared { address: String, tier: String },
    ProvenancePrepared { address: String, token_id: String },
    CommunityJoined { address: String },
    ConciergeRequested { address: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: NotifyEvent) -> Result<(), TransportError>;
}

/// Default notifier: drops every event.
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _event: NotifyEvent) -> Result<(), TransportError> {
        Ok(())
    }
}
