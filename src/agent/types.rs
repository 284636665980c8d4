//! Typed artifacts flowing through the message pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access tier granted by NFT holdings. Ordering is total: basic < premium < vip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
    Basic,
    Premium,
    Vip,
}

impl AccessTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Premium => "premium",
            Self::Vip => "vip",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" | "standard" => Some(Self::Basic),
            "premium" => Some(Self::Premium),
            "vip" => Some(Self::Vip),
            _ => None,
        }
    }

    /// Heuristic tier for a collection, from its registry display name.
    pub fn from_collection_name(name: &str) -> Self {
        let lowered = name.to_ascii_lowercase();
        if lowered.contains("vip") || lowered.contains("gold") {
            Self::Vip
        } else if lowered.contains("premium") || lowered.contains("silver") {
            Self::Premium
        } else {
            Self::Basic
        }
    }
}

impl std::fmt::Display for AccessTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified purpose of an inbound message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Greeting,
    NftInquiry,
    GalleryAccess,
    Minting,
    Community,
    Help,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::NftInquiry => "nft_inquiry",
            Self::GalleryAccess => "gallery_access",
            Self::Minting => "minting",
            Self::Community => "community",
            Self::Help => "help",
        }
    }
}

/// Classification result for one message. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Intent {
    pub kind: IntentKind,
    /// Always within [0, 1].
    pub confidence: f64,
    #[serde(default)]
    pub entities: BTreeMap<String, String>,
}

impl Intent {
    pub fn fallback() -> Self {
        Self {
            kind: IntentKind::Help,
            confidence: 0.0,
            entities: BTreeMap::new(),
        }
    }
}

/// Outcome of NFT ownership verification for one sender address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessResult {
    pub has_access: bool,
    pub access_tier: AccessTier,
    /// Owned token ids across all granting collections, in collection order.
    /// Not deduplicated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub token_ids: Vec<String>,
    /// Comma-joined display names of granting collections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AccessResult {
    /// No holdings in any configured collection. A normal outcome, not an error.
    pub fn denied() -> Self {
        Self {
            has_access: false,
            access_tier: AccessTier::Basic,
            token_ids: Vec::new(),
            collection_name: None,
            error: None,
        }
    }

    /// Verification itself failed; sender is treated as basic with no access.
    pub fn denied_with_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::denied()
        }
    }
}

/// Visual weight of an action button.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionStyle {
    Primary,
    Secondary,
}

/// One selectable entry in an action menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub style: ActionStyle,
}

/// Expiring, structured set of selectable actions.
///
/// Serializes directly to the `actions` wire envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionMenu {
    pub id: String,
    pub description: String,
    pub actions: Vec<Action>,
    pub expires_at: DateTime<Utc>,
}

/// Response metadata surfaced alongside the composed text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub nft_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    pub access_tier: AccessTier,
}

/// Fully composed reply for one inbound message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentResponse {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<ActionMenu>,
    pub meta: ResponseMeta,
}
