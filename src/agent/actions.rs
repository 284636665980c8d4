//! Immutable per-tier action templates and action-category routing.
//!
//! Action ids follow the `{category}_{tier}` convention carried on the wire
//! (`mint_nft_premium`, `view_gallery_vip`, ...). Routing parses the id into
//! a tagged [`ActionCategory`] once at the boundary; the raw id is kept for
//! logging and error messages only.

use crate::agent::types::{AccessTier, Action, ActionStyle};

/// Category an action id routes to. Detection is by substring containment,
/// matching how ids are composed, not exact equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Gallery,
    Mint,
    Community,
    Provenance,
    Concierge,
}

impl ActionCategory {
    pub fn detect(action_id: &str) -> Option<Self> {
        if action_id.contains("view_gallery") {
            Some(Self::Gallery)
        } else if action_id.contains("mint_nft") {
            Some(Self::Mint)
        } else if action_id.contains("join_community") {
            Some(Self::Community)
        } else if action_id.contains("submit_provenance") {
            Some(Self::Provenance)
        } else if action_id.contains("custom_action") {
            Some(Self::Concierge)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gallery => "gallery",
            Self::Mint => "mint",
            Self::Community => "community",
            Self::Provenance => "provenance",
            Self::Concierge => "concierge",
        }
    }
}

/// Per-tier action templates, built once and injected wherever menus are
/// composed or action ids resolved.
pub struct ActionTemplates {
    basic: Vec<Action>,
    premium: Vec<Action>,
    vip: Vec<Action>,
}

fn action(id: &str, label: &str, style: ActionStyle) -> Action {
    Action {
        id: id.to_string(),
        label: label.to_string(),
        image_url: None,
        style,
    }
}

impl ActionTemplates {
    pub fn new() -> Self {
        Self {
            basic: vec![
                action(
                    "view_gallery_basic",
                    "Browse Public Gallery",
                    ActionStyle::Primary,
                ),
                action(
                    "join_community_basic",
                    "Join the Community",
                    ActionStyle::Secondary,
                ),
            ],
            premium: vec![
                action(
                    "view_gallery_premium",
                    "Enter Members Gallery",
                    ActionStyle::Primary,
                ),
                action(
                    "mint_nft_premium",
                    "Mint a Members Pass",
                    ActionStyle::Primary,
                ),
                action(
                    "submit_provenance_premium",
                    "Record Piece Provenance",
                    ActionStyle::Secondary,
                ),
            ],
            vip: vec![
                action(
                    "view_gallery_vip",
                    "Enter Vault Gallery",
                    ActionStyle::Primary,
                ),
                action(
                    "mint_nft_vip",
                    "Mint a Patron Edition",
                    ActionStyle::Primary,
                ),
                action(
                    "submit_provenance_vip",
                    "Record Piece Provenance",
                    ActionStyle::Secondary,
                ),
                action("custom_action_vip", "VIP Concierge", ActionStyle::Secondary),
            ],
        }
    }

    /// Actions offered to a tier. Basic actions are always a subset of the
    /// premium and vip lists.
    pub fn for_tier(&self, tier: AccessTier) -> Vec<Action> {
        let mut actions = self.basic.clone();
        match tier {
            AccessTier::Basic => {}
            AccessTier::Premium => actions.extend(self.premium.iter().cloned()),
            AccessTier::Vip => actions.extend(self.vip.iter().cloned()),
        }
        actions
    }

    /// Resolve an action by id across all tiers. The registry is global:
    /// action execution does not depend on which menu offered the id.
    pub fn find(&self, action_id: &str) -> Option<&Action> {
        self.basic
            .iter()
            .chain(self.premium.iter())
            .chain(self.vip.iter())
            .find(|action| action.id == action_id)
    }
}

impl Default for ActionTemplates {
    fn default() -> Self {
        Self::new()
    }
}
