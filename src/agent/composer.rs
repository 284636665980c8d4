//! Tiered response composition.
//!
//! `compose` is a pure function of the classified intent and the access
//! result: it picks the per-intent copy, builds the expiring action menu for
//! the effective tier, and always appends a numbered plain-text fallback so
//! text-only clients can still select actions.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::agent::actions::ActionTemplates;
use crate::agent::types::{
    AccessResult, AccessTier, ActionMenu, AgentResponse, Intent, IntentKind, ResponseMeta,
};

/// Horizon after which a delivered action menu is considered stale.
const MENU_EXPIRY_HOURS: i64 = 24;

pub struct ResponseComposer {
    templates: Arc<ActionTemplates>,
}

impl ResponseComposer {
    pub fn new(templates: Arc<ActionTemplates>) -> Self {
        Self { templates }
    }

    pub fn compose(&self, intent: &Intent, access: &AccessResult) -> AgentResponse {
        let tier = if access.has_access {
            access.access_tier
        } else {
            AccessTier::Basic
        };

        let menu = ActionMenu {
            id: format!("{}_{}", intent.kind.as_str(), Utc::now().timestamp()),
            description: menu_description(intent.kind, tier),
            actions: self.templates.for_tier(tier),
            expires_at: Utc::now() + Duration::hours(MENU_EXPIRY_HOURS),
        };

        let fallback = fallback_text(&menu);
        let primary = primary_content(intent, access, tier);
        let content = format!("{primary}\n\n{fallback}");

        AgentResponse {
            content,
            meta: ResponseMeta {
                nft_verified: access.has_access,
                collection_name: access.collection_name.clone(),
                access_tier: tier,
            },
            menu: Some(menu),
        }
    }
}

fn menu_description(kind: IntentKind, tier: AccessTier) -> String {
    match kind {
        IntentKind::GalleryAccess => format!("Choose a gallery to visit ({tier} access):"),
        IntentKind::Minting => format!("Minting options ({tier} tier):"),
        IntentKind::Community => format!("Community actions ({tier} tier):"),
        IntentKind::Greeting | IntentKind::NftInquiry | IntentKind::Help => {
            "Select an action:".to_string()
        }
    }
}

/// Plain-text rendering of the menu: description, one numbered line per
/// action in menu order, then the reply instruction.
fn fallback_text(menu: &ActionMenu) -> String {
    let mut lines = Vec::with_capacity(menu.actions.len() + 2);
    lines.push(menu.description.clone());
    for (index, action) in menu.actions.iter().enumerate() {
        lines.push(format!("[{}] {}", index + 1, action.label));
    }
    lines.push("Reply with a number to choose.".to_string());
    lines.join("\n")
}

fn collection_display(access: &AccessResult) -> &str {
    access.collection_name.as_deref().unwrap_or("your collection")
}

fn primary_content(intent: &Intent, access: &AccessResult, tier: AccessTier) -> String {
    match intent.kind {
        IntentKind::Greeting => {
            if access.has_access {
                format!(
                    "Welcome back, verified collector! Your {} holdings open the door. \
                     Here is what I can do for you.",
                    collection_display(access)
                )
            } else {
                "Welcome to Curio! I could not find a membership pass in your wallet yet, \
                 so you are browsing as a guest."
                    .to_string()
            }
        }
        IntentKind::NftInquiry => {
            if access.has_access {
                format!(
                    "You hold {} piece(s) across {}. That puts you at the {} tier.",
                    access.token_ids.len(),
                    collection_display(access),
                    tier
                )
            } else {
                "I checked every collection I watch and found no pieces in your wallet. \
                 Minting a pass is the quickest way in."
                    .to_string()
            }
        }
        IntentKind::GalleryAccess => {
            if access.has_access {
                match tier {
                    AccessTier::Vip => {
                        "The vault gallery is open to you: our rarest pieces, \
                         patron commentary included."
                            .to_string()
                    }
                    AccessTier::Premium => {
                        "The members gallery is open to you, including the current \
                         rotating exhibit."
                            .to_string()
                    }
                    AccessTier::Basic => {
                        "Your pass opens the collectors gallery; premium rooms unlock \
                         at higher tiers."
                            .to_string()
                    }
                }
            } else {
                "The public gallery is open to everyone. Member rooms unlock once you \
                 hold a pass from one of our collections."
                    .to_string()
            }
        }
        IntentKind::Minting => {
            if access.has_access {
                if tier > AccessTier::Basic {
                    format!(
                        "You are cleared to mint at the {tier} tier. I can prepare the \
                         transaction for your wallet to sign."
                    )
                } else {
                    "You hold a pass already; tier upgrades are minted from the premium \
                     series once you are eligible."
                        .to_string()
                }
            } else {
                "Minting member editions is reserved for pass holders. Pick up a pass \
                 from any of our collections to unlock it."
                    .to_string()
            }
        }
        IntentKind::Community => {
            if access.has_access {
                format!(
                    "The community space is yours, {tier} member: votes, proposals and \
                     member events are all open."
                )
            } else {
                "Community membership opens once you hold a pass from one of our \
                 collections."
                    .to_string()
            }
        }
        IntentKind::Help => {
            if access.has_access {
                format!(
                    "Here is what I can do for a {tier} member: check your holdings, \
                     open galleries, prepare mints, and route community actions."
                )
            } else {
                "Here is what I can do: check your holdings, show the public gallery, \
                 and help you mint your first pass."
                    .to_string()
            }
        }
    }
}
