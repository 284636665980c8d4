//! Pattern-table intent classification.
//!
//! Classification is deliberately deterministic: an ordered table of
//! substring patterns per intent, scored by a fixed confidence formula.
//! No model calls, no network.

use std::collections::BTreeMap;

use regex::Regex;

use crate::agent::types::{Intent, IntentKind};

/// Confidence for a match: base + exact-content bonus + specificity bonus,
/// capped at 1.0.
const BASE_CONFIDENCE: f64 = 0.5;
const EXACT_MATCH_BONUS: f64 = 0.3;
const SPECIFICITY_BONUS: f64 = 0.2;
/// Patterns longer than this are considered specific enough to earn the bonus.
const SPECIFICITY_THRESHOLD: usize = 20;

/// Maps free-text message content to a typed [`Intent`].
///
/// The pattern table is built once at construction and immutable thereafter.
/// Table order is significant: on equal confidence, the earlier entry wins.
pub struct IntentClassifier {
    patterns: Vec<(IntentKind, Vec<&'static str>)>,
    inquiry_collection: Regex,
    gallery_kind: Regex,
    mint_tier: Regex,
}

impl IntentClassifier {
    pub fn new() -> Self {
        let patterns = vec![
            (
                IntentKind::Greeting,
                vec![
                    "hello",
                    "hi there",
                    "hey",
                    "gm",
                    "good morning",
                    "good evening",
                    "who are you",
                    "what can you do for me",
                ],
            ),
            (
                IntentKind::NftInquiry,
                vec![
                    "nft",
                    "token",
                    "collectible",
                    "what do i own",
                    "my collection",
                    "do i have anything from",
                    "which pieces do i hold",
                ],
            ),
            (
                IntentKind::GalleryAccess,
                vec![
                    "gallery",
                    "exhibit",
                    "artwork",
                    "show me the members gallery",
                    "can i see the collection",
                ],
            ),
            (
                IntentKind::Minting,
                vec![
                    "mint",
                    "minting",
                    "claim my pass",
                    "how do i mint a new piece",
                    "create an nft",
                ],
            ),
            (
                IntentKind::Community,
                vec![
                    "community",
                    "vote",
                    "proposal",
                    "stake",
                    "governance",
                    "join",
                    "when is the next member event",
                ],
            ),
            (
                IntentKind::Help,
                vec!["help", "commands", "options", "what are my options here"],
            ),
        ];

        Self {
            patterns,
            // Trailing collection-name phrase: "... from/in/of <name>[?]"
            inquiry_collection: Regex::new(r"(?:from|in|of)\s+(?:the\s+)?([\w][\w\s'-]*?)\s*\??$")
                .expect("static regex"),
            gallery_kind: Regex::new(r"\b([a-z]+)\s+gallery\b").expect("static regex"),
            mint_tier: Regex::new(r"\b(premium|vip|basic|standard)\b").expect("static regex"),
        }
    }

    /// Classify message content. Never fails: content matching nothing
    /// yields `help` with confidence 0.
    pub fn classify(&self, content: &str) -> Intent {
        let lowered = content.trim().to_lowercase();
        if lowered.is_empty() {
            return Intent::fallback();
        }

        let mut best: Option<(IntentKind, f64)> = None;
        for (kind, patterns) in &self.patterns {
            for pattern in patterns {
                if !lowered.contains(pattern) {
                    continue;
                }
                let mut confidence = BASE_CONFIDENCE;
                if lowered == *pattern {
                    confidence += EXACT_MATCH_BONUS;
                }
                if pattern.len() > SPECIFICITY_THRESHOLD {
                    confidence += SPECIFICITY_BONUS;
                }
                let confidence = confidence.min(1.0);
                // Strictly-greater keeps first-match-wins on ties.
                if best.is_none_or(|(_, current)| confidence > current) {
                    best = Some((*kind, confidence));
                }
            }
        }

        match best {
            Some((kind, confidence)) => Intent {
                kind,
                confidence,
                entities: self.extract_entities(kind, &lowered),
            },
            None => Intent::fallback(),
        }
    }

    fn extract_entities(&self, kind: IntentKind, lowered: &str) -> BTreeMap<String, String> {
        let mut entities = BTreeMap::new();
        match kind {
            IntentKind::NftInquiry => {
                if let Some(captures) = self.inquiry_collection.captures(lowered)
                    && let Some(name) = captures.get(1)
                {
                    entities.insert("collection".to_string(), name.as_str().trim().to_string());
                }
            }
            IntentKind::GalleryAccess => {
                if let Some(captures) = self.gallery_kind.captures(lowered)
                    && let Some(kind) = captures.get(1)
                    && kind.as_str() != "the"
                {
                    entities.insert("gallery_type".to_string(), kind.as_str().to_string());
                }
            }
            IntentKind::Minting => {
                if let Some(captures) = self.mint_tier.captures(lowered)
                    && let Some(tier) = captures.get(1)
                {
                    entities.insert("tier".to_string(), tier.as_str().to_string());
                }
            }
            IntentKind::Greeting | IntentKind::Community | IntentKind::Help => {}
        }
        entities
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}
