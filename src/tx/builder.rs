//! Construction of unsigned transaction batches for user signing.
//!
//! Each entry point resolves its fixed target contract from configuration,
//! encodes the structured payload into call data, attaches the native value
//! where the action carries one (tier-priced mints), and wraps the single
//! resulting call in a fresh, expiring batch.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::agent::types::AccessTier;
use crate::chain::ChainReader;
use crate::error::TxBuildError;
use crate::tx::abi::{AbiValue, encode_call};
use crate::tx::{TransactionBatch, WalletCall};

/// Horizon after which a delivered batch should no longer be signed.
const BATCH_EXPIRY_HOURS: i64 = 24;

/// Fixed target contracts per action category.
#[derive(Debug, Clone, Copy)]
pub struct TxContracts {
    pub provenance: Address,
    pub minting: Address,
    pub community: Address,
}

/// Mint price table in wei, keyed by tier.
#[derive(Debug, Clone, Copy)]
pub struct MintPrices {
    pub basic: U256,
    pub premium: U256,
    pub vip: U256,
}

impl MintPrices {
    pub fn for_tier(&self, tier: AccessTier) -> U256 {
        match tier {
            AccessTier::Basic => self.basic,
            AccessTier::Premium => self.premium,
            AccessTier::Vip => self.vip,
        }
    }
}

impl Default for MintPrices {
    fn default() -> Self {
        Self {
            basic: U256::ZERO,
            // 0.01 and 0.05 native units.
            premium: U256::from(10_000_000_000_000_000u64),
            vip: U256::from(50_000_000_000_000_000u64),
        }
    }
}

/// Community action payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommunityAction {
    Vote { proposal_id: U256, support: bool },
    Propose { description: String },
    Stake { amount: U256 },
}

impl CommunityAction {
    fn label(&self) -> &'static str {
        match self {
            Self::Vote { .. } => "vote",
            Self::Propose { .. } => "propose",
            Self::Stake { .. } => "stake",
        }
    }
}

pub struct TransactionBuilder {
    contracts: TxContracts,
    prices: MintPrices,
    chain: Arc<dyn ChainReader>,
}

impl TransactionBuilder {
    pub fn new(contracts: TxContracts, prices: MintPrices, chain: Arc<dyn ChainReader>) -> Self {
        Self {
            contracts,
            prices,
            chain,
        }
    }

    /// Record the provenance story of an owned piece.
    pub fn build_provenance_transaction(
        &self,
        sender: Address,
        story: &str,
        token_id: U256,
        collection: Address,
    ) -> Result<TransactionBatch, TxBuildError> {
        let story = story.trim();
        if story.is_empty() {
            return Err(TxBuildError::Encode("story must not be empty".to_string()));
        }

        let data = encode_call(
            "recordProvenance",
            &[
                AbiValue::Address(collection),
                AbiValue::Uint(token_id),
                AbiValue::Str(story.to_string()),
            ],
        );
        Ok(self.single_call_batch(
            self.contracts.provenance,
            data,
            None,
            format!("Record provenance for token {token_id} in {collection} (from {sender})"),
        ))
    }

    /// Mint a membership pass at the given tier. The native value attached is
    /// the tier's configured mint price.
    pub fn build_mint_transaction(
        &self,
        sender: Address,
        tier: AccessTier,
        memo: Option<&str>,
    ) -> Result<TransactionBatch, TxBuildError> {
        let memo = memo.unwrap_or_default().trim();
        let data = encode_call(
            "mintPass",
            &[
                AbiValue::Address(sender),
                AbiValue::Str(tier.as_str().to_string()),
                AbiValue::Str(memo.to_string()),
            ],
        );
        let price = self.prices.for_tier(tier);
        let description = if memo.is_empty() {
            format!("Mint a {tier} pass for {sender}")
        } else {
            format!("Mint a {tier} pass for {sender} ({memo})")
        };
        Ok(self.single_call_batch(
            self.contracts.minting,
            data,
            (price > U256::ZERO).then_some(price),
            description,
        ))
    }

    /// Community actions: votes, proposals, staking. Never carry native value.
    pub fn build_community_transaction(
        &self,
        sender: Address,
        action: CommunityAction,
    ) -> Result<TransactionBatch, TxBuildError> {
        let (data, detail) = match &action {
            CommunityAction::Vote {
                proposal_id,
                support,
            } => (
                encode_call(
                    "castVote",
                    &[AbiValue::Uint(*proposal_id), AbiValue::Bool(*support)],
                ),
                format!("proposal {proposal_id}"),
            ),
            CommunityAction::Propose { description } => {
                let description = description.trim();
                if description.is_empty() {
                    return Err(TxBuildError::Encode(
                        "proposal description must not be empty".to_string(),
                    ));
                }
                (
                    encode_call("submitProposal", &[AbiValue::Str(description.to_string())]),
                    "new proposal".to_string(),
                )
            }
            CommunityAction::Stake { amount } => {
                if *amount == U256::ZERO {
                    return Err(TxBuildError::Encode(
                        "stake amount must be greater than zero".to_string(),
                    ));
                }
                (
                    encode_call("stake", &[AbiValue::Uint(*amount)]),
                    format!("stake {amount}"),
                )
            }
        };

        Ok(self.single_call_batch(
            self.contracts.community,
            data,
            None,
            format!("Community {} by {sender}: {detail}", action.label()),
        ))
    }

    /// Poll the receipt of a submitted transaction. Any read failure reports
    /// `false` rather than propagating.
    pub async fn verify_transaction(&self, tx_hash: &str) -> bool {
        match self.chain.transaction_succeeded(tx_hash).await {
            Ok(succeeded) => succeeded,
            Err(error) => {
                tracing::warn!(tx_hash, %error, "receipt poll failed");
                false
            }
        }
    }

    fn single_call_batch(
        &self,
        to: Address,
        data: Vec<u8>,
        value: Option<U256>,
        description: String,
    ) -> TransactionBatch {
        let call = WalletCall {
            id: format!("call_{}", Uuid::new_v4().simple()),
            to,
            data: Bytes::from(data),
            value,
            description,
        };
        TransactionBatch {
            id: format!("batch_{}", Uuid::new_v4().simple()),
            calls: vec![call],
            expires_at: Utc::now() + Duration::hours(BATCH_EXPIRY_HOURS),
        }
    }
}
