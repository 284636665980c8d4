//! Unsigned wallet-call payloads presented to users for client-side signing.

pub mod abi;
pub mod builder;

use alloy_primitives::{Address, Bytes, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use builder::{CommunityAction, MintPrices, TransactionBuilder, TxContracts};

/// One unsigned call: recipient contract, encoded call data, optional native
/// value. Serializes directly to the `walletSendCalls` call entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletCall {
    pub id: String,
    pub to: Address,
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub description: String,
}

/// Ordered batch of wallet calls with an expiry horizon. Built fresh per
/// request and never persisted beyond the response that carries it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBatch {
    pub id: String,
    pub calls: Vec<WalletCall>,
    pub expires_at: DateTime<Utc>,
}
