//! Blockchain read collaborators: ownership lookups and collection metadata.

pub mod registry;
pub mod rpc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChainError;

pub use registry::HttpCollectionRegistry;
pub use rpc::HttpChainClient;

/// Read-only view of on-chain NFT state.
///
/// Every call is independently fallible; callers decide which failures to
/// tolerate (a single token-index read failing must not abort a collection
/// check).
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// ERC-721 `balanceOf(owner)` on `contract`.
    async fn balance_of(&self, owner: Address, contract: Address) -> Result<u64, ChainError>;

    /// ERC-721 enumerable `tokenOfOwnerByIndex(owner, index)` on `contract`.
    async fn token_of_owner_by_index(
        &self,
        owner: Address,
        contract: Address,
        index: u64,
    ) -> Result<U256, ChainError>;

    /// Whether the transaction's receipt exists and reports success.
    async fn transaction_succeeded(&self, tx_hash: &str) -> Result<bool, ChainError>;
}

/// Display metadata for a gated collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CollectionMetadata {
    /// Fallback used when the registry cannot be reached or has no entry.
    pub fn unknown() -> Self {
        Self {
            name: "Unknown Collection".to_string(),
            description: String::new(),
        }
    }
}

/// External registry of collection display metadata.
#[async_trait]
pub trait CollectionRegistry: Send + Sync {
    async fn lookup(&self, contract: Address) -> Result<CollectionMetadata, ChainError>;
}
