//! NFT ownership verification with a TTL-bounded result cache.
//!
//! One verifier instance owns the cache; verification calls for different
//! senders may run on parallel tasks, so the cache sits behind an async lock.
//! Collection reads within a single verification are sequential and
//! individually fault-isolated: one failing collection is excluded from the
//! aggregate, it never aborts the whole check.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::agent::types::{AccessResult, AccessTier};
use crate::chain::{ChainReader, CollectionMetadata, CollectionRegistry};
use crate::error::ChainError;

/// Validity window for cached access results.
const ACCESS_CACHE_TTL_SECS: i64 = 5 * 60;

#[derive(Debug, Clone)]
struct CacheEntry {
    result: AccessResult,
    expires_at: DateTime<Utc>,
}

/// Cache introspection for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub addresses: Vec<String>,
}

struct GrantedCollection {
    name: String,
    tier: AccessTier,
    token_ids: Vec<String>,
}

/// Verifies a sender's holdings across the configured collections and
/// derives an access tier.
pub struct AccessVerifier {
    chain: Arc<dyn ChainReader>,
    registry: Arc<dyn CollectionRegistry>,
    collections: Vec<Address>,
    cache: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl AccessVerifier {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        registry: Arc<dyn CollectionRegistry>,
        collections: Vec<Address>,
    ) -> Self {
        Self {
            chain,
            registry,
            collections,
            cache: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ACCESS_CACHE_TTL_SECS),
        }
    }

    /// Override the cache TTL. Intended for tests and diagnostics.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Verify access for a sender address.
    ///
    /// Served from cache while the prior result is fresh; otherwise reads
    /// on-chain state. Never fails: a verification that cannot complete
    /// returns a basic-tier denial carrying the error message.
    pub async fn verify_access(&self, address: &str) -> AccessResult {
        let key = address.trim().to_ascii_lowercase();

        if let Some(cached) = self.cache_get(&key).await {
            tracing::debug!(address = %key, "access served from cache");
            return cached;
        }

        let result = match self.verify_uncached(&key).await {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(address = %key, %error, "access verification failed");
                AccessResult::denied_with_error(error.to_string())
            }
        };

        // Only settled results are cached. A verification that ended in the
        // error branch stays uncached so the next message retries it instead
        // of pinning the sender to basic for the full TTL.
        if result.error.is_none() {
            self.cache_set(key, result.clone()).await;
        }
        result
    }

    /// Drop every cached result.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    /// Current cache size and cached addresses.
    pub async fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.read().await;
        let mut addresses: Vec<String> = cache.keys().cloned().collect();
        addresses.sort();
        CacheStats {
            size: cache.len(),
            addresses,
        }
    }

    /// Fetch a fresh cache entry; an expired entry is purged and treated as
    /// absent.
    async fn cache_get(&self, key: &str) -> Option<AccessResult> {
        let mut cache = self.cache.write().await;
        match cache.get(key) {
            Some(entry) if Utc::now() < entry.expires_at => Some(entry.result.clone()),
            Some(_) => {
                cache.remove(key);
                None
            }
            None => None,
        }
    }

    async fn cache_set(&self, key: String, result: AccessResult) {
        let entry = CacheEntry {
            result,
            expires_at: Utc::now() + self.ttl,
        };
        self.cache.write().await.insert(key, entry);
    }

    async fn verify_uncached(&self, address: &str) -> Result<AccessResult, ChainError> {
        let owner: Address = address
            .parse()
            .map_err(|_| ChainError::InvalidAddress(address.to_string()))?;

        let mut granted: Vec<GrantedCollection> = Vec::new();
        let mut failures = 0usize;
        let mut last_error: Option<ChainError> = None;

        for &contract in &self.collections {
            match self.check_collection(owner, contract).await {
                Ok(Some(grant)) => granted.push(grant),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        %contract,
                        %error,
                        "collection check failed; excluding from aggregation"
                    );
                    failures += 1;
                    last_error = Some(error);
                }
            }
        }

        if !self.collections.is_empty() && failures == self.collections.len() {
            // Every configured collection failed to read; surface that rather
            // than reporting a clean denial.
            let last = last_error.map(|e| e.to_string()).unwrap_or_default();
            return Ok(AccessResult::denied_with_error(format!(
                "all {failures} collection checks failed; last: {last}"
            )));
        }

        if granted.is_empty() {
            return Ok(AccessResult::denied());
        }

        let access_tier = granted
            .iter()
            .map(|grant| grant.tier)
            .max()
            .unwrap_or(AccessTier::Basic);
        let token_ids: Vec<String> = granted
            .iter()
            .flat_map(|grant| grant.token_ids.iter().cloned())
            .collect();
        let collection_name = granted
            .iter()
            .map(|grant| grant.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(AccessResult {
            has_access: true,
            access_tier,
            token_ids,
            collection_name: Some(collection_name),
            error: None,
        })
    }

    /// Check one collection. `Ok(None)` means the sender holds nothing there.
    async fn check_collection(
        &self,
        owner: Address,
        contract: Address,
    ) -> Result<Option<GrantedCollection>, ChainError> {
        let balance = self.chain.balance_of(owner, contract).await?;
        if balance == 0 {
            return Ok(None);
        }

        let mut token_ids = Vec::with_capacity(balance as usize);
        for index in 0..balance {
            match self.chain.token_of_owner_by_index(owner, contract, index).await {
                Ok(token_id) => token_ids.push(token_id.to_string()),
                Err(error) => {
                    tracing::warn!(%contract, index, %error, "token index read failed");
                }
            }
        }

        let metadata = match self.registry.lookup(contract).await {
            Ok(metadata) => metadata,
            Err(error) => {
                tracing::warn!(%contract, %error, "registry lookup failed; using fallback");
                CollectionMetadata::unknown()
            }
        };

        Ok(Some(GrantedCollection {
            tier: AccessTier::from_collection_name(&metadata.name),
            name: metadata.name,
            token_ids,
        }))
    }
}
