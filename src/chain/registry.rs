//! HTTP client for the collection metadata registry.

use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use url::Url;

use crate::chain::{CollectionMetadata, CollectionRegistry};
use crate::error::ChainError;

const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Registry client resolving `{base}/collections/{address}` to display
/// metadata. Callers fall back to [`CollectionMetadata::unknown`] on failure;
/// this client only reports the failure.
#[derive(Debug, Clone)]
pub struct HttpCollectionRegistry {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpCollectionRegistry {
    pub fn new(base_url: Url, timeout_ms: Option<u64>) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)))
            .build()?;
        Ok(Self { http, base_url })
    }

    fn collection_url(&self, contract: Address) -> Result<Url, ChainError> {
        self.base_url
            .join(&format!(
                "collections/{}",
                contract.to_string().to_lowercase()
            ))
            .map_err(|e| ChainError::InvalidResponse(format!("registry url: {e}")))
    }
}

#[async_trait]
impl CollectionRegistry for HttpCollectionRegistry {
    async fn lookup(&self, contract: Address) -> Result<CollectionMetadata, ChainError> {
        let url = self.collection_url(contract)?;
        let metadata = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<CollectionMetadata>()
            .await?;
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_url_is_lowercased_under_base() {
        let registry = HttpCollectionRegistry::new(
            Url::parse("https://registry.example/v1/").unwrap(),
            None,
        )
        .unwrap();
        let contract: Address = "0xAbCd00000000000000000000000000000000Ef12"
            .parse()
            .unwrap();
        let url = registry.collection_url(contract).unwrap();
        assert_eq!(
            url.as_str(),
            "https://registry.example/v1/collections/0xabcd00000000000000000000000000000000ef12"
        );
    }

    #[test]
    fn unknown_fallback_shape() {
        let unknown = CollectionMetadata::unknown();
        assert_eq!(unknown.name, "Unknown Collection");
        assert!(unknown.description.is_empty());
    }
}
