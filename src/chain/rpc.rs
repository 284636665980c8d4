//! HTTP JSON-RPC client for on-chain reads.
//!
//! Speaks plain `eth_call` / `eth_getTransactionReceipt` against a single
//! configured endpoint. No batching, no websocket subscriptions; every read
//! this agent needs is a point lookup.

use std::time::Duration;

use alloy_primitives::{Address, U256, keccak256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::chain::ChainReader;
use crate::error::ChainError;

const JSONRPC_VERSION: &str = "2.0";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Chain reader backed by a JSON-RPC HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpChainClient {
    http: reqwest::Client,
    rpc_url: Url,
    balance_of_selector: [u8; 4],
    token_by_index_selector: [u8; 4],
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn encode_word_address(out: &mut Vec<u8>, address: Address) {
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(address.as_slice());
}

fn encode_word_u256(out: &mut Vec<u8>, value: U256) {
    out.extend_from_slice(&value.to_be_bytes::<32>());
}

fn parse_hex_quantity(raw: &str, context: &str) -> Result<U256, ChainError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.is_empty() {
        return Err(ChainError::InvalidResponse(format!(
            "{context}: empty hex quantity"
        )));
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("{context}: {e}")))
}

impl HttpChainClient {
    pub fn new(rpc_url: Url, timeout_ms: Option<u64>) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)))
            .build()?;
        Ok(Self {
            http,
            rpc_url,
            balance_of_selector: selector("balanceOf(address)"),
            token_by_index_selector: selector("tokenOfOwnerByIndex(address,uint256)"),
        })
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let body = json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": 1,
            "method": method,
            "params": params,
        });
        let envelope: RpcEnvelope = self
            .http
            .post(self.rpc_url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = envelope.error {
            return Err(ChainError::Rpc {
                method: method.to_string(),
                reason: format!("{} (code {})", error.message, error.code),
            });
        }
        envelope.result.ok_or_else(|| ChainError::Rpc {
            method: method.to_string(),
            reason: "response carried neither result nor error".to_string(),
        })
    }

    async fn eth_call(&self, contract: Address, data: Vec<u8>) -> Result<U256, ChainError> {
        let params = json!([
            { "to": contract.to_string(), "data": format!("0x{}", hex::encode(&data)) },
            "latest",
        ]);
        let result = self.request("eth_call", params).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| ChainError::InvalidResponse("eth_call result is not a string".into()))?;
        parse_hex_quantity(raw, "eth_call")
    }
}

#[async_trait]
impl ChainReader for HttpChainClient {
    async fn balance_of(&self, owner: Address, contract: Address) -> Result<u64, ChainError> {
        let mut data = self.balance_of_selector.to_vec();
        encode_word_address(&mut data, owner);
        let balance = self.eth_call(contract, data).await?;
        // ERC-721 balances fit comfortably in u64; anything larger is a
        // malformed response rather than a real holding.
        u64::try_from(balance)
            .map_err(|_| ChainError::InvalidResponse(format!("balanceOf overflow: {balance}")))
    }

    async fn token_of_owner_by_index(
        &self,
        owner: Address,
        contract: Address,
        index: u64,
    ) -> Result<U256, ChainError> {
        let mut data = self.token_by_index_selector.to_vec();
        encode_word_address(&mut data, owner);
        encode_word_u256(&mut data, U256::from(index));
        self.eth_call(contract, data).await
    }

    async fn transaction_succeeded(&self, tx_hash: &str) -> Result<bool, ChainError> {
        let result = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        if result.is_null() {
            // Not yet mined (or unknown hash): not a success, not an error.
            return Ok(false);
        }
        let status = result
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| ChainError::InvalidResponse("receipt missing status".into()))?;
        Ok(parse_hex_quantity(status, "receipt status")? == U256::from(1u8))
    }
}
