use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    JsonRpcError, JsonRpcRequest, Network, NetworkId, ProviderError, Result, jsonrpc::parse_quantity,
    provider::JsonRpcProvider,
};

const METHOD_NOT_FOUND: i64 = -32601;

/// Extension points of the JSON-RPC client core.
///
/// Gateway adapters wrap a [`JsonRpcProvider`] and override the hooks they need;
/// the request path (`send`) always goes through `get_rpc_error`, so an override
/// there applies to every call.
#[async_trait]
pub trait RpcApi: std::fmt::Debug + Send + Sync {
    fn core(&self) -> &JsonRpcProvider;

    /// Turns a JSON-RPC error object into a [`ProviderError`].
    fn get_rpc_error(&self, payload: &JsonRpcRequest, error: JsonRpcError) -> ProviderError {
        default_rpc_error(payload, error)
    }

    /// A provider for another chain. The default keeps the endpoint and checks the
    /// chain it serves on first use.
    fn get_provider(&self, chain_id: NetworkId) -> Arc<dyn RpcApi> {
        Arc::new(self.core().derive_for_chain(chain_id))
    }

    /// Whether this provider runs on a shared, throttled credential.
    fn is_community_resource(&self) -> bool {
        false
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value> {
        let payload = self.core().build_payload(method, params);
        let response = self.core().transmit(&payload).await?;

        if let Some(error) = response.error {
            return Err(self.get_rpc_error(&payload, error));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn get_network(&self) -> Result<Network> {
        if let Some(network) = self.core().known_network() {
            return Ok(network);
        }

        let chain_id = parse_quantity(&self.send("eth_chainId", json!([])).await?)?;
        self.core().confirm_network(Network::resolve(chain_id)?)
    }

    async fn get_block_number(&self) -> Result<u64> {
        parse_quantity(&self.send("eth_blockNumber", json!([])).await?)
    }
}

#[async_trait]
impl RpcApi for JsonRpcProvider {
    fn core(&self) -> &JsonRpcProvider {
        self
    }
}

/// Generic normalizer for JSON-RPC error objects, keyed on the upstream message.
pub fn default_rpc_error(payload: &JsonRpcRequest, error: JsonRpcError) -> ProviderError {
    let method = payload.method.clone();
    let lowered = error.message.to_lowercase();
    let JsonRpcError { code, message, data } = error;

    if lowered.contains("insufficient funds") {
        return ProviderError::InsufficientFunds { method, message };
    }
    if lowered.contains("nonce too low") || lowered.contains("nonce has already been used") {
        return ProviderError::NonceExpired { method, message };
    }
    if lowered.contains("replacement transaction underpriced") || lowered.contains("replacement fee too low") {
        return ProviderError::ReplacementUnderpriced { method, message };
    }
    if matches!(method.as_str(), "eth_call" | "eth_estimateGas") && lowered.contains("revert") {
        return ProviderError::CallException { method, message, data };
    }
    if code == METHOD_NOT_FOUND {
        return ProviderError::UnsupportedOperation { method, message };
    }

    ProviderError::Rpc { method, code, message, data }
}
