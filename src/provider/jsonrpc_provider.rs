use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use parking_lot::RwLock;
use rand::Rng;
use reqwest::StatusCode;
use serde_json::Value;

use crate::{
    JsonRpcRequest, JsonRpcResponse, LogLevel, Network, NetworkId, ProviderError, Result,
    provider::fetch::{FetchRequest, RetryContext},
};

// 2^10 slots is already ~100s with the default slot interval
const MAX_BACKOFF_EXPONENT: u32 = 10;

#[derive(Debug, Clone)]
pub struct JsonRpcProviderOptions {
    /// Deliver block updates by polling `eth_blockNumber` instead of filter ids
    pub polling: bool,
    /// Skip chain id detection and always report this network
    pub static_network: Option<Network>,
    pub polling_interval: Duration,
    pub log_level: LogLevel,
}

impl Default for JsonRpcProviderOptions {
    fn default() -> Self {
        Self {
            polling: false,
            static_network: None,
            polling_interval: Duration::from_millis(4000),
            log_level: LogLevel::Info,
        }
    }
}

enum AttemptFailure {
    Throttled,
    Transport(reqwest::Error),
}

/// A single-endpoint JSON-RPC provider over HTTP.
#[derive(Debug, Clone)]
pub struct JsonRpcProvider {
    client: reqwest::Client,
    request: Arc<FetchRequest>,
    network: Network,
    options: JsonRpcProviderOptions,
    next_id: Arc<AtomicU64>,
    detected: Arc<RwLock<Option<Network>>>,
}

impl JsonRpcProvider {
    pub fn new(request: FetchRequest, network: Network, options: JsonRpcProviderOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .gzip(request.allow_gzip())
            .timeout(request.timeout())
            .build()?;

        Ok(Self {
            client,
            request: Arc::new(request),
            network,
            options,
            next_id: Arc::new(AtomicU64::new(1)),
            detected: Arc::new(RwLock::new(None)),
        })
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    /// The network this provider was constructed for.
    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn options(&self) -> &JsonRpcProviderOptions {
        &self.options
    }

    /// Endpoint without its query string, safe to log since the API key lives there.
    pub fn redacted_url(&self) -> String {
        let mut url = self.request.url().clone();
        url.set_query(None);
        url.to_string()
    }

    pub fn build_payload(&self, method: &str, params: Value) -> JsonRpcRequest {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        JsonRpcRequest::new(id, method, params)
    }

    /// The static network, or the one detected by an earlier `eth_chainId` call.
    pub fn known_network(&self) -> Option<Network> {
        if let Some(network) = &self.options.static_network {
            return Some(network.clone());
        }
        self.detected.read().clone()
    }

    /// Caches the network reported by the endpoint, refusing one that is not
    /// the chain this provider was constructed for.
    pub(crate) fn confirm_network(&self, detected: Network) -> Result<Network> {
        if detected.chain_id != self.network.chain_id {
            tracing::warn!(
                expected = %self.network,
                detected = %detected,
                url = %self.redacted_url(),
                "Endpoint reports a different chain than configured"
            );
            return Err(ProviderError::UnsupportedOperation {
                method: "eth_chainId".to_string(),
                message: format!("endpoint serves {detected}, expected {}", self.network),
            });
        }
        *self.detected.write() = Some(detected.clone());
        Ok(detected)
    }

    /// Generic chain derivation: same endpoint, expected to serve `chain_id`.
    ///
    /// The network is left to detection, so `get_network` fails when the endpoint
    /// serves a different chain.
    pub fn derive_for_chain(&self, chain_id: NetworkId) -> JsonRpcProvider {
        let network = Network::resolve(chain_id).unwrap_or_else(|_| Network::new("unknown", chain_id));
        let options = JsonRpcProviderOptions {
            static_network: None,
            ..self.options.clone()
        };

        Self {
            client: self.client.clone(),
            request: Arc::clone(&self.request),
            network,
            options,
            next_id: Arc::new(AtomicU64::new(1)),
            detected: Arc::new(RwLock::new(None)),
        }
    }

    /// Posts `payload`, retrying throttled (429) and failed-to-connect attempts
    /// while the request descriptor allows it.
    pub async fn transmit(&self, payload: &JsonRpcRequest) -> Result<JsonRpcResponse<Value>> {
        let url = self.redacted_url();
        let max_attempts = self.request.max_attempts();
        let mut attempt = 0;

        loop {
            let outcome = self
                .client
                .post(self.request.url().clone())
                .json(payload)
                .send()
                .await;

            let failure = match outcome {
                Ok(response) if response.status().is_success() => {
                    let json_response: JsonRpcResponse<Value> = response.json().await?;
                    self.log(attempt, &url, &payload.method, "RPC request succeeded");
                    return Ok(json_response);
                }
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    AttemptFailure::Throttled
                }
                Ok(response) => {
                    return Err(ProviderError::BadResponse {
                        url,
                        status: response.status().as_u16(),
                    });
                }
                Err(e) if e.is_timeout() || e.is_connect() => AttemptFailure::Transport(e),
                Err(e) => return Err(e.into()),
            };

            let context = RetryContext {
                url: url.clone(),
                attempt,
                status: match failure {
                    AttemptFailure::Throttled => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
                    AttemptFailure::Transport(_) => None,
                },
            };

            if attempt + 1 >= max_attempts || !self.request.should_retry(context).await {
                return Err(match failure {
                    AttemptFailure::Throttled => ProviderError::Throttled {
                        url,
                        attempts: attempt + 1,
                    },
                    AttemptFailure::Transport(e) => e.into(),
                });
            }

            let delay = self.backoff(attempt);
            tracing::debug!(
                network = %self.network.name,
                attempt = attempt + 1,
                url = %url,
                delay_ms = delay.as_millis() as u64,
                "Request throttled, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let slots = 1u64 << attempt.min(MAX_BACKOFF_EXPONENT);
        let slot = rand::thread_rng().gen_range(0..slots);
        self.request.slot_interval() * slot as u32
    }

    fn log(&self, attempt: u32, url: &str, method: &str, msg: &str) {
        let network = &self.network.name;
        match self.options.log_level {
            LogLevel::Info => tracing::info!(
                network = %network,
                method = %method,
                attempt = attempt + 1,
                url = %url,
                "{msg}"
            ),
            LogLevel::Error => tracing::error!(
                network = %network,
                method = %method,
                attempt = attempt + 1,
                url = %url,
                "{msg}"
            ),
            LogLevel::Debug => tracing::debug!(
                network = %network,
                method = %method,
                attempt = attempt + 1,
                url = %url,
                "{msg}"
            ),
            LogLevel::Trace => tracing::trace!(
                network = %network,
                method = %method,
                attempt = attempt + 1,
                url = %url,
                "{msg}"
            ),
            LogLevel::Warn => tracing::warn!(
                network = %network,
                method = %method,
                attempt = attempt + 1,
                url = %url,
                "{msg}"
            ),
        }
    }
}
