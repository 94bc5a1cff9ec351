//! [Blockscout](https://www.blockscout.com) JSON-RPC gateway.
//!
//! Supported networks: `mainnet`, `sepolia`, `eth-holesky`, `gnosis`,
//! `gnosis-chiado`, `arbitrum`, `arbitrum-nova`, `arbitrum-sepolia`, `base`,
//! `base-sepolia`, `matic`, `matic-zkevm`, `optimism`, `optimism-sepolia`,
//! `zksync` and `zksync-sepolia`.
//!
//! Without an API key a shared, highly throttled community key is used, which is
//! fine for prototypes and scripts but not for production traffic.

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use url::Url;

use crate::{
    JsonRpcError, JsonRpcRequest, Network, NetworkId, Networkish, ProviderConfig, ProviderError, Result,
    community::ThrottleAdvisory,
    config::{NormalizedConfig, SettingsConfig, ThrottleConfig, resolve_config},
    provider::{
        FetchRequest, JsonRpcProvider, JsonRpcProviderOptions, RetryContext, RetryFunc, RpcApi,
        api::default_rpc_error,
    },
};

const DEFAULT_API_KEY: &str = "";
const SERVICE_NAME: &str = "BlockscoutProvider";

const REPLACE_TX_FAILED: &str = "INTERNAL_ERROR: could not replace existing tx";
const REPLACEMENT_UNDERPRICED: &str = "replacement transaction underpriced";

/// Gateway host and path for a network name.
pub fn get_host(name: &str) -> Result<String> {
    const BASE_DOMAIN: &str = "blockscout.com";
    const API_PATH: &str = "/api/eth-rpc";

    let subdomain = match name {
        "mainnet" => "eth",
        "sepolia" => "eth-sepolia",
        "eth-holesky" => "eth-holesky",
        "gnosis" => "gnosis",
        "gnosis-chiado" => "gnosis-chiado",
        "arbitrum" => "arbitrum",
        "arbitrum-nova" => "arbitrum-nova",
        "arbitrum-sepolia" => "arbitrum-sepolia",
        "base" => "base",
        "base-sepolia" => "base-sepolia",
        "matic" => "polygon",
        "matic-zkevm" => "zkevm",
        "optimism" => "optimism",
        "optimism-sepolia" => "optimism-sepolia",
        "zksync" => "zksync",
        "zksync-sepolia" => "zksync-sepolia",
        _ => return Err(ProviderError::unsupported_network(name)),
    };

    Ok(format!("{subdomain}.{BASE_DOMAIN}{API_PATH}"))
}

#[derive(Debug, Clone)]
pub struct BlockscoutProvider {
    inner: JsonRpcProvider,
    api_key: String,
    advisory: Arc<ThrottleAdvisory>,
    throttle: ThrottleConfig,
    settings: SettingsConfig,
}

impl BlockscoutProvider {
    /// Connects to `network` (`mainnet` when `None`) with `api_key` (the community
    /// key when `None`), using default settings and the process-wide advisory.
    pub fn new(network: Option<Networkish>, api_key: Option<&str>) -> Result<Self> {
        let defaults = resolve_config(ProviderConfig::default());
        Self::connect(
            network.unwrap_or_default(),
            api_key.map(str::to_string),
            defaults.throttle,
            defaults.settings,
            ThrottleAdvisory::global(),
        )
    }

    pub fn from_config(config: &NormalizedConfig, advisory: Arc<ThrottleAdvisory>) -> Result<Self> {
        Self::connect(
            Networkish::Name(config.network.clone()),
            config.api_key.clone(),
            config.throttle.clone(),
            config.settings.clone(),
            advisory,
        )
    }

    fn connect(
        network: Networkish,
        api_key: Option<String>,
        throttle: ThrottleConfig,
        settings: SettingsConfig,
        advisory: Arc<ThrottleAdvisory>,
    ) -> Result<Self> {
        let network = Network::resolve(network)?;
        let api_key = api_key.unwrap_or_else(|| DEFAULT_API_KEY.to_string());

        let request = Self::get_request_with(&network, Some(api_key.as_str()), &throttle, Arc::clone(&advisory))?;

        // Blockscout has no filter id support, so updates are always polled
        let options = JsonRpcProviderOptions {
            polling: true,
            static_network: Some(network.clone()),
            polling_interval: settings.polling_interval,
            log_level: settings.log_level,
        };
        let inner = JsonRpcProvider::new(request, network, options)?;

        let community = api_key == DEFAULT_API_KEY;
        tracing::debug!(
            network = %inner.network(),
            url = %inner.redacted_url(),
            community,
            "Created Blockscout provider"
        );

        Ok(Self {
            inner,
            api_key,
            advisory,
            throttle,
            settings,
        })
    }

    /// Request descriptor for `network` with default throttle settings.
    pub fn get_request(network: &Network, api_key: Option<&str>) -> Result<FetchRequest> {
        Self::get_request_with(network, api_key, &ThrottleConfig::default(), ThrottleAdvisory::global())
    }

    pub fn get_request_with(
        network: &Network,
        api_key: Option<&str>,
        throttle: &ThrottleConfig,
        advisory: Arc<ThrottleAdvisory>,
    ) -> Result<FetchRequest> {
        let api_key = api_key.unwrap_or(DEFAULT_API_KEY);

        let mut url = Url::parse(&format!("https://{}", get_host(&network.name)?))?;
        url.query_pairs_mut().append_pair("apikey", api_key);

        let mut request = FetchRequest::new(url).with_allow_gzip(true).with_throttle(throttle);

        if api_key == DEFAULT_API_KEY {
            let retry_func: RetryFunc = Arc::new(move |_context: RetryContext| {
                advisory.show(SERVICE_NAME);
                futures::future::ready(true).boxed()
            });
            request = request.with_retry_func(retry_func);
        }

        Ok(request)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

#[async_trait]
impl RpcApi for BlockscoutProvider {
    fn core(&self) -> &JsonRpcProvider {
        &self.inner
    }

    fn get_rpc_error(&self, payload: &JsonRpcRequest, mut error: JsonRpcError) -> ProviderError {
        if payload.method == "eth_sendRawTransaction" && error.message == REPLACE_TX_FAILED {
            error.message = REPLACEMENT_UNDERPRICED.to_string();
        }
        default_rpc_error(payload, error)
    }

    fn get_provider(&self, chain_id: NetworkId) -> Arc<dyn RpcApi> {
        let derived = Self::connect(
            Networkish::ChainId(chain_id),
            Some(self.api_key.clone()),
            self.throttle.clone(),
            self.settings.clone(),
            Arc::clone(&self.advisory),
        );

        match derived {
            Ok(provider) => Arc::new(provider),
            Err(e) => {
                tracing::debug!(chain_id, error = %e, "Blockscout does not serve chain, using generic provider");
                // Same key and descriptor, so community status and error rewrites carry over
                Arc::new(Self {
                    inner: self.inner.derive_for_chain(chain_id),
                    api_key: self.api_key.clone(),
                    advisory: Arc::clone(&self.advisory),
                    throttle: self.throttle.clone(),
                    settings: self.settings.clone(),
                })
            }
        }
    }

    fn is_community_resource(&self) -> bool {
        self.api_key == DEFAULT_API_KEY
    }
}
