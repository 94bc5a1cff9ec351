use serde::{Deserialize, Serialize};

pub type NetworkId = u64;
pub type NetworkName = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Network name or alias, `mainnet` when absent
    #[serde(default)]
    pub network: Option<NetworkName>,
    /// Blockscout API key, the throttled community key when absent
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub settings: Option<ProviderSettings>,
}

impl ProviderConfig {
    pub fn new(network: impl Into<NetworkName>) -> Self {
        Self {
            network: Some(network.into()),
            api_key: None,
            settings: Some(ProviderSettings::default()),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
    #[serde(default)]
    pub throttle: Option<ThrottleSettings>,
}

fn default_polling_interval_ms() -> u64 {
    4000
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            polling_interval_ms: default_polling_interval_ms(),
            throttle: None,
        }
    }
}

/**
 * Throttle handling for a single endpoint. A 429 (or a transport failure) is retried
 * up to `max_attempts` times, sleeping a random number of `slot_interval_ms` slots
 * that doubles with every attempt.
 */

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThrottleSettings {
    pub max_attempts: u32,
    pub slot_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            slot_interval_ms: 100,
            request_timeout_ms: 120_000,
        }
    }
}
