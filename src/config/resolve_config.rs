use std::time::Duration;
use crate::types::{LogLevel, NetworkName, ProviderConfig, ThrottleSettings};

#[derive(Debug, Clone)]
pub struct NormalizedConfig {
    /// Network name or alias to resolve through the registry
    pub network: NetworkName,
    /// API key, `None` selects the shared community key
    pub api_key: Option<String>,
    /// Throttle retry settings for the request descriptor
    pub throttle: ThrottleConfig,
    /// General settings
    pub settings: SettingsConfig,
}

#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Maximum number of attempts for a throttled request
    pub max_attempts: u32,
    /// Base slot for the randomized exponential backoff
    pub slot_interval: Duration,
    /// Timeout for individual HTTP requests
    pub request_timeout: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self::from(&ThrottleSettings::default())
    }
}

impl From<&ThrottleSettings> for ThrottleConfig {
    fn from(settings: &ThrottleSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            slot_interval: Duration::from_millis(settings.slot_interval_ms),
            request_timeout: Duration::from_millis(settings.request_timeout_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsConfig {
    /// Interval between polls for block subscriptions
    pub polling_interval: Duration,
    /// Level used for per-request success logging
    pub log_level: LogLevel,
}

pub fn resolve_config(config: ProviderConfig) -> NormalizedConfig {
    let settings = config.settings.unwrap_or_default();

    // An empty key in a config file means "no key", same as leaving it out
    let api_key = config.api_key.filter(|key| !key.trim().is_empty());

    NormalizedConfig {
        network: config.network.unwrap_or_else(|| "mainnet".to_string()),
        api_key,
        throttle: settings
            .throttle
            .as_ref()
            .map(ThrottleConfig::from)
            .unwrap_or_default(),
        settings: SettingsConfig {
            polling_interval: Duration::from_millis(settings.polling_interval_ms.max(1)),
            log_level: settings.log_level,
        },
    }
}
