use std::time::Duration;

use blockscout_rpc::*;
use blockscout_rpc::network::{find_network_by_chain_id, register_network, registered_networks};

#[test]
fn test_throttle_settings_default() {
    let d = ThrottleSettings::default();
    assert_eq!(d.max_attempts, 12);
    assert_eq!(d.slot_interval_ms, 100);
    assert_eq!(d.request_timeout_ms, 120_000);
}

#[test]
fn test_resolve_config_defaults() {
    let config = resolve_config(ProviderConfig::default());
    assert_eq!(config.network, "mainnet");
    assert!(config.api_key.is_none());
    assert_eq!(config.throttle.max_attempts, 12);
    assert_eq!(config.throttle.slot_interval, Duration::from_millis(100));
    assert_eq!(config.settings.polling_interval, Duration::from_millis(4000));
    assert_eq!(config.settings.log_level, LogLevel::Info);
}

#[test]
fn test_resolve_config_from_json() {
    let raw = r#"{
        "network": "optimism",
        "api_key": "  ",
        "settings": {
            "log_level": "warn",
            "polling_interval_ms": 250,
            "throttle": {"max_attempts": 0, "slot_interval_ms": 5, "request_timeout_ms": 1000}
        }
    }"#;
    let parsed: ProviderConfig = serde_json::from_str(raw).unwrap();
    let config = resolve_config(parsed);

    assert_eq!(config.network, "optimism");
    // Blank keys fall back to the community key
    assert!(config.api_key.is_none());
    assert_eq!(config.settings.log_level, LogLevel::Warn);
    assert_eq!(config.settings.polling_interval, Duration::from_millis(250));
    assert_eq!(config.throttle.max_attempts, 1);
    assert_eq!(config.throttle.request_timeout, Duration::from_secs(1));
}

#[test]
fn test_resolve_network_by_name_alias_and_chain_id() {
    assert_eq!(Network::resolve("mainnet").unwrap(), Network::new("mainnet", 1));
    assert_eq!(Network::resolve("Homestead").unwrap().chain_id, 1);
    assert_eq!(Network::resolve("holesky").unwrap().name, "eth-holesky");
    assert_eq!(Network::resolve("polygon").unwrap().name, "matic");
    assert_eq!(Network::resolve(100u64).unwrap().name, "gnosis");
    assert_eq!(Network::resolve(Networkish::default()).unwrap().name, "mainnet");
}

#[test]
fn test_resolve_unknown_name_and_chain_id() {
    let err = Network::resolve("definitely-not-a-chain").unwrap_err();
    assert!(matches!(err, ProviderError::UnknownNetwork { .. }));

    let unknown = Network::resolve(424_242_424u64).unwrap();
    assert_eq!(unknown, Network::new("unknown", 424_242_424));
}

#[test]
fn test_register_network() {
    let network = register_network("Local-Devnet", 777_000_777).unwrap();
    assert_eq!(network.name, "local-devnet");
    assert_eq!(Network::resolve("local-devnet").unwrap().chain_id, 777_000_777);
    assert_eq!(find_network_by_chain_id(777_000_777), Some(network.clone()));
    assert!(registered_networks().contains(&network));

    assert!(register_network("  ", 1).is_err());
}
