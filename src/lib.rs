pub mod community;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod network;
pub mod provider;
pub mod types;

pub use error::{ProviderError, Result};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use network::{Network, Networkish};
pub use types::{LogLevel, NetworkId, NetworkName, ProviderConfig, ProviderSettings, ThrottleSettings};

// Re-export commonly used items
pub use community::ThrottleAdvisory;
pub use config::{NormalizedConfig, resolve_config};
pub use provider::{BlockscoutProvider, JsonRpcProvider, JsonRpcProviderOptions, RpcApi};
