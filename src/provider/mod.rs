pub mod api;
pub mod blockscout;
pub mod fetch;
pub mod jsonrpc_provider;
pub mod polling;

pub use api::{RpcApi, default_rpc_error};
pub use blockscout::{BlockscoutProvider, get_host};
pub use fetch::{FetchRequest, RetryContext, RetryFunc};
pub use jsonrpc_provider::{JsonRpcProvider, JsonRpcProviderOptions};
pub use polling::{BlockSubscription, BlockUpdate, subscribe_blocks};
