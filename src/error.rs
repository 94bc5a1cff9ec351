use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{message} (argument=\"{argument}\", value=\"{value}\")")]
    InvalidArgument {
        argument: &'static str,
        value: String,
        message: &'static str,
    },

    #[error("unknown network: {network}")]
    UnknownNetwork { network: String },

    #[error("{message}")]
    InsufficientFunds { method: String, message: String },

    #[error("{message}")]
    NonceExpired { method: String, message: String },

    #[error("{message}")]
    ReplacementUnderpriced { method: String, message: String },

    #[error("call exception from {method}: {message}")]
    CallException {
        method: String,
        message: String,
        data: Option<Value>,
    },

    #[error("unsupported operation {method}: {message}")]
    UnsupportedOperation { method: String, message: String },

    #[error("JSON-RPC error {code} from {method}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("Request to {url} throttled after {attempts} attempts")]
    Throttled { url: String, attempts: u32 },

    #[error("Bad response from {url}: HTTP {status}")]
    BadResponse { url: String, status: u16 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Subscription closed")]
    SubscriptionClosed,
}

impl ProviderError {
    pub(crate) fn unsupported_network(value: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: "network",
            value: value.into(),
            message: "unsupported network",
        }
    }

    /// The upstream JSON-RPC message carried by errors that came back from the node.
    pub fn rpc_message(&self) -> Option<&str> {
        match self {
            Self::InsufficientFunds { message, .. }
            | Self::NonceExpired { message, .. }
            | Self::ReplacementUnderpriced { message, .. }
            | Self::CallException { message, .. }
            | Self::UnsupportedOperation { message, .. }
            | Self::Rpc { message, .. } => Some(message),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
