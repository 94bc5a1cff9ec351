use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use url::Url;

use crate::config::ThrottleConfig;

/// What a retry function gets to see about the throttled attempt.
#[derive(Debug, Clone)]
pub struct RetryContext {
    pub url: String,
    /// Zero-based attempt that just failed
    pub attempt: u32,
    /// HTTP status of the failed attempt, `None` for transport failures
    pub status: Option<u16>,
}

/// Decides whether a throttled request may be retried.
pub type RetryFunc = Arc<dyn Fn(RetryContext) -> BoxFuture<'static, bool> + Send + Sync>;

/// Describes how to reach and authenticate against a JSON-RPC endpoint.
#[derive(Clone)]
pub struct FetchRequest {
    url: Url,
    allow_gzip: bool,
    retry_func: Option<RetryFunc>,
    timeout: Duration,
    max_attempts: u32,
    slot_interval: Duration,
}

impl std::fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchRequest")
            .field("url", &self.url.as_str())
            .field("allow_gzip", &self.allow_gzip)
            .field("has_retry_func", &self.retry_func.is_some())
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .field("slot_interval", &self.slot_interval)
            .finish()
    }
}

impl FetchRequest {
    pub fn new(url: Url) -> Self {
        let throttle = ThrottleConfig::default();
        Self {
            url,
            allow_gzip: false,
            retry_func: None,
            timeout: throttle.request_timeout,
            max_attempts: throttle.max_attempts,
            slot_interval: throttle.slot_interval,
        }
    }

    pub fn with_allow_gzip(mut self, allow_gzip: bool) -> Self {
        self.allow_gzip = allow_gzip;
        self
    }

    pub fn with_retry_func(mut self, retry_func: RetryFunc) -> Self {
        self.retry_func = Some(retry_func);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_throttle(mut self, throttle: &ThrottleConfig) -> Self {
        self.timeout = throttle.request_timeout;
        self.max_attempts = throttle.max_attempts.max(1);
        self.slot_interval = throttle.slot_interval;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn allow_gzip(&self) -> bool {
        self.allow_gzip
    }

    pub fn retry_func(&self) -> Option<&RetryFunc> {
        self.retry_func.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn slot_interval(&self) -> Duration {
        self.slot_interval
    }

    /// Asks the retry function, if any, whether `context` may be retried.
    /// Without a retry function throttled requests are always retried.
    pub async fn should_retry(&self, context: RetryContext) -> bool {
        match &self.retry_func {
            Some(retry_func) => retry_func(context).await,
            None => true,
        }
    }
}
