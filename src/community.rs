use std::sync::{Arc, LazyLock};

use dashmap::DashSet;

static GLOBAL_ADVISORY: LazyLock<Arc<ThrottleAdvisory>> =
    LazyLock::new(|| Arc::new(ThrottleAdvisory::new()));

/// Tracks which services have already warned that they are running on a shared,
/// heavily rate-limited community API key.
///
/// Notices are de-duplicated per service name for the lifetime of the advisory;
/// [`ThrottleAdvisory::global`] is the process-wide instance providers use by default.
#[derive(Debug, Default)]
pub struct ThrottleAdvisory {
    shown: DashSet<String>,
    ignored: DashSet<String>,
}

impl ThrottleAdvisory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> Arc<ThrottleAdvisory> {
        Arc::clone(&GLOBAL_ADVISORY)
    }

    /// Silences notices for `service`.
    pub fn ignore(&self, service: &str) {
        self.ignored.insert(service.to_string());
    }

    pub fn has_shown(&self, service: &str) -> bool {
        self.shown.contains(service)
    }

    /// Emits the community-resource notice for `service` unless it was already
    /// emitted or the service is ignored. Returns whether a notice went out.
    pub fn show(&self, service: &str) -> bool {
        if self.ignored.contains(service) {
            return false;
        }
        if !self.shown.insert(service.to_string()) {
            return false;
        }

        tracing::warn!(
            service = %service,
            "{service} is using the shared community API key, which is highly throttled. \
             Requests may be retried or rejected under load; configure a private API key \
             for production use."
        );
        true
    }
}
