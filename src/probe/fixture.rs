//! In-memory probe for tests and dry runs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{CertificateProbe, ProbeError};

/// Probe answering from a fixed table of domains
///
/// Domains with no entry fail with `ConnectFailed`, which mimics an
/// unreachable host.
#[derive(Default)]
pub struct FixtureProbe {
    answers: RwLock<HashMap<String, Result<DateTime<Utc>, ProbeError>>>,
}

impl FixtureProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `not_after` for `domain`
    pub fn with_expiry(self, domain: impl Into<String>, not_after: DateTime<Utc>) -> Self {
        self.set_expiry(domain, not_after);
        self
    }

    /// Fail every probe of `domain` with `error`
    pub fn with_error(self, domain: impl Into<String>, error: ProbeError) -> Self {
        self.answers.write().insert(domain.into(), Err(error));
        self
    }

    /// Replace the certificate served for `domain`, e.g. to simulate renewal
    pub fn set_expiry(&self, domain: impl Into<String>, not_after: DateTime<Utc>) {
        self.answers.write().insert(domain.into(), Ok(not_after));
    }
}

#[async_trait]
impl CertificateProbe for FixtureProbe {
    async fn fetch_expiry(&self, domain: &str) -> Result<DateTime<Utc>, ProbeError> {
        self.answers
            .read()
            .get(domain)
            .cloned()
            .unwrap_or_else(|| Err(ProbeError::connect(domain, "no fixture for domain")))
    }
}
