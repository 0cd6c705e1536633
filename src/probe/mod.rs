//! Certificate probing
//!
//! A probe connects to a domain and reports the `notAfter` instant of the
//! leaf certificate it presents. The evaluator only sees the
//! [`CertificateProbe`] trait, so tests can swap in [`FixtureProbe`].

pub mod fixture;
pub mod tls;

pub use fixture::FixtureProbe;
pub use tls::TlsProbe;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of certificate expiry timestamps
#[async_trait]
pub trait CertificateProbe: Send + Sync {
    /// Fetch the `notAfter` field of the leaf certificate served for `domain`
    async fn fetch_expiry(&self, domain: &str) -> Result<DateTime<Utc>, ProbeError>;
}

/// Probe errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("Failed to connect to {domain}: {reason}")]
    ConnectFailed { domain: String, reason: String },

    #[error("No peer certificate presented by {domain}")]
    NoCertificate { domain: String },

    #[error("Invalid certificate from {domain}: {reason}")]
    InvalidCertificate { domain: String, reason: String },
}

impl ProbeError {
    pub(crate) fn connect(domain: &str, reason: impl std::fmt::Display) -> Self {
        ProbeError::ConnectFailed {
            domain: domain.to_string(),
            reason: reason.to_string(),
        }
    }
}
