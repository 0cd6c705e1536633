//! certalert: TLS Certificate Expiry Monitor
//!
//! Periodically probes a list of domains over TLS, works out how many days
//! each leaf certificate has left, and posts at most one webhook alert per
//! domain, threshold and certificate.
//!
//! # Features
//!
//! - **TLS Probing**: Reads `notAfter` from the served leaf certificate
//! - **Threshold Selection**: Alerts on the tightest threshold crossed
//! - **Deduplication**: Persistent alert history survives restarts and
//!   resets automatically when a certificate is rotated
//! - **Atomic Persistence**: Backup, temp-file write, then rename
//! - **Heartbeats**: Optional periodic liveness message
//! - **Admin API**: Bearer-protected `/health`, `/logs` and `/history`
//!
//! # Example
//!
//! ```no_run
//! use certalert::alerts::WebhookNotifier;
//! use certalert::evaluator::ExpiryEvaluator;
//! use certalert::history::HistoryStore;
//! use certalert::probe::TlsProbe;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let evaluator = ExpiryEvaluator::new(
//!     vec!["example.com".to_string()],
//!     &[30, 14, 7],
//!     Arc::new(TlsProbe::new(Duration::from_secs(10))?),
//!     Arc::new(WebhookNotifier::new("https://hooks.example.com/T000", Duration::from_secs(10))?),
//!     HistoryStore::in_dir("/var/lib/certalert"),
//! );
//!
//! let report = evaluator.run_cycle().await;
//! println!("{:?}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod api;
pub mod config;
pub mod context;
pub mod evaluator;
pub mod history;
pub mod logging;
pub mod probe;
pub mod worker;

// Re-export commonly used types
pub use config::{ConfigError, MonitorConfig};
pub use context::RuntimeContext;
pub use evaluator::{CycleReport, CycleSummary, EvaluateError, ExpiryEvaluator, Outcome};
pub use history::{AlertHistory, AlertMark, DedupMode, HistoryStore};
pub use probe::{CertificateProbe, ProbeError};
