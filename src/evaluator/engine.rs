//! Expiry evaluation and alert deduplication

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use super::threshold::{days_remaining, normalize_thresholds, select_threshold};
use crate::alerts::{heartbeat_text, ExpiryAlert, Notifier, NotifierError};
use crate::history::{DedupMode, HistoryError, HistoryStore};
use crate::probe::{CertificateProbe, ProbeError};

/// Result of evaluating one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A notification went out for `threshold`
    Alerted { threshold: u32, days_remaining: i64 },
    /// Nothing to send
    NoAlertNeeded(Quiet),
}

/// Why no alert was sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quiet {
    /// The certificate is not within any threshold window
    OutsideWindow { days_remaining: i64 },
    /// The selected threshold already fired for this certificate (or today)
    AlreadyAlerted { threshold: u32, days_remaining: i64 },
}

/// Evaluation errors
#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("Notification failed: {0}")]
    Notifier(#[from] NotifierError),

    #[error("Alert history unavailable: {0}")]
    History(#[from] HistoryError),
}

/// Checks certificates against the threshold ladder and sends each alert once
pub struct ExpiryEvaluator {
    domains: Vec<String>,
    /// Sorted ascending, no duplicates
    thresholds: Vec<u32>,
    probe: Arc<dyn CertificateProbe>,
    notifier: Arc<dyn Notifier>,
    store: HistoryStore,
    dedup: DedupMode,
    /// Serializes history load -> mutate -> save
    history_lock: Mutex<()>,
}

impl ExpiryEvaluator {
    pub fn new(
        domains: Vec<String>,
        thresholds: &[u32],
        probe: Arc<dyn CertificateProbe>,
        notifier: Arc<dyn Notifier>,
        store: HistoryStore,
    ) -> Self {
        Self {
            domains,
            thresholds: normalize_thresholds(thresholds),
            probe,
            notifier,
            store,
            dedup: DedupMode::default(),
            history_lock: Mutex::new(()),
        }
    }

    /// Choose which mark is written after an alert
    pub fn with_dedup_mode(mut self, dedup: DedupMode) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn thresholds(&self) -> &[u32] {
        &self.thresholds
    }

    pub fn dedup_mode(&self) -> DedupMode {
        self.dedup
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Evaluate one domain now
    pub async fn evaluate(&self, domain: &str) -> Result<Outcome, EvaluateError> {
        self.evaluate_at(domain, Utc::now()).await
    }

    /// Evaluate one domain as of `now`
    pub async fn evaluate_at(
        &self,
        domain: &str,
        now: DateTime<Utc>,
    ) -> Result<Outcome, EvaluateError> {
        let not_after = self.probe.fetch_expiry(domain).await?;
        let days = days_remaining(not_after, now);

        tracing::info!(
            domain = %domain,
            days_remaining = days,
            not_after = %not_after,
            "Certificate expiration check"
        );

        let Some(threshold) = select_threshold(days, &self.thresholds) else {
            return Ok(Outcome::NoAlertNeeded(Quiet::OutsideWindow {
                days_remaining: days,
            }));
        };

        let _guard = self.history_lock.lock().await;
        let mut history = self.store.load()?;

        if let Some(mark) = history.get(domain, threshold) {
            if mark.suppresses(not_after, now.date_naive()) {
                tracing::debug!(
                    domain = %domain,
                    threshold,
                    mark = %mark,
                    "Alert already sent, skipping"
                );
                return Ok(Outcome::NoAlertNeeded(Quiet::AlreadyAlerted {
                    threshold,
                    days_remaining: days,
                }));
            }
        }

        let alert = ExpiryAlert {
            domain: domain.to_string(),
            days_remaining: days,
            not_after,
            threshold,
            expired: not_after < now,
        };
        self.notifier.send_alert(&alert).await?;

        tracing::info!(domain = %domain, threshold, days_remaining = days, "Alert sent");

        history.record(domain, threshold, self.dedup.mark(not_after, now));
        if let Err(e) = self.store.save(&history) {
            tracing::error!(
                domain = %domain,
                threshold,
                error = %e,
                "Alert sent but not recorded; it will repeat next cycle"
            );
            return Err(e.into());
        }

        Ok(Outcome::Alerted {
            threshold,
            days_remaining: days,
        })
    }

    /// Evaluate every configured domain now
    pub async fn run_cycle(&self) -> CycleReport {
        self.run_cycle_at(Utc::now()).await
    }

    /// Evaluate every configured domain as of `now`
    ///
    /// Probes run concurrently; history updates still happen one at a time.
    /// A failure on one domain never stops the others.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> CycleReport {
        tracing::info!(domains = ?self.domains, "Starting certificate check");

        let checks = self.domains.iter().map(|domain| async move {
            DomainResult {
                domain: domain.clone(),
                result: self.evaluate_at(domain, now).await,
            }
        });
        let results = futures::future::join_all(checks).await;

        for entry in &results {
            if let Err(e) = &entry.result {
                match e {
                    EvaluateError::Probe(_) => tracing::warn!(
                        domain = %entry.domain,
                        error = %e,
                        "Failed to get certificate, skipping domain"
                    ),
                    _ => tracing::error!(
                        domain = %entry.domain,
                        error = %e,
                        "Certificate evaluation failed"
                    ),
                }
            }
        }

        CycleReport {
            checked_at: now,
            results,
        }
    }

    /// Send a liveness message naming the watched domains and thresholds
    pub async fn send_heartbeat(&self) -> Result<(), NotifierError> {
        let details = serde_json::json!({
            "domains": self.domains,
            "thresholds": self.thresholds,
        });

        self.notifier
            .send_message(&heartbeat_text(&self.domains, &self.thresholds), Some(&details))
            .await?;

        tracing::info!(domains = self.domains.len(), "Heartbeat sent");
        Ok(())
    }
}

/// One domain's entry in a [`CycleReport`]
#[derive(Debug)]
pub struct DomainResult {
    pub domain: String,
    pub result: Result<Outcome, EvaluateError>,
}

/// Everything that happened during one evaluation cycle
#[derive(Debug)]
pub struct CycleReport {
    pub checked_at: DateTime<Utc>,
    pub results: Vec<DomainResult>,
}

impl CycleReport {
    /// `(domain, threshold)` pairs that were alerted
    pub fn alerted(&self) -> impl Iterator<Item = (&str, u32)> {
        self.results.iter().filter_map(|entry| match &entry.result {
            Ok(Outcome::Alerted { threshold, .. }) => Some((entry.domain.as_str(), *threshold)),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &EvaluateError)> {
        self.results
            .iter()
            .filter_map(|entry| entry.result.as_ref().err().map(|e| (entry.domain.as_str(), e)))
    }

    /// Whether the history file could not be read or written
    pub fn has_store_failure(&self) -> bool {
        self.failures()
            .any(|(_, e)| matches!(e, EvaluateError::History(_)))
    }

    pub fn summary(&self) -> CycleSummary {
        let alerted: Vec<AlertedDomain> = self
            .alerted()
            .map(|(domain, threshold)| AlertedDomain {
                domain: domain.to_string(),
                threshold,
            })
            .collect();
        let failed: Vec<FailedDomain> = self
            .failures()
            .map(|(domain, e)| FailedDomain {
                domain: domain.to_string(),
                error: e.to_string(),
            })
            .collect();

        CycleSummary {
            checked_at: self.checked_at,
            domains_checked: self.results.len(),
            quiet: self.results.len() - alerted.len() - failed.len(),
            alerted,
            failed,
        }
    }
}

/// Serializable digest of a cycle, kept for the admin API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub checked_at: DateTime<Utc>,
    pub domains_checked: usize,
    pub quiet: usize,
    pub alerted: Vec<AlertedDomain>,
    pub failed: Vec<FailedDomain>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertedDomain {
    pub domain: String,
    pub threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDomain {
    pub domain: String,
    pub error: String,
}
