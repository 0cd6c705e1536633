//! Expiry evaluation
//!
//! Turns a certificate's `notAfter` into at most one alert per threshold
//! crossing, using the alert history to avoid repeats across cycles and
//! restarts.

pub mod engine;
pub mod threshold;

pub use engine::{
    AlertedDomain, CycleReport, CycleSummary, DomainResult, EvaluateError, ExpiryEvaluator,
    FailedDomain, Outcome, Quiet,
};
pub use threshold::{days_remaining, normalize_thresholds, select_threshold};
