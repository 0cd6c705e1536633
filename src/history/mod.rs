//! Alert history
//!
//! Remembers, per domain and threshold, which certificate (or which day) an
//! alert was last sent for. The evaluator consults it to suppress repeats.

pub mod store;

pub use store::HistoryStore;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// What was recorded when an alert fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertMark {
    /// `notAfter` of the certificate the alert was about
    Expiry(DateTime<Utc>),
    /// UTC calendar day the alert was sent
    Day(NaiveDate),
}

impl AlertMark {
    /// Whether an alert for `not_after`, evaluated on `today`, is covered
    /// by this mark
    pub fn suppresses(&self, not_after: DateTime<Utc>, today: NaiveDate) -> bool {
        match self {
            AlertMark::Expiry(expiry) => *expiry == not_after,
            AlertMark::Day(day) => *day == today,
        }
    }
}

impl fmt::Display for AlertMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertMark::Expiry(expiry) => {
                write!(f, "{}", expiry.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            AlertMark::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for AlertMark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(expiry) = DateTime::parse_from_rfc3339(s) {
            return Ok(AlertMark::Expiry(expiry.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(AlertMark::Day)
            .map_err(|_| format!("'{}' is neither an RFC 3339 timestamp nor a YYYY-MM-DD date", s))
    }
}

impl Serialize for AlertMark {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AlertMark {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which mark the evaluator writes after a successful alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupMode {
    /// Record the certificate's `notAfter`: one alert per certificate
    #[default]
    Instant,
    /// Record today's date: at most one alert per day
    Date,
}

impl DedupMode {
    pub fn mark(&self, not_after: DateTime<Utc>, now: DateTime<Utc>) -> AlertMark {
        match self {
            DedupMode::Instant => AlertMark::Expiry(not_after),
            DedupMode::Date => AlertMark::Day(now.date_naive()),
        }
    }
}

impl FromStr for DedupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instant" | "expiry" => Ok(DedupMode::Instant),
            "date" | "day" => Ok(DedupMode::Date),
            other => Err(format!("unknown dedup mode '{}'", other)),
        }
    }
}

/// In-memory copy of the persisted history: domain -> threshold -> mark
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertHistory {
    entries: BTreeMap<String, BTreeMap<u32, AlertMark>>,
}

impl AlertHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, domain: &str, threshold: u32) -> Option<&AlertMark> {
        self.entries.get(domain).and_then(|cells| cells.get(&threshold))
    }

    /// Overwrite the mark for `(domain, threshold)`, returning the old one
    pub fn record(&mut self, domain: &str, threshold: u32, mark: AlertMark) -> Option<AlertMark> {
        self.entries
            .entry(domain.to_string())
            .or_default()
            .insert(threshold, mark)
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of `(domain, threshold)` cells
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }
}

/// History store errors
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Alert history {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_mark_parses_both_generations() {
        let expiry: AlertMark = "2026-11-02T12:30:00Z".parse().unwrap();
        assert_eq!(
            expiry,
            AlertMark::Expiry(Utc.with_ymd_and_hms(2026, 11, 2, 12, 30, 0).unwrap())
        );

        let day: AlertMark = "2026-10-19".parse().unwrap();
        assert_eq!(day, AlertMark::Day(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()));

        assert!("last tuesday".parse::<AlertMark>().is_err());
    }

    #[test]
    fn test_mark_suppression() {
        let not_after = Utc.with_ymd_and_hms(2026, 11, 2, 12, 30, 0).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        assert!(AlertMark::Expiry(not_after).suppresses(not_after, today));
        assert!(!AlertMark::Expiry(not_after + chrono::Duration::seconds(1))
            .suppresses(not_after, today));

        assert!(AlertMark::Day(today).suppresses(not_after, today));
        assert!(!AlertMark::Day(today.pred_opt().unwrap()).suppresses(not_after, today));
    }

    #[test]
    fn test_history_json_shape() {
        let not_after = Utc.with_ymd_and_hms(2026, 11, 2, 0, 0, 0).unwrap();
        let mut history = AlertHistory::new();
        history.record("example.com", 7, AlertMark::Expiry(not_after));
        history.record(
            "example.com",
            30,
            AlertMark::Day(NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()),
        );

        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "example.com": {
                    "7": "2026-11-02T00:00:00Z",
                    "30": "2026-10-01"
                }
            })
        );
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_record_overwrites_cell() {
        let first = Utc.with_ymd_and_hms(2026, 11, 2, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2027, 2, 1, 0, 0, 0).unwrap();

        let mut history = AlertHistory::new();
        assert_eq!(history.record("a.com", 7, AlertMark::Expiry(first)), None);
        assert_eq!(
            history.record("a.com", 7, AlertMark::Expiry(second)),
            Some(AlertMark::Expiry(first))
        );
        assert_eq!(history.get("a.com", 7), Some(&AlertMark::Expiry(second)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_dedup_mode_parse_and_mark() {
        assert_eq!("instant".parse::<DedupMode>(), Ok(DedupMode::Instant));
        assert_eq!(" Date ".parse::<DedupMode>(), Ok(DedupMode::Date));
        assert!("weekly".parse::<DedupMode>().is_err());

        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let not_after = Utc.with_ymd_and_hms(2026, 10, 25, 0, 0, 0).unwrap();
        assert_eq!(DedupMode::Instant.mark(not_after, now), AlertMark::Expiry(not_after));
        assert_eq!(DedupMode::Date.mark(not_after, now), AlertMark::Day(now.date_naive()));
    }
}
