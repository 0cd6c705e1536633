//! Runtime configuration from `CERTALERT_*` environment variables
//!
//! - CERTALERT_DOMAINS: comma-separated hostnames (required)
//! - CERTALERT_THRESHOLD_DAYS: comma-separated day counts, e.g. "30,14,7" (required)
//! - CERTALERT_WEBHOOK_URL: Slack-compatible webhook (required)
//! - CERTALERT_CHECK_INTERVAL_HOURS: hours between checks (default: 6)
//! - CERTALERT_HEARTBEAT_HOURS: hours between heartbeats (default: off)
//! - CERTALERT_DATA_DIR: history and log directory (default: $HOME/.certalert)
//! - CERTALERT_DEDUP: `instant` or `date` (default: instant)
//! - CERTALERT_PROBE_TIMEOUT_SECS / CERTALERT_NOTIFY_TIMEOUT_SECS (default: 10)
//! - CERTALERT_HTTP_ENABLED, CERTALERT_HTTP_HOST, CERTALERT_HTTP_PORT,
//!   CERTALERT_HTTP_AUTH_TOKEN: read-only admin API

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::history::DedupMode;

const DEFAULT_CHECK_INTERVAL_HOURS: u64 = 6;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_HTTP_PORT: u16 = 8080;

/// Admin API settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub auth_token: String,
}

/// Validated monitor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub domains: Vec<String>,
    pub threshold_days: Vec<u32>,
    pub webhook_url: String,
    pub check_interval_hours: u64,
    pub heartbeat_interval_hours: Option<u64>,
    pub data_dir: PathBuf,
    pub dedup: DedupMode,
    pub probe_timeout: Duration,
    pub notify_timeout: Duration,
    pub http: Option<HttpConfig>,
}

impl MonitorConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let domains = parse_domains(get("CERTALERT_DOMAINS"))?;
        let threshold_days = parse_thresholds(get("CERTALERT_THRESHOLD_DAYS"))?;

        let webhook_url = get("CERTALERT_WEBHOOK_URL")
            .ok_or(ConfigError::Missing("CERTALERT_WEBHOOK_URL"))?;
        if !(webhook_url.starts_with("https://") || webhook_url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                key: "CERTALERT_WEBHOOK_URL",
                reason: "must be an http(s) URL".to_string(),
            });
        }

        let check_interval_hours = parse_number(
            "CERTALERT_CHECK_INTERVAL_HOURS",
            get("CERTALERT_CHECK_INTERVAL_HOURS"),
        )?
        .unwrap_or(DEFAULT_CHECK_INTERVAL_HOURS);
        if check_interval_hours == 0 {
            return Err(ConfigError::Invalid {
                key: "CERTALERT_CHECK_INTERVAL_HOURS",
                reason: "must be at least 1".to_string(),
            });
        }
        check_hours_range("CERTALERT_CHECK_INTERVAL_HOURS", check_interval_hours)?;

        let heartbeat_interval_hours =
            parse_number::<u64>("CERTALERT_HEARTBEAT_HOURS", get("CERTALERT_HEARTBEAT_HOURS"))?
                .filter(|hours| *hours > 0);
        if let Some(hours) = heartbeat_interval_hours {
            check_hours_range("CERTALERT_HEARTBEAT_HOURS", hours)?;
        }

        let data_dir = match get("CERTALERT_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => get("HOME")
                .map(|home| PathBuf::from(home).join(".certalert"))
                .unwrap_or_else(|| PathBuf::from(".certalert")),
        };

        let dedup = match get("CERTALERT_DEDUP") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                key: "CERTALERT_DEDUP",
                reason,
            })?,
            None => DedupMode::default(),
        };

        let probe_timeout = Duration::from_secs(
            parse_number("CERTALERT_PROBE_TIMEOUT_SECS", get("CERTALERT_PROBE_TIMEOUT_SECS"))?
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );
        let notify_timeout = Duration::from_secs(
            parse_number("CERTALERT_NOTIFY_TIMEOUT_SECS", get("CERTALERT_NOTIFY_TIMEOUT_SECS"))?
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        let http_enabled = get("CERTALERT_HTTP_ENABLED")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let http = if http_enabled {
            let auth_token = get("CERTALERT_HTTP_AUTH_TOKEN")
                .ok_or(ConfigError::Missing("CERTALERT_HTTP_AUTH_TOKEN"))?;
            let port = parse_number::<u16>("CERTALERT_HTTP_PORT", get("CERTALERT_HTTP_PORT"))?
                .unwrap_or(DEFAULT_HTTP_PORT);
            if port == 0 {
                return Err(ConfigError::Invalid {
                    key: "CERTALERT_HTTP_PORT",
                    reason: "must be between 1 and 65535".to_string(),
                });
            }
            Some(HttpConfig {
                host: get("CERTALERT_HTTP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                auth_token,
            })
        } else {
            None
        };

        Ok(Self {
            domains,
            threshold_days,
            webhook_url,
            check_interval_hours,
            heartbeat_interval_hours,
            data_dir,
            dedup,
            probe_timeout,
            notify_timeout,
            http,
        })
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_hours * 3600)
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval_hours
            .map(|hours| Duration::from_secs(hours * 3600))
    }
}

/// Longest accepted interval, one year
const MAX_INTERVAL_HOURS: u64 = 24 * 366;

fn check_hours_range(key: &'static str, hours: u64) -> Result<(), ConfigError> {
    if hours > MAX_INTERVAL_HOURS {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("{} hours exceeds the maximum of {}", hours, MAX_INTERVAL_HOURS),
        });
    }
    Ok(())
}

fn hostname_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?i)[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)*$")
            .expect("hostname pattern is valid")
    })
}

fn parse_domains(raw: Option<String>) -> Result<Vec<String>, ConfigError> {
    let raw = raw.ok_or(ConfigError::Missing("CERTALERT_DOMAINS"))?;

    let mut domains: Vec<String> = Vec::new();
    for domain in raw.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        if domain.len() > 253 || !hostname_pattern().is_match(domain) {
            return Err(ConfigError::Invalid {
                key: "CERTALERT_DOMAINS",
                reason: format!("'{}' is not a valid hostname", domain),
            });
        }
        let domain = domain.to_ascii_lowercase();
        if !domains.contains(&domain) {
            domains.push(domain);
        }
    }

    if domains.is_empty() {
        return Err(ConfigError::Missing("CERTALERT_DOMAINS"));
    }
    Ok(domains)
}

fn parse_thresholds(raw: Option<String>) -> Result<Vec<u32>, ConfigError> {
    let raw = raw.ok_or(ConfigError::Missing("CERTALERT_THRESHOLD_DAYS"))?;

    raw.split(',')
        .map(str::trim)
        .map(|part| match part.parse::<u32>() {
            Ok(days) if days > 0 => Ok(days),
            _ => Err(ConfigError::Invalid {
                key: "CERTALERT_THRESHOLD_DAYS",
                reason: format!("'{}' is not a positive whole number of days", part),
            }),
        })
        .collect()
}

fn parse_number<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: format!("'{}': {}", value, e),
        })
    })
    .transpose()
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("CERTALERT_DOMAINS", "example.com, Shop.Example.org"),
            ("CERTALERT_THRESHOLD_DAYS", "30,14,7"),
            ("CERTALERT_WEBHOOK_URL", "https://hooks.slack.com/services/T/B/X"),
            ("HOME", "/home/ops"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::from_lookup(lookup(&minimal())).unwrap();

        assert_eq!(config.domains, vec!["example.com", "shop.example.org"]);
        assert_eq!(config.threshold_days, vec![30, 14, 7]);
        assert_eq!(config.check_interval(), Duration::from_secs(6 * 3600));
        assert_eq!(config.heartbeat_interval(), None);
        assert_eq!(config.data_dir, PathBuf::from("/home/ops/.certalert"));
        assert_eq!(config.dedup, DedupMode::Instant);
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert!(config.http.is_none());
    }

    #[test]
    fn test_optional_settings() {
        let mut vars = minimal();
        vars.extend([
            ("CERTALERT_CHECK_INTERVAL_HOURS", "1"),
            ("CERTALERT_HEARTBEAT_HOURS", "24"),
            ("CERTALERT_DATA_DIR", "/var/lib/certalert"),
            ("CERTALERT_DEDUP", "date"),
            ("CERTALERT_HTTP_ENABLED", "true"),
            ("CERTALERT_HTTP_PORT", "9090"),
            ("CERTALERT_HTTP_AUTH_TOKEN", "s3cret"),
        ]);
        let config = MonitorConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.check_interval_hours, 1);
        assert_eq!(config.heartbeat_interval(), Some(Duration::from_secs(24 * 3600)));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/certalert"));
        assert_eq!(config.dedup, DedupMode::Date);
        assert_eq!(
            config.http,
            Some(HttpConfig {
                host: "0.0.0.0".to_string(),
                port: 9090,
                auth_token: "s3cret".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_required() {
        for key in [
            "CERTALERT_DOMAINS",
            "CERTALERT_THRESHOLD_DAYS",
            "CERTALERT_WEBHOOK_URL",
        ] {
            let vars: Vec<_> = minimal().into_iter().filter(|(k, _)| *k != key).collect();
            assert_eq!(
                MonitorConfig::from_lookup(lookup(&vars)),
                Err(ConfigError::Missing(key))
            );
        }
    }

    #[test]
    fn test_rejects_oversized_intervals() {
        for key in ["CERTALERT_CHECK_INTERVAL_HOURS", "CERTALERT_HEARTBEAT_HOURS"] {
            let mut vars = minimal();
            vars.push((key, "6000000000000000"));

            let err = MonitorConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { key: k, .. } if k == key),
                "{key} should be rejected"
            );
        }

        let mut vars = minimal();
        vars.push(("CERTALERT_CHECK_INTERVAL_HOURS", "8784"));
        let config = MonitorConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.check_interval(), Duration::from_secs(8784 * 3600));
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        for bad in ["7,abc", "0,7", "-3", "7,,14"] {
            let mut vars = minimal();
            vars.retain(|(k, _)| *k != "CERTALERT_THRESHOLD_DAYS");
            vars.push(("CERTALERT_THRESHOLD_DAYS", bad));

            let err = MonitorConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { key: "CERTALERT_THRESHOLD_DAYS", .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_bad_domains_and_url() {
        let mut vars = minimal();
        vars.retain(|(k, _)| *k != "CERTALERT_DOMAINS");
        vars.push(("CERTALERT_DOMAINS", "example.com,not a host"));
        assert!(matches!(
            MonitorConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { key: "CERTALERT_DOMAINS", .. })
        ));

        let mut vars = minimal();
        vars.retain(|(k, _)| *k != "CERTALERT_WEBHOOK_URL");
        vars.push(("CERTALERT_WEBHOOK_URL", "hooks.slack.com/services/x"));
        assert!(matches!(
            MonitorConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { key: "CERTALERT_WEBHOOK_URL", .. })
        ));
    }

    #[test]
    fn test_http_requires_token() {
        let mut vars = minimal();
        vars.push(("CERTALERT_HTTP_ENABLED", "1"));
        assert_eq!(
            MonitorConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Missing("CERTALERT_HTTP_AUTH_TOKEN"))
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut vars = minimal();
        vars.push(("CERTALERT_CHECK_INTERVAL_HOURS", "0"));
        assert!(MonitorConfig::from_lookup(lookup(&vars)).is_err());
    }
}
