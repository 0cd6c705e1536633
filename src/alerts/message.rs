//! Alert payloads and their chat-friendly text

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// A threshold crossing for one domain's certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryAlert {
    pub domain: String,
    pub days_remaining: i64,
    pub not_after: DateTime<Utc>,
    pub threshold: u32,
    /// `not_after` was already in the past when the alert was built
    pub expired: bool,
}

impl ExpiryAlert {
    /// Render the alert as webhook message text
    pub fn text(&self) -> String {
        let expires = self.not_after.to_rfc3339_opts(SecondsFormat::Secs, true);
        let status = if self.expired && self.days_remaining == 0 {
            format!("expired less than a day ago ({})", expires)
        } else if self.expired {
            format!("expired *{}* days ago ({})", self.days_remaining.abs(), expires)
        } else {
            format!("will expire in *{}* days ({})", self.days_remaining, expires)
        };

        format!(
            "🚨 *SSL Certificate Expiration Alert*\n\
             The SSL certificate for *{}* {}.\n\
             Threshold reached: {} days\n\
             Please take action to renew the certificate before it expires.",
            self.domain, status, self.threshold
        )
    }
}

/// Append pretty-printed `details` to `text` as a fenced block
pub fn with_details(text: &str, details: Option<&serde_json::Value>) -> String {
    match details.and_then(|d| serde_json::to_string_pretty(d).ok()) {
        Some(rendered) => format!("{}\n```{}```", text, rendered),
        None => text.to_string(),
    }
}

/// Liveness message listing what is being watched
pub fn heartbeat_text(domains: &[String], thresholds: &[u32]) -> String {
    let thresholds: Vec<String> = thresholds.iter().map(u32::to_string).collect();
    format!(
        "SSL Certificate Checker is running\nMonitoring domains: {}\nThresholds: {} days",
        domains.join(", "),
        thresholds.join(", ")
    )
}
