//! Log setup
//!
//! Console output plus an append-only log file that the admin API can tail.
//! Every line carries the pid and process uptime taken from the
//! [`RuntimeContext`].

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::context::RuntimeContext;

const DEFAULT_FILTER: &str = "certalert=info,tower_http=info";

/// Location of the log file inside a data directory
pub fn log_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join("logs").join("certalert.log")
}

/// Timestamp with pid and uptime, e.g. `2026-10-19T09:00:00.000Z [PID:42] [UPTIME:17s]`
#[derive(Clone)]
pub struct UptimeTimer {
    ctx: Arc<RuntimeContext>,
}

impl UptimeTimer {
    pub fn new(ctx: Arc<RuntimeContext>) -> Self {
        Self { ctx }
    }
}

impl FormatTime for UptimeTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{} [PID:{}] [UPTIME:{}s]",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            self.ctx.pid(),
            self.ctx.uptime().as_secs()
        )
    }
}

/// Install the global subscriber
pub fn init(ctx: Arc<RuntimeContext>, log_file: Option<&Path>) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let console = tracing_subscriber::fmt::layer().with_timer(UptimeTimer::new(Arc::clone(&ctx)));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_timer(UptimeTimer::new(ctx))
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_timer_format() {
        let ctx = Arc::new(RuntimeContext::new());
        let timer = UptimeTimer::new(Arc::clone(&ctx));

        let mut out = String::new();
        timer.format_time(&mut Writer::new(&mut out)).unwrap();

        assert!(out.contains(&format!("[PID:{}]", ctx.pid())));
        assert!(out.ends_with("s]"));
        assert!(out.contains("[UPTIME:"));
    }

    #[test]
    fn test_log_file_path() {
        assert_eq!(
            log_file_path(Path::new("/var/lib/certalert")),
            PathBuf::from("/var/lib/certalert/logs/certalert.log")
        );
    }
}
