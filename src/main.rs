//! certalert daemon
//!
//! Run with: cargo run
//!
//! Configuration comes from `CERTALERT_*` environment variables, see
//! [`certalert::config`]. RUST_LOG overrides the default log filter.

use std::sync::Arc;

use certalert::alerts::WebhookNotifier;
use certalert::api::{run_server, shutdown_signal, AppState};
use certalert::config::MonitorConfig;
use certalert::context::RuntimeContext;
use certalert::evaluator::ExpiryEvaluator;
use certalert::history::HistoryStore;
use certalert::logging;
use certalert::probe::TlsProbe;
use certalert::worker::{CheckWorker, HeartbeatWorker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match MonitorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    std::fs::create_dir_all(&config.data_dir)?;

    let ctx = Arc::new(RuntimeContext::new());
    let log_path = logging::log_file_path(&config.data_dir);
    logging::init(Arc::clone(&ctx), Some(&log_path))?;

    println!(
        r#"
   ___          _    _   _           _
  / __|___ _ _| |_ /_\ | |___ _ _| |_
 | (__/ -_) '_|  _/ _ \| / -_) '_|  _|
  \___\___|_|  \__/_/ \_\_\___|_|  \__|

  TLS Certificate Expiry Monitor v{}
"#,
        env!("CARGO_PKG_VERSION")
    );

    tracing::info!("Configuration:");
    tracing::info!("  Domains: {}", config.domains.join(", "));
    tracing::info!("  Thresholds: {:?} days", config.threshold_days);
    tracing::info!("  Check interval: {}h", config.check_interval_hours);
    match config.heartbeat_interval_hours {
        Some(hours) => tracing::info!("  Heartbeat interval: {}h", hours),
        None => tracing::info!("  Heartbeat: disabled"),
    }
    tracing::info!("  Data dir: {}", config.data_dir.display());
    tracing::info!("  Dedup mode: {:?}", config.dedup);

    let probe = TlsProbe::new(config.probe_timeout)?;
    let notifier = WebhookNotifier::new(config.webhook_url.clone(), config.notify_timeout)?;
    let store = HistoryStore::in_dir(&config.data_dir);

    let evaluator = Arc::new(
        ExpiryEvaluator::new(
            config.domains.clone(),
            &config.threshold_days,
            Arc::new(probe),
            Arc::new(notifier),
            store,
        )
        .with_dedup_mode(config.dedup),
    );

    // Start background workers
    let check_worker = Arc::new(CheckWorker::new(
        Arc::clone(&evaluator),
        Arc::clone(&ctx),
        config.check_interval(),
    ));
    let check_handle = Arc::clone(&check_worker).start();

    let heartbeat = config.heartbeat_interval().map(|interval| {
        let worker = Arc::new(HeartbeatWorker::new(Arc::clone(&evaluator), interval));
        let handle = Arc::clone(&worker).start();
        (worker, handle)
    });

    match &config.http {
        Some(http) => {
            let state = Arc::new(AppState {
                evaluator: Arc::clone(&evaluator),
                ctx: Arc::clone(&ctx),
                log_path,
                auth_token: http.auth_token.clone(),
            });
            run_server(http, state, shutdown_signal()).await?;
        }
        None => shutdown_signal().await,
    }

    tracing::info!("Shutdown signal received, stopping workers...");
    check_worker.stop();
    check_handle.abort();
    if let Some((worker, handle)) = heartbeat {
        worker.stop();
        handle.abort();
    }

    tracing::info!("certalert stopped");
    Ok(())
}
