use crate::evaluator::ExpiryEvaluator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

/// Periodic liveness notifications
pub struct HeartbeatWorker {
    evaluator: Arc<ExpiryEvaluator>,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl HeartbeatWorker {
    pub fn new(evaluator: Arc<ExpiryEvaluator>, interval: Duration) -> Self {
        Self {
            evaluator,
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background worker. The first heartbeat goes out one
    /// interval after start.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            tracing::info!("Heartbeat worker started with interval {:?}", self.interval);

            let mut interval = time::interval_at(time::Instant::now() + self.interval, self.interval);

            while self.running.load(Ordering::SeqCst) {
                interval.tick().await;
                if !self.running.load(Ordering::SeqCst) {
                    break;
                }

                if let Err(e) = self.evaluator.send_heartbeat().await {
                    tracing::error!(error = %e, "Failed to send heartbeat");
                }
            }

            tracing::info!("Heartbeat worker stopped");
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
