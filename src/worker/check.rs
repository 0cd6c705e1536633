use crate::context::RuntimeContext;
use crate::evaluator::ExpiryEvaluator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

/// Periodic worker that runs one evaluation cycle per tick
pub struct CheckWorker {
    evaluator: Arc<ExpiryEvaluator>,
    ctx: Arc<RuntimeContext>,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl CheckWorker {
    pub fn new(
        evaluator: Arc<ExpiryEvaluator>,
        ctx: Arc<RuntimeContext>,
        interval: Duration,
    ) -> Self {
        Self {
            evaluator,
            ctx,
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background worker. The first cycle runs immediately.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            tracing::info!("Check worker started with interval {:?}", self.interval);

            let mut interval = time::interval(self.interval);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

            while self.running.load(Ordering::SeqCst) {
                interval.tick().await;
                if !self.running.load(Ordering::SeqCst) {
                    break;
                }
                run_check_cycle(&self.evaluator, &self.ctx).await;
            }

            tracing::info!("Check worker stopped");
        })
    }

    /// Stop scheduling further cycles
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if worker is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Run one cycle, log its outcome and record the summary in `ctx`
pub async fn run_check_cycle(evaluator: &ExpiryEvaluator, ctx: &RuntimeContext) {
    let report = evaluator.run_cycle().await;
    let summary = report.summary();

    if report.has_store_failure() {
        tracing::error!(
            failed = summary.failed.len(),
            "Certificate check cycle failed: alert history unavailable"
        );
    } else {
        tracing::info!(
            checked = summary.domains_checked,
            alerted = summary.alerted.len(),
            quiet = summary.quiet,
            failed = summary.failed.len(),
            "Certificate check cycle completed"
        );
    }

    ctx.record_cycle(summary);
}
