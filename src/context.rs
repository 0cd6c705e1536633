//! Process-wide runtime facts, constructed once in `main` and handed to the
//! logger, the workers and the admin API.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::evaluator::CycleSummary;

pub struct RuntimeContext {
    started_at: DateTime<Utc>,
    started: Instant,
    pid: u32,
    last_cycle: RwLock<Option<CycleSummary>>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            pid: std::process::id(),
            last_cycle: RwLock::new(None),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn record_cycle(&self, summary: CycleSummary) {
        *self.last_cycle.write() = Some(summary);
    }

    pub fn last_cycle(&self) -> Option<CycleSummary> {
        self.last_cycle.read().clone()
    }

    pub fn checked_at(&self) -> Option<DateTime<Utc>> {
        self.last_cycle.read().as_ref().map(|c| c.checked_at)
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_cycle() {
        let ctx = RuntimeContext::new();
        assert!(ctx.last_cycle().is_none());
        assert!(ctx.started_at() <= Utc::now());

        let checked_at = Utc::now();
        ctx.record_cycle(CycleSummary {
            checked_at,
            domains_checked: 1,
            quiet: 1,
            alerted: vec![],
            failed: vec![],
        });

        assert_eq!(ctx.checked_at(), Some(checked_at));
        assert_eq!(ctx.last_cycle().unwrap().domains_checked, 1);
    }
}
