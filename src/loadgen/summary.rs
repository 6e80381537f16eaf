use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters shared by every virtual user.
#[derive(Debug, Default)]
pub(super) struct LoadCounters {
    total: AtomicU64,
    checked_ok: AtomicU64,
    failed: AtomicU64,
    iterations: AtomicU64,
}

impl LoadCounters {
    pub(super) fn record_request(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_checked_ok(&self) {
        self.checked_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_iteration(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn summary(&self, duration: Duration) -> LoadSummary {
        LoadSummary {
            duration,
            total_requests: self.total.load(Ordering::Relaxed),
            checked_ok: self.checked_ok.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            iterations: self.iterations.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub duration: Duration,
    pub total_requests: u64,
    pub checked_ok: u64,
    pub failed: u64,
    pub iterations: u64,
}

impl LoadSummary {
    #[must_use]
    pub fn line(&self) -> String {
        format!(
            "Requests: {} total, {} checked ok, {} failed; {} iterations in {} ms",
            self.total_requests,
            self.checked_ok,
            self.failed,
            self.iterations,
            self.duration.as_millis()
        )
    }
}
