//! Run statistics
//!
//! Counters are only ever advanced by the orchestrator's single scheduling
//! context; everyone else reads snapshots. Every processed item lands in
//! exactly one bucket: success, failed, or skipped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Accumulated counts for one run
#[derive(Debug)]
pub struct DownloadStats {
    total: AtomicU64,
    success: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    start: Instant,
}

impl Default for DownloadStats {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadStats {
    /// Fresh counters, elapsed time starting now
    #[must_use]
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            start: Instant::now(),
        }
    }

    /// Count one successfully acquired item
    pub fn record_success(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one failed item or link
    pub fn record_failure(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one skipped item (already acquired, or unsupported)
    pub fn record_skip(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view with derived fields
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let success = self.success.load(Ordering::Relaxed);
        StatsSnapshot {
            total,
            success,
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            success_rate: if total > 0 {
                success as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            elapsed: self.start.elapsed(),
        }
    }
}

/// Immutable view of the counters at one moment
#[derive(Clone, Copy, Debug)]
pub struct StatsSnapshot {
    /// Items processed in any way
    pub total: u64,
    /// Items fully acquired
    pub success: u64,
    /// Items that failed
    pub failed: u64,
    /// Items skipped (dedup hits, unsupported links)
    pub skipped: u64,
    /// success / total, as a percentage (0 when nothing processed)
    pub success_rate: f64,
    /// Wall-clock time since the counters were created
    pub elapsed: Duration,
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total={} success={} failed={} skipped={} rate={:.1}% elapsed={:.1}s",
            self.total,
            self.success,
            self.failed,
            self.skipped,
            self.success_rate,
            self.elapsed.as_secs_f64()
        )
    }
}
