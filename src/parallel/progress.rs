//! Shared progress counters and a cancel flag for long batches.
//!
//! A [Progress] is handed to the runner by reference; another thread (a server
//! handler, a Ctrl-C hook) may read the counters or call [Progress::cancel].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Progress {
    done: AtomicU64,
    total: AtomicU64,
    cancelled: AtomicBool,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the counters for a batch of `total` runs.
    pub fn start(&self, total: u64) {
        self.done.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn advance(&self, runs: u64) -> u64 {
        self.done.fetch_add(runs, Ordering::Relaxed) + runs
    }

    /// `(completed, total)` runs.
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.done.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }

    pub fn fraction(&self) -> f64 {
        let (done, total) = self.snapshot();
        if total == 0 {
            0.0
        } else {
            done as f64 / total as f64
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
