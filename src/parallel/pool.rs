//! Rayon thread pool configuration for simulation batches.
//!
//! Use [WorkerPool::install] to run a batch with a fixed number of threads, or
//! rely on Rayon's default (all CPU cores).

use rayon::ThreadPoolBuilder;

/// How many worker threads a parallel batch uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use the global Rayon pool.
    pub workers: usize,
}

impl WorkerPool {
    /// Use all available CPU cores (Rayon default).
    pub fn default_workers() -> Self {
        Self::default()
    }

    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Threads the closure will actually run on.
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            rayon::current_num_threads()
        } else {
            self.workers
        }
    }

    /// Run a closure with this worker count. If [workers](WorkerPool::workers) is 0,
    /// uses the global Rayon pool. Otherwise builds a temporary pool with that many
    /// threads, falling back to the global pool if the threads cannot be spawned.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(f),
            Err(err) => {
                tracing::warn!(workers = self.workers, error = %err, "falling back to global rayon pool");
                f()
            }
        }
    }
}
