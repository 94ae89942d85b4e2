//! ui::progress
//!
//! Download progress counter.
//!
//! Shared by every download task. Each task calls [`DownloadProgress::advance`]
//! exactly once when it finishes, whether it wrote an archive or skipped
//! one, so the counter reaches its total exactly when the last task ends.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts finished download tasks against a known total.
#[derive(Debug)]
pub struct DownloadProgress {
    total: usize,
    done: AtomicUsize,
}

impl DownloadProgress {
    /// Create a counter for `total` tasks.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: AtomicUsize::new(0),
        }
    }

    /// Total number of tasks.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of tasks finished so far.
    pub fn done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }

    /// Record one finished task and log the running count.
    ///
    /// Returns the new count.
    pub fn advance(&self, label: &str) -> usize {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!("[{}/{}] {}", done, self.total, label);
        done
    }
}
