//! Progress-callback trait for per-file batch events.
//!
//! Pass a [`BatchProgressCallback`] to [`crate::Session::process`] or
//! [`crate::batch::run_batch`] to drive a progress bar, log, or UI. Files are
//! processed one at a time, so events arrive strictly in order:
//!
//! ```text
//! on_batch_start
//!   on_file_start → on_file_complete     (per file)
//!   on_file_start → on_file_error        (first failure, batch stops)
//! on_batch_complete                      (only when every file succeeded)
//! ```
//!
//! # Example
//!
//! ```rust
//! use firstlast_pdf::BatchProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Counter(AtomicUsize);
//!
//! impl BatchProgressCallback for Counter {
//!     fn on_file_complete(&self, _index: usize, _total: usize, _name: &str, _output_len: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use std::sync::Arc;

/// Receives batch events. All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first file.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before file `index` (0-based) is read and extracted.
    ///
    /// `percent` is `(index + 1) / total * 100`: the share of the batch that
    /// will be done once this file finishes.
    fn on_file_start(&self, index: usize, total: usize, name: &str, percent: f64) {
        let _ = (index, total, name, percent);
    }

    /// Called after a file produced its output document.
    fn on_file_complete(&self, index: usize, total: usize, name: &str, output_len: usize) {
        let _ = (index, total, name, output_len);
    }

    /// Called when a file fails. No further files are attempted.
    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after every file succeeded.
    fn on_batch_complete(&self, total_files: usize) {
        let _ = total_files;
    }
}

/// Used when the caller does not care about progress.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

/// Percentage of a batch of `total` files done once file `index` finishes.
pub fn percent_complete(index: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    ((index + 1) as f64 / total as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_file_start(0, 2, "a.pdf", 50.0);
        cb.on_file_complete(0, 2, "a.pdf", 1024);
        cb.on_file_error(1, 2, "b.pdf", "boom");
        cb.on_batch_complete(2);
    }

    #[test]
    fn percent_counts_the_current_file() {
        assert_eq!(percent_complete(0, 4), 25.0);
        assert_eq!(percent_complete(3, 4), 100.0);
        assert_eq!(percent_complete(0, 3).round(), 33.0);
        assert_eq!(percent_complete(0, 0), 100.0);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(1);
        cb.on_file_start(0, 1, "only.pdf", percent_complete(0, 1));
    }
}
