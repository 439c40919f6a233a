//! Logger metrics for observability
//!
//! Counters for the delivery pipeline: how many entries were accepted,
//! rejected by back-pressure, filtered by level, and finally written.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use batchlog::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_enqueued();
/// metrics.record_rejected();
///
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.rejected(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Entries accepted by the queue
    enqueued: AtomicU64,

    /// Entries dropped because the queue was full or closed
    rejected: AtomicU64,

    /// Entries below the minimum level
    filtered: AtomicU64,

    /// Entries handed to the sinks
    written: AtomicU64,

    /// Number of batches flushed
    batches_flushed: AtomicU64,

    /// Sink failures reported to diagnostics
    sink_errors: AtomicU64,

    /// Completed file rotations
    rotations: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            written: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_flushed(&self) -> u64 {
        self.batches_flushed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_errors(&self) -> u64 {
        self.sink_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Record an accepted entry
    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    /// Record an entry dropped by back-pressure
    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a flushed batch of `entries` entries
    #[inline]
    pub fn record_batch(&self, entries: usize) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.written.fetch_add(entries as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sink_error(&self) -> u64 {
        self.sink_errors.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rotation(&self) -> u64 {
        self.rotations.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been submitted.
    pub fn drop_rate(&self) -> f64 {
        let rejected = self.rejected() as f64;
        let total = self.enqueued() as f64 + rejected;
        if total == 0.0 {
            0.0
        } else {
            (rejected / total) * 100.0
        }
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued()),
            rejected: AtomicU64::new(self.rejected()),
            filtered: AtomicU64::new(self.filtered()),
            written: AtomicU64::new(self.written()),
            batches_flushed: AtomicU64::new(self.batches_flushed()),
            sink_errors: AtomicU64::new(self.sink_errors()),
            rotations: AtomicU64::new(self.rotations()),
        }
    }
}
