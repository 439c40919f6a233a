//! Sink trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

/// A destination that renders and persists or displays batches of entries
///
/// Sinks are driven only by the dispatcher thread. Errors are returned to
/// the dispatcher, which reports them to diagnostics and moves on.
pub trait Sink: Send {
    /// Write every entry of `batch`, in order
    fn write_batch(&mut self, batch: &[LogEntry]) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    /// Flush and release underlying resources; must be safe to call twice
    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str;
}
