//! Diagnostic side-channel for the logger's own failures
//!
//! Sink and rotation errors never reach the caller of `Logger::log`. They are
//! handed to a [`Diagnostics`] handle instead, which writes them to standard
//! error unless a custom handler is installed.

use super::error::LoggerError;
use std::fmt;
use std::sync::Arc;

/// Callback invoked for every internally recovered error
pub type DiagnosticHandler = Arc<dyn Fn(&LoggerError) + Send + Sync>;

#[derive(Clone)]
pub struct Diagnostics {
    handler: DiagnosticHandler,
}

impl Diagnostics {
    /// Report to standard error with the `[LOGGER ERROR]` prefix
    pub fn stderr() -> Self {
        Self {
            handler: Arc::new(|err| eprintln!("[LOGGER ERROR] {}", err)),
        }
    }

    pub fn with_handler(handler: DiagnosticHandler) -> Self {
        Self { handler }
    }

    pub fn report(&self, error: &LoggerError) {
        (self.handler)(error);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::stderr()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}
