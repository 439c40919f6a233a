//! Process-wide default logger
//!
//! The global logger is created lazily on first use from the configuration
//! passed to [`configure`], or from `LoggerConfig::default()` if nothing was
//! configured. A static is never dropped, so applications must call
//! [`shutdown`] before exiting to flush pending entries.

use super::{
    config::LoggerConfig,
    error::{LoggerError, Result},
    logger::Logger,
};
use parking_lot::{const_mutex, Mutex};
use std::sync::OnceLock;

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// Configuration waiting for the first call to [`logger`]
static PENDING: Mutex<Option<LoggerConfig>> = const_mutex(None);

/// Set the configuration used when the global logger is first created
///
/// The configuration is validated immediately.
///
/// # Errors
///
/// Returns [`LoggerError::AlreadyInitialized`] once the global logger exists,
/// or the validation failure
pub fn configure(config: LoggerConfig) -> Result<()> {
    let mut pending = PENDING.lock();
    if GLOBAL.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }
    config.validate()?;
    *pending = Some(config);
    Ok(())
}

/// The global logger, created on first call
///
/// # Errors
///
/// Fails if the logger cannot be constructed; the next call retries
pub fn logger() -> Result<&'static Logger> {
    if let Some(logger) = GLOBAL.get() {
        return Ok(logger);
    }

    let mut pending = PENDING.lock();
    if let Some(logger) = GLOBAL.get() {
        return Ok(logger);
    }

    let config = pending.clone().unwrap_or_default();
    let logger = Logger::new(config)?;
    pending.take();
    Ok(GLOBAL.get_or_init(|| logger))
}

/// The global logger if it has already been created
pub fn try_logger() -> Option<&'static Logger> {
    GLOBAL.get()
}

/// Flush and stop the global logger
///
/// Returns `true` if nothing was running or everything was flushed within
/// the configured shutdown timeout. Later calls to [`logger`] return the
/// stopped instance, which rejects every entry.
pub fn shutdown() -> bool {
    match GLOBAL.get() {
        Some(logger) => logger.shutdown(logger.config().shutdown_timeout()),
        None => true,
    }
}
