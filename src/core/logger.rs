//! Main logger implementation

use super::{
    config::LoggerConfig,
    diagnostics::Diagnostics,
    dispatcher::{Dispatcher, DispatcherHandle, SharedSinks},
    error::{LoggerError, Result},
    formatter::Formatter,
    log_entry::{ErrorInfo, LogEntry},
    log_level::LogLevel,
    metrics::LoggerMetrics,
    properties::Properties,
    queue::{BoundedQueue, CancellationToken},
    sink::Sink,
};
use crate::sinks::{ConsoleSink, FileSink};
use parking_lot::Mutex;
use std::error::Error;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// Default shutdown timeout for logger cleanup (5 seconds)
///
/// This is the default of `LoggerConfig::shutdown_timeout_ms`, used by
/// [`Logger::dispose`] and therefore when the logger is dropped.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Extra time a cancelled dispatcher gets to notice the signal and exit
const FORCED_CANCEL_GRACE: Duration = Duration::from_millis(500);

/// Lifecycle of a logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    /// Accepting entries
    Running,
    /// Shutdown requested; the dispatcher is draining
    Stopping,
    /// Dispatcher finished (or was abandoned) and sinks released
    Stopped,
}

/// Capability interface for code that only needs to submit entries
pub trait Log: Send + Sync {
    fn is_enabled(&self, level: LogLevel) -> bool;

    /// Hand a fully built entry to the logger; never blocks
    fn submit(&self, entry: LogEntry);
}

/// Asynchronous, batching logger
///
/// Logging calls validate nothing and never block: entries below the
/// minimum level are discarded, the rest go into a bounded queue drained
/// by a background dispatcher. When the queue is full the entry is dropped
/// and counted in [`LoggerMetrics::rejected`].
///
/// # Example
///
/// ```
/// use batchlog::{Logger, LoggerConfig, LogLevel, Properties};
///
/// let logger = Logger::new(LoggerConfig::default().with_min_level(LogLevel::Debug)).unwrap();
/// logger.info("service started");
/// logger.log_structured(
///     LogLevel::Info,
///     "user {id} logged in",
///     Properties::new().with("id", 42),
/// );
/// assert!(logger.shutdown(std::time::Duration::from_secs(5)));
/// ```
pub struct Logger {
    config: Arc<LoggerConfig>,
    queue: Arc<BoundedQueue<LogEntry>>,
    sinks: SharedSinks,
    cancel: CancellationToken,
    worker: Mutex<Option<DispatcherHandle>>,
    state: Mutex<LoggerState>,
    metrics: Arc<LoggerMetrics>,
    diagnostics: Diagnostics,
}

impl Logger {
    /// Validate `config`, open the configured sinks and start the dispatcher
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] listing every violation,
    /// or an IO error if the log file cannot be opened
    pub fn new(config: LoggerConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: LoggerConfig) -> LoggerBuilder {
        LoggerBuilder::new(config)
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.config.min_level
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if self.filter(level) {
            self.submit_entry(LogEntry::new(level, message));
        }
    }

    /// Log with an error payload captured from `error`
    pub fn log_error<E>(&self, level: LogLevel, message: impl Into<String>, error: &E)
    where
        E: Error + 'static,
    {
        if self.filter(level) {
            self.submit_entry(
                LogEntry::new(level, message).with_error(ErrorInfo::from_error(error)),
            );
        }
    }

    /// Log a message template; `{name}` placeholders are filled from
    /// `properties` when the entry is formatted
    pub fn log_structured(
        &self,
        level: LogLevel,
        template: impl Into<String>,
        properties: Properties,
    ) {
        if self.filter(level) {
            self.submit_entry(LogEntry::new(level, template).with_properties(properties));
        }
    }

    pub fn log_structured_error<E>(
        &self,
        level: LogLevel,
        template: impl Into<String>,
        properties: Properties,
        error: &E,
    ) where
        E: Error + 'static,
    {
        if self.filter(level) {
            self.submit_entry(
                LogEntry::new(level, template)
                    .with_properties(properties)
                    .with_error(ErrorInfo::from_error(error)),
            );
        }
    }

    /// Submit a prebuilt entry, still subject to the minimum level
    pub fn log_entry(&self, entry: LogEntry) {
        if self.filter(entry.level) {
            self.submit_entry(entry);
        }
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    fn filter(&self, level: LogLevel) -> bool {
        let enabled = self.is_enabled(level);
        if !enabled {
            self.metrics.record_filtered();
        }
        enabled
    }

    fn submit_entry(&self, entry: LogEntry) {
        if self.queue.try_enqueue(entry) {
            self.metrics.record_enqueued();
        } else {
            self.metrics.record_rejected();
        }
    }

    /// Delivery counters
    ///
    /// # Example
    ///
    /// ```
    /// use batchlog::{Logger, LoggerConfig};
    ///
    /// let logger = Logger::new(LoggerConfig::default()).unwrap();
    /// logger.info("hello");
    /// logger.dispose();
    ///
    /// let metrics = logger.metrics();
    /// assert_eq!(metrics.enqueued(), 1);
    /// assert_eq!(metrics.written(), 1);
    /// println!("Drop rate: {:.2}%", metrics.drop_rate());
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn state(&self) -> LoggerState {
        *self.state.lock()
    }

    /// Entries waiting for the dispatcher
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Stop accepting entries and wait up to `timeout` for the final flush
    ///
    /// If the dispatcher has not drained the queue by then, it is cancelled,
    /// anything still queued is discarded and `false` is returned. Calling
    /// this again after the first call returns `true` without doing anything.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use batchlog::{Logger, LoggerConfig};
    /// use std::time::Duration;
    ///
    /// let logger = Logger::new(LoggerConfig::default()).unwrap();
    /// logger.info("Important message");
    ///
    /// if !logger.shutdown(Duration::from_secs(10)) {
    ///     eprintln!("Warning: Logger shutdown timed out");
    /// }
    /// ```
    pub fn shutdown(&self, timeout: Duration) -> bool {
        {
            let mut state = self.state.lock();
            if *state != LoggerState::Running {
                return true;
            }
            *state = LoggerState::Stopping;
        }

        self.queue.complete();

        let mut drained = true;
        let mut finished = true;
        if let Some(mut worker) = self.worker.lock().take() {
            if !worker.wait(timeout) {
                drained = false;
                self.diagnostics
                    .report(&LoggerError::ShutdownTimeout { timeout });
                self.cancel.cancel();
                finished = worker.wait(FORCED_CANCEL_GRACE);
            }
        }

        self.queue.dispose();

        if !finished {
            // The dispatcher is stuck inside a sink; release what is reachable
            if let Some(mut sinks) = self.sinks.try_lock_for(FORCED_CANCEL_GRACE) {
                for sink in sinks.iter_mut() {
                    let name = sink.name().to_string();
                    match panic::catch_unwind(AssertUnwindSafe(|| sink.close())) {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => self.diagnostics.report(&e),
                        Err(payload) => self.diagnostics.report(&LoggerError::SinkPanicked {
                            sink: name,
                            message: super::dispatcher::panic_message(payload.as_ref()),
                        }),
                    }
                }
            }
        }

        *self.state.lock() = LoggerState::Stopped;
        drained
    }

    /// Shut down with the configured timeout; idempotent
    pub fn dispose(&self) {
        self.shutdown(self.config.shutdown_timeout());
    }
}

impl Log for Logger {
    fn is_enabled(&self, level: LogLevel) -> bool {
        Logger::is_enabled(self, level)
    }

    fn submit(&self, entry: LogEntry) {
        self.log_entry(entry);
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Builder for constructing a [`Logger`]
///
/// # Example
/// ```
/// use batchlog::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder(LoggerConfig::default().with_colors(false))
///     .console_writer(std::io::sink())
///     .diagnostics(Diagnostics::with_handler(Arc::new(|err| {
///         eprintln!("logger trouble: {}", err);
///     })))
///     .build()
///     .unwrap();
/// logger.warn("disk almost full");
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    sinks: Vec<Box<dyn Sink>>,
    console_writer: Option<Box<dyn Write + Send>>,
    diagnostics: Diagnostics,
}

impl LoggerBuilder {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            sinks: Vec::new(),
            console_writer: None,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Add a sink after the built-in console and file sinks
    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Send console output somewhere other than standard output
    #[must_use = "builder methods return a new value"]
    pub fn console_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.console_writer = Some(Box::new(writer));
        self
    }

    /// Replace the standard-error reporter for internal failures
    #[must_use = "builder methods return a new value"]
    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Validate the configuration, open sinks and start the dispatcher
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration, an unopenable log file, or if the
    /// dispatcher thread cannot be spawned
    pub fn build(self) -> Result<Logger> {
        let LoggerBuilder {
            config,
            sinks: extra_sinks,
            console_writer,
            diagnostics,
        } = self;
        config.validate()?;

        let metrics = Arc::new(LoggerMetrics::new());
        let mut sinks: Vec<Box<dyn Sink>> = Vec::with_capacity(2 + extra_sinks.len());

        if config.console_enabled {
            let formatter = Formatter::from_config(&config);
            let console = match console_writer {
                Some(writer) => ConsoleSink::with_writer(formatter, writer),
                None => ConsoleSink::stdout(formatter),
            };
            sinks.push(Box::new(console.with_colors(config.use_colors)));
        }

        if config.file_enabled {
            let file = FileSink::from_config(&config, diagnostics.clone())?
                .with_metrics(Arc::clone(&metrics));
            sinks.push(Box::new(file));
        }

        sinks.extend(extra_sinks);

        let queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let sinks: SharedSinks = Arc::new(Mutex::new(sinks));
        let cancel = CancellationToken::new();

        let worker = Dispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&sinks),
            cancel.clone(),
            config.batch_size,
            config.flush_interval(),
            Arc::clone(&metrics),
            diagnostics.clone(),
        )
        .spawn()
        .map_err(|e| {
            LoggerError::io_operation("start dispatcher", "Failed to spawn dispatcher thread", e)
        })?;

        Ok(Logger {
            config: Arc::new(config),
            queue,
            sinks,
            cancel,
            worker: Mutex::new(Some(worker)),
            state: Mutex::new(LoggerState::Running),
            metrics,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<LogEntry>>>);

    impl Sink for Collect {
        fn write_batch(&mut self, batch: &[LogEntry]) -> Result<()> {
            self.0.lock().extend_from_slice(batch);
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "collect"
        }
    }

    struct Stuck;

    impl Sink for Stuck {
        fn write_batch(&mut self, _batch: &[LogEntry]) -> Result<()> {
            std::thread::sleep(Duration::from_millis(1500));
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "stuck"
        }
    }

    fn quiet_config() -> LoggerConfig {
        LoggerConfig::default().with_colors(false)
    }

    fn build(config: LoggerConfig, sink: impl Sink + 'static) -> Logger {
        Logger::builder(config)
            .console_writer(std::io::sink())
            .sink(sink)
            .diagnostics(Diagnostics::with_handler(Arc::new(|_| {})))
            .build()
            .unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let err = Logger::new(LoggerConfig::default().with_console(false)).err().unwrap();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(!err.validation_errors().is_empty());
    }

    #[test]
    fn test_min_level_filtering() {
        let collect = Collect::default();
        let logger = build(quiet_config().with_min_level(LogLevel::Warn), collect.clone());

        logger.debug("dropped");
        logger.info("dropped");
        logger.warn("kept");
        logger.fatal("kept too");
        logger.dispose();

        let messages: Vec<String> = collect.0.lock().iter().map(|e| e.message.clone()).collect();
        assert_eq!(messages, vec!["kept", "kept too"]);
        assert_eq!(logger.metrics().filtered(), 2);
        assert_eq!(logger.metrics().enqueued(), 2);
    }

    #[test]
    fn test_log_error_captures_payload() {
        #[derive(Debug, thiserror::Error)]
        #[error("connection refused")]
        struct ConnectError;

        let collect = Collect::default();
        let logger = build(quiet_config(), collect.clone());
        logger.log_error(LogLevel::Error, "upstream failed", &ConnectError);
        logger.dispose();

        let entries = collect.0.lock();
        let error = entries[0].error.as_ref().unwrap();
        assert_eq!(error.message, "connection refused");
        assert!(error.type_name.ends_with("ConnectError"));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let collect = Collect::default();
        let logger = build(quiet_config(), collect.clone());
        logger.info("once");

        logger.dispose();
        assert_eq!(logger.state(), LoggerState::Stopped);
        logger.dispose();
        assert!(logger.shutdown(Duration::from_millis(10)));

        logger.info("after shutdown");
        assert_eq!(collect.0.lock().len(), 1);
        assert_eq!(logger.metrics().rejected(), 1);
    }

    #[test]
    fn test_shutdown_timeout_forces_cancel() {
        let logger = build(quiet_config().with_batch_size(1), Stuck);
        for i in 0..5 {
            logger.info(format!("slow {}", i));
        }

        let start = Instant::now();
        assert!(!logger.shutdown(Duration::from_millis(100)));
        assert!(start.elapsed() < Duration::from_secs(3));
        assert_eq!(logger.state(), LoggerState::Stopped);
    }

    #[test]
    fn test_log_trait_object() {
        let collect = Collect::default();
        let logger = build(quiet_config(), collect.clone());
        {
            let log: &dyn Log = &logger;
            assert!(!log.is_enabled(LogLevel::Debug));
            log.submit(LogEntry::new(LogLevel::Info, "via trait"));
        }
        logger.dispose();
        assert_eq!(collect.0.lock()[0].message, "via trait");
    }
}
