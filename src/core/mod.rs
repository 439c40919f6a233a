//! Core logger types and the asynchronous delivery pipeline

pub mod config;
pub mod diagnostics;
pub mod dispatcher;
pub mod error;
pub mod formatter;
pub mod global;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod properties;
pub mod queue;
pub mod sink;
pub mod timestamp;

pub use config::LoggerConfig;
pub use diagnostics::{DiagnosticHandler, Diagnostics};
pub use dispatcher::{Dispatcher, DispatcherHandle, DispatcherState, SharedSinks};
pub use error::{LoggerError, Result};
pub use formatter::{render_template, Formatter, OutputFormat};
pub use log_entry::{ErrorInfo, LogEntry};
pub use log_level::LogLevel;
pub use logger::{Log, Logger, LoggerBuilder, LoggerState, DEFAULT_SHUTDOWN_TIMEOUT};
pub use metrics::LoggerMetrics;
pub use properties::{Properties, PropertyValue};
pub use queue::{BoundedQueue, CancellationToken, WaitOutcome};
pub use sink::Sink;
pub use timestamp::TimestampFormat;
