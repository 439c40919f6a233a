//! # batchlog
//!
//! An in-process logging library that never blocks the calling thread.
//! Entries go into a bounded queue and a background dispatcher writes them
//! in batches to the console and to a size-rotated log file.
//!
//! ## Features
//!
//! - **Non-blocking**: a full queue drops the entry instead of waiting
//! - **Batching**: flush on batch size or flush interval, whichever comes first
//! - **Rotation**: size-based rotation with timestamped names and retention
//! - **Formats**: text, key=value and JSON, with `{placeholder}` templates
//!
//! ```
//! use batchlog::prelude::*;
//!
//! let logger = Logger::new(LoggerConfig::default()).unwrap();
//! logger.log_structured(
//!     LogLevel::Info,
//!     "order {id} shipped",
//!     props! { "id" => 1042, "carrier" => "dhl" },
//! );
//! logger.dispose();
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub use crate::core::global;

pub mod prelude {
    pub use crate::core::{
        Diagnostics, ErrorInfo, Formatter, Log, LogEntry, LogLevel, Logger, LoggerBuilder,
        LoggerConfig, LoggerError, LoggerMetrics, LoggerState, OutputFormat, Properties,
        PropertyValue, Result, Sink, TimestampFormat, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::props;
    pub use crate::sinks::{ConsoleSink, FileSink, RotationManager};
}

pub use crate::core::{
    Diagnostics, ErrorInfo, Formatter, Log, LogEntry, LogLevel, Logger, LoggerBuilder,
    LoggerConfig, LoggerError, LoggerMetrics, LoggerState, OutputFormat, Properties,
    PropertyValue, Result, Sink, TimestampFormat, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::sinks::{ConsoleSink, FileSink, RotationManager};
