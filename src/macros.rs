//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`, plus [`props!`]
//! for building the property map of a structured entry.
//!
//! # Examples
//!
//! ```
//! use batchlog::prelude::*;
//! use batchlog::info;
//!
//! let logger = Logger::new(LoggerConfig::default()).unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // Structured, substituted when the entry is formatted
//! logger.log_structured(LogLevel::Info, "user {id} logged in", props! { "id" => 42 });
//! ```

/// Log a message with automatic formatting.
///
/// The arguments are only formatted when `$level` passes the logger's
/// minimum level.
///
/// # Examples
///
/// ```
/// # use batchlog::prelude::*;
/// # let logger = Logger::new(LoggerConfig::default()).unwrap();
/// use batchlog::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            logger.log(level, format!($($arg)+));
        }
    }};
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use batchlog::prelude::*;
/// # let logger = Logger::new(LoggerConfig::default().with_min_level(LogLevel::Debug)).unwrap();
/// use batchlog::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use batchlog::prelude::*;
/// # let logger = Logger::new(LoggerConfig::default()).unwrap();
/// use batchlog::warn;
/// warn!(logger, "Low disk space");
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

/// Build a [`Properties`](crate::Properties) map, keeping insertion order.
///
/// ```
/// use batchlog::props;
///
/// let props = props! { "user" => "alice", "attempts" => 3, "admin" => false };
/// assert_eq!(props.len(), 3);
/// assert_eq!(props.get("user").unwrap().to_string(), "alice");
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::Properties::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut props = $crate::Properties::new();
        $(
            props.insert($key, $value);
        )+
        props
    }};
}

#[cfg(test)]
mod tests {
    use crate::core::{Diagnostics, LogEntry, LogLevel, Logger, LoggerConfig, Result, Sink};
    use parking_lot::Mutex;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<(LogLevel, String)>>>);

    impl Sink for Collect {
        fn write_batch(&mut self, batch: &[LogEntry]) -> Result<()> {
            self.0
                .lock()
                .extend(batch.iter().map(|e| (e.level, e.message.clone())));
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "collect"
        }
    }

    fn logger(collect: &Collect) -> Logger {
        Logger::builder(LoggerConfig::default().with_min_level(LogLevel::Debug))
            .console_writer(std::io::sink())
            .sink(collect.clone())
            .diagnostics(Diagnostics::with_handler(Arc::new(|_| {})))
            .build()
            .unwrap()
    }

    #[test]
    fn test_level_macros() {
        let collect = Collect::default();
        let logger = logger(&collect);

        log!(logger, LogLevel::Info, "Formatted: {}", 42);
        debug!(logger, "Count: {}", 5);
        info!(logger, "Items: {}", 100);
        warn!(logger, "Retry {} of {}", 1, 3);
        error!(logger, "Code: {}", 500);
        fatal!(logger, "Critical failure: {}", "system");
        logger.dispose();

        let seen = collect.0.lock().clone();
        assert_eq!(
            seen,
            vec![
                (LogLevel::Info, "Formatted: 42".to_string()),
                (LogLevel::Debug, "Count: 5".to_string()),
                (LogLevel::Info, "Items: 100".to_string()),
                (LogLevel::Warn, "Retry 1 of 3".to_string()),
                (LogLevel::Error, "Code: 500".to_string()),
                (LogLevel::Fatal, "Critical failure: system".to_string()),
            ]
        );
    }

    #[test]
    fn test_filtered_macro_skips_formatting() {
        struct Loud<'a>(&'a AtomicUsize);

        impl fmt::Display for Loud<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fetch_add(1, Ordering::SeqCst);
                write!(f, "loud")
            }
        }

        let collect = Collect::default();
        let logger = Logger::builder(LoggerConfig::default().with_min_level(LogLevel::Warn))
            .console_writer(std::io::sink())
            .sink(collect.clone())
            .build()
            .unwrap();
        let rendered = AtomicUsize::new(0);

        debug!(logger, "{}", Loud(&rendered));
        info!(logger, "{}", Loud(&rendered));
        warn!(logger, "{}", Loud(&rendered));
        logger.dispose();

        assert_eq!(rendered.load(Ordering::SeqCst), 1);
        assert_eq!(collect.0.lock().clone(), vec![(LogLevel::Warn, "loud".to_string())]);
    }

    #[test]
    fn test_props_macro() {
        let empty = props!();
        assert!(empty.is_empty());

        let props = props! {
            "id" => 7,
            "name" => "widget",
            "id" => 8,
        };
        let keys: Vec<&str> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["id", "name"]);
        assert_eq!(props.get("id").unwrap().to_string(), "8");
    }
}
