//! Error types for the logger system

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Configuration rejected at construction, with every violation found
    #[error("Invalid logger configuration: {}", .errors.join("; "))]
    InvalidConfiguration { errors: Vec<String> },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File sink error with path
    #[error("File sink error for '{path}': {message}")]
    FileSink { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    Rotation { path: String, message: String },

    /// Failure deleting a rotated file beyond the retention count
    #[error("Failed to remove rotated file '{path}': {message}")]
    Cleanup { path: String, message: String },

    /// Console write failure
    #[error("Console sink error: {0}")]
    Console(String),

    /// A sink panicked while handling a batch
    #[error("Sink '{sink}' panicked: {message}")]
    SinkPanicked { sink: String, message: String },

    /// The dispatcher did not drain within the shutdown grace period
    #[error("Dispatcher did not finish within {timeout:?}; unflushed entries were lost")]
    ShutdownTimeout { timeout: Duration },

    /// The process-wide logger was already initialized
    #[error("Global logger already initialized")]
    AlreadyInitialized,
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error from a list of violations
    pub fn config<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LoggerError::InvalidConfiguration {
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a file sink error
    pub fn file_sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileSink {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Rotation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a rotated-file cleanup error
    pub fn cleanup(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Cleanup {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a console error
    pub fn console<S: Into<String>>(msg: S) -> Self {
        LoggerError::Console(msg.into())
    }

    /// Validation errors carried by an `InvalidConfiguration`, empty otherwise
    pub fn validation_errors(&self) -> &[String] {
        match self {
            LoggerError::InvalidConfiguration { errors } => errors,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config(["queue_capacity must be greater than 0"]);
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert_eq!(err.validation_errors().len(), 1);

        let err = LoggerError::file_sink("/var/log/app.log", "Permission denied");
        assert!(matches!(err, LoggerError::FileSink { .. }));
        assert!(err.validation_errors().is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::config(["a", "b"]);
        assert_eq!(err.to_string(), "Invalid logger configuration: a; b");

        let err = LoggerError::file_rotation("/var/log/app.log", "Disk full");
        assert_eq!(
            err.to_string(),
            "File rotation failed for '/var/log/app.log': Disk full"
        );

        let err = LoggerError::cleanup("/var/log/app_1.log", "busy");
        assert_eq!(
            err.to_string(),
            "Failed to remove rotated file '/var/log/app_1.log': busy"
        );
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("writing log file", "cannot write to file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("writing log file"));
        assert!(err.to_string().contains("cannot write to file"));
    }
}
