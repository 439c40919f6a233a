//! Log entry structure

use super::log_level::LogLevel;
use super::properties::Properties;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::cell::RefCell;
use std::error::Error;
use std::fmt;

// Thread-local cache so the thread label is computed once per thread
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Get the cached thread label: the thread name if set, else its `ThreadId`
fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let thread = std::thread::current();
                match thread.name() {
                    Some(name) => name.to_string(),
                    None => format!("{:?}", thread.id()),
                }
            })
            .clone()
    })
}

/// Error payload carried by an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub type_name: String,
    pub message: String,
    /// Source chain, one `caused by:` line per level
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            stack: None,
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Capture an error's type, message and `source()` chain
    pub fn from_error<E: Error + 'static>(error: &E) -> Self {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        Self {
            type_name: std::any::type_name::<E>().to_string(),
            message: error.to_string(),
            stack: if chain.is_empty() {
                None
            } else {
                Some(chain.join("\n"))
            },
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

/// A single log record, immutable once created
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub thread_id: String,
    pub error: Option<ErrorInfo>,
    pub properties: Option<Properties>,
}

/// Escape control characters so one entry can never forge another line
pub(crate) fn escape_control_chars(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r', '\t']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t"),
    )
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: escape_control_chars(&message.into()).into_owned(),
            // Millisecond precision is all the formatters render
            timestamp: truncate_to_millis(Utc::now()),
            thread_id: current_thread_id(),
            error: None,
            properties: None,
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = if properties.is_empty() {
            None
        } else {
            Some(properties)
        };
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = truncate_to_millis(timestamp);
        self
    }
}

fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}
