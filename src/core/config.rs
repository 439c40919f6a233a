//! Logger configuration and validation
//!
//! A [`LoggerConfig`] is immutable once a logger has been constructed from
//! it. [`LoggerConfig::validate`] collects every violation at once so the
//! caller sees the complete list in a single `InvalidConfiguration` error.

use super::error::{LoggerError, Result};
use super::formatter::OutputFormat;
use super::log_level::LogLevel;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const MAX_QUEUE_CAPACITY: usize = 1_000_000;
pub const MAX_FLUSH_INTERVAL_MS: u64 = 300_000;
pub const MAX_RETAINED_FILES: usize = 1_000;
pub const MIN_FILE_SIZE: u64 = 1024;

pub const BASE_SLOT: &str = "{base}";
pub const TIMESTAMP_SLOT: &str = "{timestamp}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub console_enabled: bool,
    pub file_enabled: bool,
    /// Explicit log file path; takes priority over `folder_name`/`base_name`
    pub file_path: Option<PathBuf>,
    /// Folder (relative to the working directory) for the derived default path
    pub folder_name: String,
    /// Base file name for the derived default path; defaults to the executable name
    pub base_name: Option<String>,
    pub min_level: LogLevel,
    pub max_file_size: u64,
    pub max_retained_files: usize,
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub flush_interval_ms: u64,
    pub file_buffer_size: usize,
    pub rotation_enabled: bool,
    /// Rotated file name pattern with `{base}` and `{timestamp}` slots
    pub file_name_pattern: String,
    pub output_format: OutputFormat,
    pub include_structured_data: bool,
    pub timestamp_format: TimestampFormat,
    pub use_colors: bool,
    pub shutdown_timeout_ms: u64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            file_enabled: false,
            file_path: None,
            folder_name: "logs".to_string(),
            base_name: None,
            min_level: LogLevel::Info,
            max_file_size: 10 * 1024 * 1024,
            max_retained_files: 5,
            queue_capacity: 1024,
            batch_size: 100,
            flush_interval_ms: 1000,
            file_buffer_size: 4096,
            rotation_enabled: true,
            file_name_pattern: format!("{}_{}.log", BASE_SLOT, TIMESTAMP_SLOT),
            output_format: OutputFormat::Text,
            include_structured_data: false,
            timestamp_format: TimestampFormat::Iso8601,
            use_colors: true,
            shutdown_timeout_ms: 5000,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console_enabled = enabled;
        self
    }

    /// Enable the file sink writing to `path`
    #[must_use = "builder methods return a new value"]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_enabled = true;
        self.file_path = Some(path.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_file_enabled(mut self, enabled: bool) -> Self {
        self.file_enabled = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_folder_name(mut self, folder: impl Into<String>) -> Self {
        self.folder_name = folder.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_base_name(mut self, base: impl Into<String>) -> Self {
        self.base_name = Some(base.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_retained_files(mut self, count: usize) -> Self {
        self.max_retained_files = count;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_flush_interval_ms(mut self, ms: u64) -> Self {
        self.flush_interval_ms = ms;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_file_buffer_size(mut self, bytes: usize) -> Self {
        self.file_buffer_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_rotation(mut self, enabled: bool) -> Self {
        self.rotation_enabled = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_file_name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_name_pattern = pattern.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_structured_data(mut self, include: bool) -> Self {
        self.include_structured_data = include;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.use_colors = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_shutdown_timeout_ms(mut self, ms: u64) -> Self {
        self.shutdown_timeout_ms = ms;
        self
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Base name used for the derived default path
    pub fn effective_base_name(&self) -> String {
        if let Some(base) = self.base_name.as_deref().filter(|b| !b.trim().is_empty()) {
            return base.to_string();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "app".to_string())
    }

    /// Resolve the active log file path
    ///
    /// An explicit `file_path` wins; otherwise the path is
    /// `<current dir>/<folder_name>/<base>.log`. Returns `None` when no
    /// usable path can be derived.
    pub fn resolved_file_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.file_path {
            return path.file_name().is_some().then(|| path.clone());
        }
        if self.folder_name.trim().is_empty() {
            return None;
        }
        let dir = std::env::current_dir().ok()?.join(&self.folder_name);
        Some(dir.join(format!("{}.log", self.effective_base_name())))
    }

    /// Check every invariant, returning all violations together
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            errors.push(format!(
                "queue_capacity must be between 1 and {} (got {})",
                MAX_QUEUE_CAPACITY, self.queue_capacity
            ));
        }
        if self.batch_size == 0 || self.batch_size > self.queue_capacity {
            errors.push(format!(
                "batch_size must be between 1 and queue_capacity {} (got {})",
                self.queue_capacity, self.batch_size
            ));
        }
        if self.flush_interval_ms == 0 || self.flush_interval_ms > MAX_FLUSH_INTERVAL_MS {
            errors.push(format!(
                "flush_interval_ms must be between 1 and {} (got {})",
                MAX_FLUSH_INTERVAL_MS, self.flush_interval_ms
            ));
        }
        if !self.timestamp_format.is_valid() {
            errors.push(format!(
                "timestamp_format is not a valid strftime pattern (got {:?})",
                self.timestamp_format
            ));
        }
        if self.shutdown_timeout_ms == 0 {
            errors.push("shutdown_timeout_ms must be greater than 0".to_string());
        }
        if !self.console_enabled && !self.file_enabled {
            errors.push("at least one sink (console or file) must be enabled".to_string());
        }

        if self.file_enabled {
            if self.max_file_size < MIN_FILE_SIZE {
                errors.push(format!(
                    "max_file_size must be at least {} bytes (got {})",
                    MIN_FILE_SIZE, self.max_file_size
                ));
            }
            if self.max_retained_files > MAX_RETAINED_FILES {
                errors.push(format!(
                    "max_retained_files must be at most {} (got {})",
                    MAX_RETAINED_FILES, self.max_retained_files
                ));
            }
            if self.file_buffer_size == 0 {
                errors.push("file_buffer_size must be greater than 0".to_string());
            }
            if !self.file_name_pattern.contains(BASE_SLOT)
                || !self.file_name_pattern.contains(TIMESTAMP_SLOT)
            {
                errors.push(format!(
                    "file_name_pattern must contain both {} and {} (got '{}')",
                    BASE_SLOT, TIMESTAMP_SLOT, self.file_name_pattern
                ));
            }
            if self.resolved_file_path().is_none() {
                errors.push("no resolvable log file path".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LoggerError::InvalidConfiguration { errors })
        }
    }
}
