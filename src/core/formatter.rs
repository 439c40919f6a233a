//! Rendering of log entries
//!
//! Three output formats share one field set:
//! - Text: `2025-01-08T10:30:45.123Z [INFO ] [main] Request processed`
//! - KeyValue: `timestamp=... level=INFO threadId=main message="Request processed"`
//! - Json: `{"timestamp":"...","level":"INFO","threadId":"main","message":"Request processed"}`
//!
//! `{name}` placeholders in the message are replaced by the matching
//! property before any of the formats is produced.

use super::config::LoggerConfig;
use super::log_entry::{escape_control_chars, ErrorInfo, LogEntry};
use super::properties::{Properties, PropertyValue};
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Keys every structured rendering emits; properties may not shadow them
const FIXED_KEYS: [&str; 5] = ["timestamp", "level", "threadId", "message", "exception"];

/// Output format for log entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format (default)
    #[default]
    Text,

    /// One JSON object per line
    Json,

    /// Key=value pairs, one key per property
    KeyValue,
}

/// Replace `{name}` placeholders with the text of matching properties
///
/// Placeholders without a matching property are left literally in place.
/// Substituted text has its control characters escaped like the message.
///
/// ```
/// use batchlog::core::{render_template, Properties};
///
/// let props = Properties::new().with("id", 42);
/// assert_eq!(render_template("user {id} logged in", &props), "user 42 logged in");
/// assert_eq!(render_template("{missing}", &props), "{missing}");
/// ```
pub fn render_template(template: &str, properties: &Properties) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let name = &after[..close];
                match properties.get(name).filter(|_| !name.is_empty()) {
                    Some(value) => out.push_str(&escape_control_chars(&value.to_string())),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            // Unterminated or nested brace: keep the '{' and rescan after it
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Pure renderer from entry to text
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    output_format: OutputFormat,
    timestamp_format: TimestampFormat,
    include_structured_data: bool,
}

impl Formatter {
    pub fn new(output_format: OutputFormat) -> Self {
        Self {
            output_format,
            ..Self::default()
        }
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        Self {
            output_format: config.output_format,
            timestamp_format: config.timestamp_format.clone(),
            include_structured_data: config.include_structured_data,
        }
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn with_structured_data(mut self, include: bool) -> Self {
        self.include_structured_data = include;
        self
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Render an entry without a trailing newline
    pub fn format(&self, entry: &LogEntry) -> String {
        match self.output_format {
            OutputFormat::Text => self.format_text(entry),
            OutputFormat::Json => self.format_json(entry),
            OutputFormat::KeyValue => self.format_key_value(entry),
        }
    }

    /// The entry's message with placeholders substituted
    pub fn message<'a>(&self, entry: &'a LogEntry) -> Cow<'a, str> {
        match &entry.properties {
            Some(props) if entry.message.contains('{') => {
                Cow::Owned(render_template(&entry.message, props))
            }
            _ => Cow::Borrowed(&entry.message),
        }
    }

    fn format_text(&self, entry: &LogEntry) -> String {
        let mut out = format!(
            "{} [{:5}] [{}] {}",
            self.timestamp_format.format(&entry.timestamp),
            entry.level,
            entry.thread_id,
            self.message(entry)
        );

        if self.include_structured_data {
            if let Some(props) = &entry.properties {
                out.push(' ');
                out.push_str(&props.to_json_value().to_string());
            }
        }

        if let Some(error) = &entry.error {
            out.push('\n');
            out.push_str(&error.to_string());
            if let Some(stack) = &error.stack {
                out.push('\n');
                out.push_str(stack);
            }
        }

        out
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        let mut obj = serde_json::Map::new();

        let timestamp = if self.timestamp_format.is_numeric() {
            serde_json::Value::Number(entry.timestamp.timestamp_millis().into())
        } else {
            serde_json::Value::String(self.timestamp_format.format(&entry.timestamp))
        };
        obj.insert("timestamp".to_string(), timestamp);
        obj.insert(
            "level".to_string(),
            serde_json::Value::String(entry.level.to_str().to_string()),
        );
        obj.insert(
            "threadId".to_string(),
            serde_json::Value::String(entry.thread_id.clone()),
        );
        obj.insert(
            "message".to_string(),
            serde_json::Value::String(self.message(entry).into_owned()),
        );
        if let Some(error) = &entry.error {
            obj.insert("exception".to_string(), error_json(error));
        }

        if let Some(props) = &entry.properties {
            for (key, value) in props.iter().filter(|(k, _)| !FIXED_KEYS.contains(k)) {
                obj.insert(key.to_string(), value.to_json_value());
            }
        }

        serde_json::Value::Object(obj).to_string()
    }

    fn format_key_value(&self, entry: &LogEntry) -> String {
        let mut parts = vec![
            format!(
                "timestamp={}",
                escape_value(&self.timestamp_format.format(&entry.timestamp))
            ),
            format!("level={}", entry.level.to_str()),
            format!("threadId={}", escape_value(&entry.thread_id)),
            format!("message={}", quote_value(&self.message(entry))),
        ];

        if let Some(error) = &entry.error {
            parts.push(format!("exception={}", quote_value(&error.to_string())));
        }

        if let Some(props) = &entry.properties {
            for (key, value) in props.iter().filter(|(k, _)| !FIXED_KEYS.contains(k)) {
                let formatted = match value {
                    PropertyValue::String(s) => quote_value(s),
                    PropertyValue::Object(_) => quote_value(&value.to_string()),
                    other => other.to_string(),
                };
                parts.push(format!("{}={}", escape_key(key), formatted));
            }
        }

        parts.join(" ")
    }
}

fn error_json(error: &ErrorInfo) -> serde_json::Value {
    serde_json::json!({
        "type": error.type_name,
        "message": error.message,
        "stack": error.stack,
    })
}

/// Strip characters that would break key=value parsing
fn escape_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect()
}

/// Quote a value only when it contains separators
fn escape_value(value: &str) -> String {
    if value.is_empty() || value.contains([' ', '"', '=', '\n', '\r', '\t']) {
        quote_value(value)
    } else {
        value.to_string()
    }
}

fn quote_value(value: &str) -> String {
    format!(
        "\"{}\"",
        value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    )
}
