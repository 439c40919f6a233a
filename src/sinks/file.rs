//! Buffered, rotation-aware file sink

use super::rotation::RotationManager;
use crate::core::config::LoggerConfig;
use crate::core::diagnostics::Diagnostics;
use crate::core::error::{LoggerError, Result};
use crate::core::formatter::Formatter;
use crate::core::log_entry::LogEntry;
use crate::core::metrics::LoggerMetrics;
use crate::core::sink::Sink;
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Open handle on the active file plus its byte accounting
#[derive(Debug, Default)]
pub struct FileCursor {
    writer: Option<BufWriter<File>>,
    bytes_written: u64,
    generation: u64,
}

impl FileCursor {
    /// Bytes in the active file, including anything still buffered
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Number of completed rotations
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

/// Appends formatted entries to the active log file
///
/// Before each line that would push the file past its size threshold the
/// sink flushes, hands the file to its [`RotationManager`] and reopens a
/// fresh file at the same path.
///
/// # Examples
///
/// ```no_run
/// use batchlog::core::{Diagnostics, Formatter, OutputFormat};
/// use batchlog::sinks::{FileSink, RotationManager};
///
/// let rotation = RotationManager::new("logs/app.log", "{base}_{timestamp}.log", 1 << 20, 5);
/// let sink = FileSink::open(
///     Formatter::new(OutputFormat::Json),
///     rotation,
///     8192,
///     Diagnostics::stderr(),
/// )
/// .unwrap();
/// ```
pub struct FileSink {
    path: PathBuf,
    formatter: Formatter,
    rotation: RotationManager,
    cursor: FileCursor,
    buffer_size: usize,
    diagnostics: Diagnostics,
    metrics: Option<Arc<LoggerMetrics>>,
    closed: bool,
}

impl FileSink {
    /// Open (or create) the active file named by `rotation`
    ///
    /// A file already at the size threshold is rotated before the first
    /// write; a failure there is reported and logging continues in the
    /// existing file.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or the file cannot
    /// be opened
    pub fn open(
        formatter: Formatter,
        rotation: RotationManager,
        buffer_size: usize,
        diagnostics: Diagnostics,
    ) -> Result<Self> {
        let path = rotation.active_path().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let mut sink = Self {
            path,
            formatter,
            rotation,
            cursor: FileCursor::default(),
            buffer_size: buffer_size.max(1),
            diagnostics,
            metrics: None,
            closed: false,
        };
        sink.reopen()?;

        if sink.rotation.needs_rotation_at_startup(sink.cursor.bytes_written) {
            if let Err(e) = sink.rotate() {
                sink.diagnostics.report(&e);
            }
        }

        Ok(sink)
    }

    /// Open the file sink described by `config`
    ///
    /// # Errors
    ///
    /// Fails if no file path can be resolved or the file cannot be opened
    pub fn from_config(config: &LoggerConfig, diagnostics: Diagnostics) -> Result<Self> {
        let path = config.resolved_file_path().ok_or_else(|| {
            LoggerError::config(["file logging enabled but no file path could be resolved"])
        })?;
        Self::open(
            Formatter::from_config(config),
            RotationManager::from_config(config, path),
            config.file_buffer_size,
            diagnostics,
        )
    }

    /// Count rotations into shared logger metrics
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<LoggerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cursor(&self) -> &FileCursor {
        &self.cursor
    }

    fn reopen(&mut self) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::file_sink(
                    self.path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })?;

        let existing = file.metadata().map(|m| m.len()).map_err(|e| {
            LoggerError::file_sink(
                self.path.display().to_string(),
                format!("Cannot access file metadata: {}", e),
            )
        })?;

        self.cursor.writer = Some(BufWriter::with_capacity(self.buffer_size, file));
        self.cursor.bytes_written = existing;
        Ok(())
    }

    /// Flush, rename the active file away, prune, and start a fresh file
    ///
    /// If the rename fails the original file is reopened and its counter
    /// reset, so the next write does not immediately retry.
    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.cursor.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        match self.rotation.rotate(&Local::now()) {
            Ok(_) => {
                let report = self.rotation.prune();
                for failure in &report.failures {
                    self.diagnostics.report(failure);
                }
                self.reopen()?;
                self.cursor.bytes_written = 0;
                self.cursor.generation += 1;
                if let Some(metrics) = &self.metrics {
                    metrics.record_rotation();
                }
                Ok(())
            }
            Err(e) => {
                self.reopen()?;
                self.cursor.bytes_written = 0;
                Err(e)
            }
        }
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let incoming = line.len() as u64 + 1;
        let mut first_error = None;

        if self.rotation.would_exceed(self.cursor.bytes_written, incoming) {
            if let Err(e) = self.rotate() {
                first_error = Some(e);
            }
        }

        if self.cursor.writer.is_none() {
            self.reopen()?;
        }
        if let Some(writer) = self.cursor.writer.as_mut() {
            writer
                .write_all(line.as_bytes())
                .and_then(|_| writer.write_all(b"\n"))
                .map_err(|e| {
                    LoggerError::file_sink(
                        self.path.display().to_string(),
                        format!("Failed to write: {}", e),
                    )
                })?;
            self.cursor.bytes_written += incoming;
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl Sink for FileSink {
    fn write_batch(&mut self, batch: &[LogEntry]) -> Result<()> {
        if self.closed {
            return Err(LoggerError::file_sink(
                self.path.display().to_string(),
                "write after close",
            ));
        }

        let lines: Vec<String> = batch.iter().map(|e| self.formatter.format(e)).collect();
        let projected: u64 = lines.iter().map(|l| l.len() as u64 + 1).sum();

        let mut first_error = None;
        let over_threshold = self.rotation.is_enabled()
            && self.cursor.bytes_written.saturating_add(projected) > self.rotation.max_file_size();
        if over_threshold {
            // Check line by line so the rotated file ends on an entry boundary
            for line in &lines {
                if let Err(e) = self.write_line(line) {
                    first_error.get_or_insert(e);
                }
            }
        } else if let Err(e) = self.write_all_lines(&lines) {
            first_error = Some(e);
        }

        first_error.map_or(Ok(()), Err)
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.cursor.writer.as_mut() {
            writer.flush().map_err(|e| {
                LoggerError::file_sink(
                    self.path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        match self.cursor.writer.take() {
            Some(mut writer) => writer.flush().map_err(|e| {
                LoggerError::file_sink(
                    self.path.display().to_string(),
                    format!("Failed to flush on close: {}", e),
                )
            }),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl FileSink {
    fn write_all_lines(&mut self, lines: &[String]) -> Result<()> {
        if self.cursor.writer.is_none() {
            self.reopen()?;
        }
        let Some(writer) = self.cursor.writer.as_mut() else {
            return Ok(());
        };
        append_lines(writer, lines, &mut self.cursor.bytes_written).map_err(|e| {
            LoggerError::file_sink(
                self.path.display().to_string(),
                format!("Failed to write: {}", e),
            )
        })
    }
}

/// Write `lines` newline-terminated, counting each line once it is accepted
fn append_lines<W: Write>(
    writer: &mut W,
    lines: &[String],
    bytes_written: &mut u64,
) -> io::Result<()> {
    for line in lines {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        *bytes_written += line.len() as u64 + 1;
    }
    Ok(())
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.cursor.writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formatter::OutputFormat;
    use crate::core::log_level::LogLevel;
    use tempfile::tempdir;

    fn sink(dir: &Path, max_size: u64, retained: usize) -> FileSink {
        let rotation =
            RotationManager::new(dir.join("app.log"), "{base}_{timestamp}.log", max_size, retained);
        FileSink::open(Formatter::new(OutputFormat::Text), rotation, 256, Diagnostics::stderr())
            .unwrap()
    }

    fn entries(range: std::ops::Range<usize>) -> Vec<LogEntry> {
        range
            .map(|i| LogEntry::new(LogLevel::Info, format!("entry-{:04}", i)))
            .collect()
    }

    fn messages(content: &str) -> Vec<String> {
        content
            .lines()
            .map(|l| l.rsplit(' ').next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_writes_and_flushes() {
        let dir = tempdir().unwrap();
        let mut sink = sink(dir.path(), 1 << 20, 5);
        sink.write_batch(&entries(0..3)).unwrap();
        sink.flush().unwrap();

        let content = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(messages(&content), vec!["entry-0000", "entry-0001", "entry-0002"]);
        assert_eq!(sink.cursor().bytes_written(), content.len() as u64);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let rotation = RotationManager::new(
            dir.path().join("nested/deeper/app.log"),
            "{base}_{timestamp}.log",
            1 << 20,
            5,
        );
        let sink = FileSink::open(Formatter::default(), rotation, 64, Diagnostics::stderr());
        assert!(sink.is_ok());
        assert!(dir.path().join("nested/deeper/app.log").exists());
    }

    #[test]
    fn test_rotation_preserves_prior_entries_in_order() {
        let dir = tempdir().unwrap();
        let mut sink = sink(dir.path(), 1024, 100);

        for chunk in 0..10 {
            sink.write_batch(&entries(chunk * 10..chunk * 10 + 10)).unwrap();
        }
        sink.close().unwrap();

        assert!(sink.cursor().generation() >= 1);
        let rotated = sink.rotation.rotated_files().unwrap();
        assert_eq!(rotated.len() as u64, sink.cursor().generation());

        // Oldest rotated file first, then the active file
        let mut all = Vec::new();
        for path in rotated.iter().rev() {
            let content = fs::read_to_string(path).unwrap();
            assert!(content.len() as u64 <= 1024);
            assert!(content.ends_with('\n'));
            all.extend(messages(&content));
        }
        all.extend(messages(&fs::read_to_string(dir.path().join("app.log")).unwrap()));

        let expected: Vec<String> = (0..100).map(|i| format!("entry-{:04}", i)).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_rotation_starts_fresh_active_file() {
        let dir = tempdir().unwrap();
        let mut sink = sink(dir.path(), 1024, 5);
        let line_len = Formatter::new(OutputFormat::Text)
            .format(&entries(0..1)[0])
            .len() as u64
            + 1;
        let per_file = (1024 / line_len) as usize;

        sink.write_batch(&entries(0..per_file)).unwrap();
        assert_eq!(sink.cursor().generation(), 0);
        sink.write_batch(&entries(per_file..per_file + 1)).unwrap();
        sink.flush().unwrap();

        assert_eq!(sink.cursor().generation(), 1);
        assert_eq!(sink.cursor().bytes_written(), line_len);
        let active = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(messages(&active), vec![format!("entry-{:04}", per_file)]);
    }

    #[test]
    fn test_startup_rotation_of_oversized_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("app.log"), vec![b'x'; 2048]).unwrap();

        let sink = sink(dir.path(), 1024, 5);
        assert_eq!(sink.cursor().generation(), 1);
        assert_eq!(sink.cursor().bytes_written(), 0);
        assert_eq!(sink.rotation.rotated_files().unwrap().len(), 1);
    }

    #[test]
    fn test_rotation_disabled_grows_unbounded() {
        let dir = tempdir().unwrap();
        let rotation =
            RotationManager::new(dir.path().join("app.log"), "{base}_{timestamp}.log", 1024, 5)
                .with_enabled(false);
        let mut sink =
            FileSink::open(Formatter::default(), rotation, 256, Diagnostics::stderr()).unwrap();

        sink.write_batch(&entries(0..100)).unwrap();
        sink.close().unwrap();
        assert_eq!(sink.cursor().generation(), 0);
        assert!(fs::metadata(dir.path().join("app.log")).unwrap().len() > 1024);
    }

    /// Accepts `limit` bytes, then fails every write
    struct ShortWriter {
        accepted: Vec<u8>,
        limit: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.limit - self.accepted.len();
            if room == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = room.min(buf.len());
            self.accepted.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_partial_batch_counts_written_lines() {
        let lines = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        // Room for "first\n" and "second\n" only
        let mut writer = ShortWriter { accepted: Vec::new(), limit: 13 };
        let mut bytes_written = 100;

        assert!(append_lines(&mut writer, &lines, &mut bytes_written).is_err());
        assert_eq!(bytes_written, 113);
        assert_eq!(writer.accepted, b"first\nsecond\n");
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut sink = sink(dir.path(), 1 << 20, 5);
        sink.write_batch(&entries(0..1)).unwrap();
        sink.close().unwrap();
        sink.close().unwrap();
        assert!(!sink.cursor().is_open());
        assert!(sink.write_batch(&entries(1..2)).is_err());
    }
}
