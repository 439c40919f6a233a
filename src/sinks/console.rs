//! Console sink implementation

use crate::core::{Formatter, LogEntry, LoggerError, Result, Sink};
use std::io::{self, Write};

/// ANSI reset written after colored output
const RESET: &[u8] = b"\x1b[0m";

/// Writes one formatted line per entry, colored by level
pub struct ConsoleSink {
    formatter: Formatter,
    use_colors: bool,
    writer: Box<dyn Write + Send>,
}

impl ConsoleSink {
    /// Console sink writing to standard output
    pub fn stdout(formatter: Formatter) -> Self {
        Self::with_writer(formatter, io::stdout())
    }

    /// Console sink writing to an arbitrary writer
    pub fn with_writer(formatter: Formatter, writer: impl Write + Send + 'static) -> Self {
        Self {
            formatter,
            use_colors: true,
            writer: Box::new(writer),
        }
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }
}

fn write_entries(
    formatter: &Formatter,
    use_colors: bool,
    writer: &mut (dyn Write + Send),
    batch: &[LogEntry],
) -> io::Result<()> {
    for entry in batch {
        let line = formatter.format(entry);
        if use_colors {
            writeln!(writer, "{}", entry.level.paint(&line))?;
        } else {
            writeln!(writer, "{}", line)?;
        }
    }
    writer.flush()
}

/// Restores the terminal color on drop unless disarmed
struct ColorGuard<'a> {
    writer: &'a mut (dyn Write + Send),
    armed: bool,
}

impl Drop for ColorGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.writer.write_all(RESET);
            let _ = self.writer.flush();
        }
    }
}

impl Sink for ConsoleSink {
    fn write_batch(&mut self, batch: &[LogEntry]) -> Result<()> {
        let mut guard = ColorGuard {
            writer: self.writer.as_mut(),
            armed: self.use_colors,
        };
        let result = write_entries(&self.formatter, self.use_colors, &mut *guard.writer, batch);
        if result.is_ok() {
            // Every painted line already ends with its own reset
            guard.armed = false;
        }
        drop(guard);
        result.map_err(|e| LoggerError::console(e.to_string()))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| LoggerError::console(e.to_string()))
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, OutputFormat};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingWriter {
        written: Arc<Mutex<Vec<u8>>>,
        fail_after: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_after == 0 && buf != RESET {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            self.fail_after = self.fail_after.saturating_sub(1);
            self.written.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_plain_lines() {
        let buffer = SharedBuffer::default();
        let mut sink = ConsoleSink::with_writer(Formatter::new(OutputFormat::Text), buffer.clone())
            .with_colors(false);

        sink.write_batch(&[
            LogEntry::new(LogLevel::Info, "first"),
            LogEntry::new(LogLevel::Warn, "second"),
        ])
        .unwrap();

        let contents = buffer.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[INFO ]") && lines[0].ends_with("first"));
        assert!(lines[1].contains("[WARN ]") && lines[1].ends_with("second"));
        assert!(!contents.contains('\x1b'));
    }

    #[test]
    fn test_colored_lines_reset() {
        colored::control::set_override(true);
        let buffer = SharedBuffer::default();
        let mut sink = ConsoleSink::with_writer(Formatter::new(OutputFormat::Text), buffer.clone());

        sink.write_batch(&[LogEntry::new(LogLevel::Error, "boom")])
            .unwrap();

        let contents = buffer.contents();
        assert!(contents.contains("\x1b[31m"));
        assert!(contents.trim_end().ends_with("\x1b[0m"));
    }

    #[test]
    fn test_write_failure_restores_color() {
        colored::control::set_override(true);
        let written = Arc::new(Mutex::new(Vec::new()));
        let writer = FailingWriter {
            written: Arc::clone(&written),
            fail_after: 0,
        };
        let mut sink = ConsoleSink::with_writer(Formatter::default(), writer);

        let err = sink
            .write_batch(&[LogEntry::new(LogLevel::Warn, "lost")])
            .unwrap_err();
        assert!(matches!(err, LoggerError::Console(_)));
        assert!(written.lock().ends_with(RESET));
    }
}
