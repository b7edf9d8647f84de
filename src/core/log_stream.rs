//! Streamed records
//!
//! A [`LogStream`] collects appended values and submits exactly one record
//! when it goes out of scope, whichever way the scope is left.

use super::{engine::LogEngine, log_level::LogLevel, log_record::LogRecord};
use std::fmt::{self, Display, Write as _};

/// Accumulates a message and submits it on drop
///
/// A stream created for a level the engine would reject is inert: appends
/// are discarded and nothing is submitted.
///
/// # Example
///
/// ```
/// use rust_async_log_engine::{LogEngine, LogLevel, LoggerConfig};
///
/// let engine = LogEngine::builder()
///     .config(LoggerConfig::new().with_file(false).with_console(false))
///     .build();
/// engine.start().unwrap();
///
/// {
///     let mut stream = engine.stream(LogLevel::Info);
///     stream.append("user=").append("alice").append(" attempts=").append(3);
/// } // submitted here
///
/// engine.shutdown(std::time::Duration::from_secs(5));
/// assert_eq!(engine.stats().total_dispatched, 1);
/// ```
pub struct LogStream<'a> {
    engine: &'a LogEngine,
    record: Option<LogRecord>,
    buffer: String,
}

impl<'a> LogStream<'a> {
    pub(crate) fn new(engine: &'a LogEngine, level: LogLevel) -> Self {
        let record = engine
            .enabled(level)
            .then(|| LogRecord::new(level, String::new()));
        Self {
            engine,
            record,
            buffer: String::new(),
        }
    }

    /// Whether this stream will submit anything
    pub fn is_active(&self) -> bool {
        self.record.is_some()
    }

    pub fn append<T: Display>(&mut self, value: T) -> &mut Self {
        if self.record.is_some() {
            let _ = write!(self.buffer, "{}", value);
        }
        self
    }

    pub fn module(&mut self, module: &str) -> &mut Self {
        if let Some(record) = self.record.take() {
            self.record = Some(record.with_module(module));
        }
        self
    }

    pub fn location(&mut self, file: &str, line: u32, function: &str) -> &mut Self {
        if let Some(record) = self.record.take() {
            self.record = Some(record.with_location(file, line, function));
        }
        self
    }

    pub fn label(&mut self, label: &str) -> &mut Self {
        if let Some(record) = self.record.take() {
            self.record = Some(record.with_label(label));
        }
        self
    }
}

impl fmt::Write for LogStream<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.record.is_some() {
            self.buffer.push_str(s);
        }
        Ok(())
    }
}

impl Drop for LogStream<'_> {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            self.engine.submit(record.with_message(&self.buffer));
        }
    }
}
