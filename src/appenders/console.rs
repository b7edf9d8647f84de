//! Console appender implementation

use crate::core::{Appender, LogLevel, Result};
use colored::Colorize;
use std::io::{self, Write};

pub struct ConsoleAppender {
    use_colors: bool,
    writer: Box<dyn Write + Send>,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self::with_colors(true)
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            writer: Box::new(io::stdout()),
        }
    }

    /// Write to something other than stdout
    ///
    /// # Example
    ///
    /// ```
    /// use rust_async_log_engine::appenders::ConsoleAppender;
    ///
    /// let appender = ConsoleAppender::new().with_writer(Box::new(std::io::sink()));
    /// ```
    #[must_use]
    pub fn with_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.writer = writer;
        self
    }

    pub fn set_colors(&mut self, use_colors: bool) {
        self.use_colors = use_colors;
    }

    pub fn uses_colors(&self) -> bool {
        self.use_colors
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, line: &str, level: LogLevel) -> Result<()> {
        if self.use_colors && level != LogLevel::Off {
            writeln!(self.writer, "{}", line.color(level.color_code()))?;
        } else {
            writeln!(self.writer, "{}", line)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
