//! Log record structure

use super::log_level::LogLevel;
use chrono::{DateTime, Local};
use std::borrow::Cow;

/// A single submission, alive only until it is rendered into a queue line
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    /// Tag written into the level slot of the line, normally `level.to_str()`
    pub label: String,
    pub module: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub function: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl LogRecord {
    /// Escape newlines, carriage returns and tabs to prevent log injection
    ///
    /// Applied to every text field so a record always renders to exactly one
    /// line. Text without control characters is returned as is.
    pub(crate) fn sanitize(text: &str) -> Cow<'_, str> {
        if !text.contains(['\n', '\r', '\t']) {
            return Cow::Borrowed(text);
        }
        Cow::Owned(
            text.replace('\n', "\\n")
                .replace('\r', "\\r")
                .replace('\t', "\\t"),
        )
    }

    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            label: level.to_str().to_string(),
            module: None,
            file: None,
            line: None,
            function: None,
            message: Self::sanitize(&message.into()).into_owned(),
            timestamp: Local::now(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Self::sanitize(&label.into()).into_owned();
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(Self::sanitize(&module.into()).into_owned());
        self
    }

    pub fn with_location(mut self, file: &str, line: u32, function: &str) -> Self {
        self.file = Some(Self::sanitize(file).into_owned());
        self.line = Some(line);
        self.function = Some(Self::sanitize(function).into_owned());
        self
    }

    pub(crate) fn with_message(mut self, message: &str) -> Self {
        self.message = Self::sanitize(message).into_owned();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
