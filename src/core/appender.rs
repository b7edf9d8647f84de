//! Appender trait for log output destinations

use super::{error::Result, log_level::LogLevel};

/// A destination for rendered lines
///
/// `level` is the severity recovered from the line's level tag, or
/// `LogLevel::Off` when the line carries a custom label.
pub trait Appender: Send {
    fn append(&mut self, line: &str, level: LogLevel) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
