//! Appender implementations

pub mod console;
pub mod rotating_file;
pub mod syslog;

pub use console::ConsoleAppender;
pub use rotating_file::{RotatingFileAppender, RotationPolicy, RotationTrigger};
pub use syslog::SyslogAppender;

pub use crate::core::Appender;
