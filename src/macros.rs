//! Logging macros for ergonomic log message formatting.
//!
//! These macros format with `format!` syntax, attach the call site's file,
//! line and module path, and skip all work when the level is disabled. The
//! level is first compared with [`STATIC_MAX_LEVEL`](crate::STATIC_MAX_LEVEL),
//! a constant, so a level removed by a `max_level_*` feature compiles away.
//!
//! # Examples
//!
//! ```
//! use rust_async_log_engine::prelude::*;
//! use rust_async_log_engine::{info, warn};
//!
//! let engine = LogEngine::builder()
//!     .config(LoggerConfig::new().with_file(false).with_console(false))
//!     .build();
//! engine.start().unwrap();
//!
//! // Basic logging
//! info!(engine, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(engine, "Server listening on port {}", port);
//!
//! // Tagged with a module for the allow-list
//! warn!(engine, module: "Network", "Retry {} of {}", 1, 3);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_async_log_engine::prelude::*;
/// # let engine = LogEngine::new();
/// use rust_async_log_engine::log;
/// log!(engine, LogLevel::Info, "Simple message");
/// log!(engine, LogLevel::Error, "Error code: {}", 500);
/// log!(engine, LogLevel::Warn, module: "Storage", "Disk {}% full", 91);
/// ```
#[macro_export]
macro_rules! log {
    ($engine:expr, $level:expr, module: $module:expr, $($arg:tt)+) => {{
        let engine = &$engine;
        let level: $crate::LogLevel = $level;
        if level <= $crate::STATIC_MAX_LEVEL && engine.enabled(level) {
            engine.submit(
                $crate::LogRecord::new(level, format!($($arg)+))
                    .with_module($module)
                    .with_location(file!(), line!(), module_path!()),
            );
        }
    }};
    ($engine:expr, $level:expr, $($arg:tt)+) => {{
        let engine = &$engine;
        let level: $crate::LogLevel = $level;
        if level <= $crate::STATIC_MAX_LEVEL && engine.enabled(level) {
            engine.submit(
                $crate::LogRecord::new(level, format!($($arg)+))
                    .with_location(file!(), line!(), module_path!()),
            );
        }
    }};
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_async_log_engine::prelude::*;
/// # let engine = LogEngine::new();
/// use rust_async_log_engine::debug;
/// debug!(engine, "Debug information");
/// debug!(engine, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($engine:expr, module: $module:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Debug, module: $module, $($arg)+)
    };
    ($engine:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($engine:expr, module: $module:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Info, module: $module, $($arg)+)
    };
    ($engine:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($engine:expr, module: $module:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Warn, module: $module, $($arg)+)
    };
    ($engine:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_async_log_engine::prelude::*;
/// # let engine = LogEngine::new();
/// use rust_async_log_engine::error;
/// error!(engine, "Failed to connect to database");
/// error!(engine, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($engine:expr, module: $module:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Error, module: $module, $($arg)+)
    };
    ($engine:expr, $($arg:tt)+) => {
        $crate::log!($engine, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Open a [`LogStream`](crate::LogStream) at the call site.
///
/// The stream submits one record when it is dropped.
///
/// # Examples
///
/// ```
/// # use rust_async_log_engine::prelude::*;
/// # let engine = LogEngine::new();
/// use rust_async_log_engine::{info_stream, log_stream};
///
/// info_stream!(engine).append("items=").append(12);
///
/// let mut stream = log_stream!(engine, LogLevel::Warn);
/// stream.append("retrying in ").append(5).append("s");
/// ```
#[macro_export]
macro_rules! log_stream {
    ($engine:expr, $level:expr) => {{
        let mut stream = $engine.stream($level);
        stream.location(file!(), line!(), module_path!());
        stream
    }};
}

#[macro_export]
macro_rules! error_stream {
    ($engine:expr) => {
        $crate::log_stream!($engine, $crate::LogLevel::Error)
    };
}

#[macro_export]
macro_rules! warn_stream {
    ($engine:expr) => {
        $crate::log_stream!($engine, $crate::LogLevel::Warn)
    };
}

#[macro_export]
macro_rules! info_stream {
    ($engine:expr) => {
        $crate::log_stream!($engine, $crate::LogLevel::Info)
    };
}

#[macro_export]
macro_rules! debug_stream {
    ($engine:expr) => {
        $crate::log_stream!($engine, $crate::LogLevel::Debug)
    };
}
