//! # Rust Async Log Engine
//!
//! An in-process asynchronous logging engine. Application threads format a
//! record and push it onto a bounded queue without touching I/O; a single
//! background worker drains the queue in order and writes each line to the
//! console, a rotating log file and the system log.
//!
//! ## Features
//!
//! - **Non-blocking submission**: a full queue drops the newest record and
//!   counts it instead of stalling the caller
//! - **Two level gates**: `max_level_*` cargo features remove levels at
//!   compile time, and an atomic runtime threshold can change at any time
//! - **Rotation**: by calendar day and by size, with backup retention and
//!   optional gzip
//! - **Runtime configuration**: INI or JSON files plus environment overrides
//! - **Statistics**: submitted, dropped, dispatched, peak depth, write time
//!
//! ## Example
//!
//! ```no_run
//! use rust_async_log_engine::prelude::*;
//! use rust_async_log_engine::info;
//!
//! let engine = LogEngine::new();
//! engine.init(LoggerConfig::new().with_log_file("logs/app.log"))?;
//!
//! info!(engine, "user={} action={}", "alice", "login");
//! engine.stream(LogLevel::Warn).append("disk at ").append(91).append("%");
//!
//! engine.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
//! println!("{:?}", engine.stats());
//! # Ok::<(), LoggerError>(())
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, RotatingFileAppender, SyslogAppender};
    pub use crate::core::{
        Appender, Clock, FormatArg, LogEngine, LogEngineBuilder, LogLevel, LogRecord, LogStats,
        LogStream, LoggerConfig, LoggerError, ManualClock, OverflowCallback, Result, SystemClock,
        WorkerState, DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

pub use appenders::{ConsoleAppender, RotatingFileAppender, RotationPolicy, SyslogAppender};
pub use core::{
    Appender, BoundedQueue, Clock, FormatArg, LevelGate, LogEngine, LogEngineBuilder, LogLevel,
    LogRecord, LogStats, LogStream, LoggerConfig, LoggerError, ManualClock, OverflowCallback,
    PushOutcome, Result, StatsRegistry, SystemClock, WorkerHealth, WorkerState,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT, STATIC_MAX_LEVEL,
};
