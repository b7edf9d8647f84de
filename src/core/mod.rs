//! Core engine types and traits

pub mod appender;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod level_gate;
pub mod log_level;
pub mod log_record;
pub mod log_stream;
pub mod queue;
pub mod sink_manager;
pub mod stats;
pub mod worker;

pub use appender::Appender;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LoggerConfig, ENV_LOG_COLOR, ENV_LOG_LEVEL};
pub use engine::{LogEngine, LogEngineBuilder, OverflowCallback, DEFAULT_SHUTDOWN_TIMEOUT};
pub use error::{LoggerError, Result};
pub use formatter::{format_line, sprintf, FormatArg};
pub use level_gate::{LevelGate, STATIC_MAX_LEVEL};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use log_stream::LogStream;
pub use queue::{BoundedQueue, PushOutcome, DEFAULT_QUEUE_CAPACITY};
pub use sink_manager::SinkManager;
pub use stats::{LogStats, StatsRegistry};
pub use worker::{WorkerHealth, WorkerState};
