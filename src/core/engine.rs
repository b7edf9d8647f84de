//! Engine lifecycle and the submission path
//!
//! A [`LogEngine`] is an explicitly constructed value. Producers call into it
//! from any thread; the only work done on the caller's thread is the level
//! check, filtering, formatting and a non-blocking queue push. Everything that
//! touches I/O happens on the drain worker.

use super::{
    appender::Appender,
    clock::{Clock, SystemClock},
    config::LoggerConfig,
    error::{LoggerError, Result},
    formatter::{format_line, sprintf, FormatArg},
    level_gate::{LevelGate, STATIC_MAX_LEVEL},
    log_level::LogLevel,
    log_record::LogRecord,
    log_stream::LogStream,
    queue::{BoundedQueue, PushOutcome, DEFAULT_QUEUE_CAPACITY},
    sink_manager::SinkManager,
    stats::{LogStats, StatsRegistry},
    worker::{self, WorkerHealth, WorkerState},
};
use crate::appenders::ConsoleAppender;
use parking_lot::{Mutex, RwLock};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default shutdown timeout for engine cleanup (5 seconds)
///
/// Used when the engine is dropped without an explicit [`LogEngine::shutdown`].
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How long `init` waits for the worker to open its sinks
const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// A dispatching worker with no progress for this long is reported as stalled
const STALL_THRESHOLD: Duration = Duration::from_secs(1);

/// Overflow notifications fire on the first drop and then every this many
const OVERFLOW_ALERT_INTERVAL: u64 = 1000;

/// Value stored in the state cell before a worker exists
const NO_WORKER: u8 = u8::MAX;

/// Callback invoked with the running dropped total when records are dropped
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// State shared between producers and the drain worker
///
/// Queue, configuration and stats each have their own lock and no code path
/// holds two of them at once.
pub(crate) struct Shared {
    pub(crate) gate: LevelGate,
    pub(crate) config: RwLock<Arc<LoggerConfig>>,
    pub(crate) queue: BoundedQueue<String>,
    pub(crate) stats: StatsRegistry,
    pub(crate) sinks: Mutex<SinkManager>,
    pub(crate) clock: Arc<dyn Clock>,
    state: AtomicU8,
    epoch: Instant,
    last_progress_ms: AtomicU64,
}

impl Shared {
    /// Cheap consistent copy of the configuration
    pub(crate) fn config_snapshot(&self) -> Arc<LoggerConfig> {
        Arc::clone(&self.config.read())
    }

    pub(crate) fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn state(&self) -> Option<WorkerState> {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn touch(&self) {
        let ms = u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_progress_ms.store(ms, Ordering::Release);
    }

    fn since_progress(&self) -> Duration {
        let last = Duration::from_millis(self.last_progress_ms.load(Ordering::Acquire));
        self.epoch.elapsed().saturating_sub(last)
    }
}

/// The asynchronous logging engine
///
/// # Example
///
/// ```no_run
/// use rust_async_log_engine::{LogEngine, LogLevel, LoggerConfig};
///
/// let engine = LogEngine::new();
/// engine
///     .init(LoggerConfig::new().with_log_file("logs/app.log"))
///     .expect("log engine failed to start");
///
/// engine.log(LogLevel::Info, "INFO", "user=alice action=login");
/// engine.shutdown(std::time::Duration::from_secs(5));
/// ```
pub struct LogEngine {
    shared: Arc<Shared>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    workers_started: AtomicUsize,
    running: AtomicBool,
    on_overflow: Option<OverflowCallback>,
}

impl LogEngine {
    /// Create an engine with the default configuration; nothing runs until `init`
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> LogEngineBuilder {
        LogEngineBuilder::new()
    }

    /// Apply `config` and start the drain worker
    ///
    /// Calling this again on a running engine only replaces the
    /// configuration; a second worker is never started.
    ///
    /// # Errors
    ///
    /// Returns `LoggerStopped` after [`shutdown`](Self::shutdown), or an I/O
    /// error if the worker thread cannot be spawned.
    pub fn init(&self, config: LoggerConfig) -> Result<()> {
        if self.shared.queue.is_closed() {
            return Err(LoggerError::LoggerStopped);
        }

        self.update_config(config);

        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }

        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("log-drain".to_string())
            .spawn(move || worker::run(shared, ready_tx))
            .map_err(|e| {
                LoggerError::io_operation("spawn drain worker", "Failed to start worker thread", e)
            })?;
        self.workers_started.fetch_add(1, Ordering::SeqCst);

        if ready_rx.recv_timeout(STARTUP_TIMEOUT).is_err() {
            eprintln!(
                "[LOGGER WARNING] Drain worker did not report ready within {:?}",
                STARTUP_TIMEOUT
            );
        }

        *worker = Some(handle);
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    /// Start with the configuration the engine was built with
    ///
    /// # Errors
    ///
    /// Same as [`init`](Self::init).
    pub fn start(&self) -> Result<()> {
        let config = (*self.config()).clone();
        self.init(config)
    }

    /// Stop accepting records, drain the queue and join the worker
    ///
    /// Records already queued are written before the worker exits. Records
    /// submitted concurrently with this call may be dropped.
    ///
    /// # Returns
    ///
    /// `true` if the worker finished within `timeout`, `false` otherwise
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.running.store(false, Ordering::Release);
        self.shared.queue.close();

        let Some(handle) = self.worker.lock().take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!(
                        "[LOGGER ERROR] Drain worker panicked during shutdown: {:?}",
                        e
                    );
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Drain worker did not finish within {:?}. \
                     Some logs may be lost.",
                    timeout
                );
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Whether a record at `level` would currently be accepted
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= STATIC_MAX_LEVEL
            && self.running.load(Ordering::Acquire)
            && self.shared.gate.admit(level)
    }

    /// Submit a fully built record
    ///
    /// Never blocks on I/O and never reports failure; rejected and dropped
    /// records are only visible through [`stats`](Self::stats).
    pub fn submit(&self, record: LogRecord) {
        if !self.enabled(record.level) {
            return;
        }

        {
            let config = self.shared.config_snapshot();
            if !config.module_allowed(record.module.as_deref())
                || config.is_filtered(&record.message)
            {
                return;
            }
        }

        let record = record.with_timestamp(self.shared.clock.now());
        let line = format_line(&record);

        self.shared.stats.record_submitted();
        match self.shared.queue.push(line) {
            PushOutcome::Accepted(depth) => self.shared.stats.observe_depth(depth),
            PushOutcome::Full => self.handle_overflow(),
            PushOutcome::Closed => {
                self.shared.stats.record_dropped();
            }
        }
    }

    fn handle_overflow(&self) {
        let dropped = self.shared.stats.record_dropped();

        if dropped == 1 || dropped % OVERFLOW_ALERT_INTERVAL == 0 {
            eprintln!(
                "[LOGGER WARNING] Queue full ({}), {} logs dropped.",
                self.worker_health(),
                dropped
            );

            if let Some(ref callback) = self.on_overflow {
                callback(dropped);
            }
        }
    }

    /// Submit `message` at `level`, tagged with `label` in the line
    pub fn log(&self, level: LogLevel, label: &str, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        self.submit(LogRecord::new(level, message).with_label(label));
    }

    /// Submit a record carrying a module tag
    pub fn log_module(&self, level: LogLevel, module: &str, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        self.submit(LogRecord::new(level, message).with_module(module));
    }

    /// Submit a printf-style message
    ///
    /// A malformed template is logged with an inline `<format error: ...>`
    /// marker instead of failing.
    pub fn log_printf(&self, level: LogLevel, template: &str, args: &[FormatArg]) {
        if !self.enabled(level) {
            return;
        }
        self.submit(LogRecord::new(level, sprintf(template, args)));
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, LogLevel::Error.to_str(), message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, LogLevel::Warn.to_str(), message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, LogLevel::Info.to_str(), message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, LogLevel::Debug.to_str(), message);
    }

    /// Start a streamed record; it is submitted when the stream is dropped
    pub fn stream(&self, level: LogLevel) -> LogStream<'_> {
        LogStream::new(self, level)
    }

    /// Change the runtime threshold
    pub fn set_level(&self, level: LogLevel) {
        self.shared.gate.set_level(level);
        self.store_runtime_level(level);
    }

    /// Change the runtime threshold from a raw ordinal; out-of-range values are ignored
    pub fn set_level_raw(&self, raw: u8) {
        if self.shared.gate.set_raw(raw) {
            self.store_runtime_level(self.shared.gate.level());
        }
    }

    fn store_runtime_level(&self, level: LogLevel) {
        let mut config = self.shared.config.write();
        Arc::make_mut(&mut *config).runtime_level = level;
    }

    pub fn level(&self) -> LogLevel {
        self.shared.gate.level()
    }

    /// Replace the configuration wholesale
    ///
    /// The worker picks it up on its next dispatch. Lines already queued may
    /// be written under either configuration.
    pub fn update_config(&self, config: LoggerConfig) {
        self.shared.gate.set_level(config.runtime_level);
        *self.shared.config.write() = Arc::new(config);
    }

    /// Current configuration snapshot
    pub fn config(&self) -> Arc<LoggerConfig> {
        self.shared.config_snapshot()
    }

    /// Load a configuration file on top of the current configuration
    ///
    /// Starts the engine if it has not been started yet.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, or if a `.json` file is
    /// not valid JSON.
    pub fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut next = (*self.config()).clone();
        next.load_file(path)?;

        let started = self.worker.lock().is_some();
        if started || self.shared.queue.is_closed() {
            self.update_config(next);
            Ok(())
        } else {
            self.init(next)
        }
    }

    /// Apply the level and colour environment overrides
    pub fn load_env(&self) {
        let mut next = (*self.config()).clone();
        next.apply_env();
        self.update_config(next);
    }

    pub fn stats(&self) -> LogStats {
        self.shared.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.shared.stats.reset();
    }

    /// Add a sink that receives every dispatched line
    pub fn add_appender(&self, appender: Box<dyn Appender>) {
        self.shared.sinks.lock().add_appender(appender);
    }

    /// `None` until the worker has been spawned
    pub fn worker_state(&self) -> Option<WorkerState> {
        self.shared.state()
    }

    /// How many drain workers this engine has ever spawned (0 or 1)
    pub fn workers_started(&self) -> usize {
        self.workers_started.load(Ordering::SeqCst)
    }

    pub fn worker_health(&self) -> WorkerHealth {
        match self.worker_state() {
            None | Some(WorkerState::Stopped) => WorkerHealth::Stopped,
            Some(WorkerState::Dispatching) if self.shared.since_progress() >= STALL_THRESHOLD => {
                WorkerHealth::Stalled
            }
            Some(_) => WorkerHealth::Busy,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Lines waiting for the worker
    pub fn queue_depth(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.shared.queue.capacity()
    }
}

impl Default for LogEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LogEngine {
    fn drop(&mut self) {
        if self.worker.lock().is_some() {
            self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
        }

        let stats = self.shared.stats.snapshot();
        if stats.total_dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Log engine shutting down with {} dropped logs (drop rate: {:.2}%)",
                stats.total_dropped,
                stats.drop_rate()
            );
        }
    }
}

/// Builder for constructing a [`LogEngine`]
///
/// # Example
///
/// ```
/// use rust_async_log_engine::prelude::*;
/// use std::sync::Arc;
///
/// let engine = LogEngine::builder()
///     .config(LoggerConfig::new().with_file(false).with_level(LogLevel::Debug))
///     .capacity(1024)
///     .on_overflow(Arc::new(|dropped| {
///         eprintln!("ALERT: {} logs dropped", dropped);
///     }))
///     .build();
///
/// assert!(!engine.is_running());
/// ```
pub struct LogEngineBuilder {
    config: LoggerConfig,
    capacity: usize,
    clock: Arc<dyn Clock>,
    console_writer: Option<Box<dyn Write + Send>>,
    appenders: Vec<Box<dyn Appender>>,
    on_overflow: Option<OverflowCallback>,
}

impl LogEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
            capacity: DEFAULT_QUEUE_CAPACITY,
            clock: Arc::new(SystemClock),
            console_writer: None,
            appenders: Vec::new(),
            on_overflow: None,
        }
    }

    /// Initial configuration, applied by [`LogEngine::start`]
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    /// Queue capacity (default 100,000)
    #[must_use = "builder methods return a new value"]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Time source for record timestamps and rotation
    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Send console output somewhere other than stdout
    #[must_use = "builder methods return a new value"]
    pub fn console_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.console_writer = Some(writer);
        self
    }

    /// Add an extra sink
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    /// Set a callback for overflow notifications
    ///
    /// Called with the dropped total on the first drop and every 1000th after.
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    pub fn build(self) -> LogEngine {
        let mut console = ConsoleAppender::with_colors(self.config.enable_color);
        if let Some(writer) = self.console_writer {
            console = console.with_writer(writer);
        }

        let mut sinks = SinkManager::new(console, Arc::clone(&self.clock));
        for appender in self.appenders {
            sinks.add_appender(appender);
        }

        let shared = Shared {
            gate: LevelGate::new(self.config.runtime_level),
            config: RwLock::new(Arc::new(self.config)),
            queue: BoundedQueue::new(self.capacity),
            stats: StatsRegistry::new(),
            sinks: Mutex::new(sinks),
            clock: self.clock,
            state: AtomicU8::new(NO_WORKER),
            epoch: Instant::now(),
            last_progress_ms: AtomicU64::new(0),
        };

        LogEngine {
            shared: Arc::new(shared),
            worker: Mutex::new(None),
            workers_started: AtomicUsize::new(0),
            running: AtomicBool::new(false),
            on_overflow: self.on_overflow,
        }
    }
}

impl Default for LogEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
