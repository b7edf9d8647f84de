//! Sink fan-out owned by the drain worker
//!
//! The sink manager holds the console writer, the rotating file, the system
//! log socket and any extra appenders. It is reconciled against the current
//! configuration snapshot before each dispatch, so enabling a sink, changing
//! the file path or the rotation policy takes effect on the next line.

use super::{
    clock::Clock, config::LoggerConfig, formatter::level_of_line, log_level::LogLevel, Appender,
};
use crate::appenders::{ConsoleAppender, RotatingFileAppender, RotationPolicy, SyslogAppender};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum wait before retrying a log file that failed to open
const FILE_RETRY_INTERVAL: Duration = Duration::from_secs(1);

pub struct SinkManager {
    console: ConsoleAppender,
    file: Option<RotatingFileAppender>,
    syslog: Option<SyslogAppender>,
    extra: Vec<Box<dyn Appender>>,
    clock: Arc<dyn Clock>,
    /// Configuration the sinks were last reconciled against
    applied: Option<Arc<LoggerConfig>>,
    file_retry_at: Option<Instant>,
    /// Sinks whose last write failed; used to report only state changes
    failing: HashSet<String>,
}

impl SinkManager {
    pub fn new(console: ConsoleAppender, clock: Arc<dyn Clock>) -> Self {
        Self {
            console,
            file: None,
            syslog: None,
            extra: Vec::new(),
            clock,
            applied: None,
            file_retry_at: None,
            failing: HashSet::new(),
        }
    }

    pub fn add_appender(&mut self, appender: Box<dyn Appender>) {
        self.extra.push(appender);
    }

    /// Whether a log file handle is currently open
    pub fn has_file(&self) -> bool {
        self.file.as_ref().is_some_and(RotatingFileAppender::is_open)
    }

    /// Bring the sinks in line with `config`
    pub fn reconcile(&mut self, config: &Arc<LoggerConfig>) {
        let unchanged = self
            .applied
            .as_ref()
            .is_some_and(|applied| Arc::ptr_eq(applied, config));

        if unchanged {
            if config.enable_file && self.file.is_none() && self.retry_due() {
                self.open_file(config);
            }
            return;
        }

        self.console.set_colors(config.enable_color);

        let same_path = self
            .file
            .as_ref()
            .is_some_and(|file| file.path() == config.log_file.as_path());

        if !config.enable_file {
            self.file = None;
        } else if same_path {
            if let Some(file) = self.file.as_mut() {
                file.set_policy(rotation_policy(config));
            }
        } else {
            if let Some(mut old) = self.file.take() {
                let _ = old.flush();
            }
            self.open_file(config);
        }

        if config.enable_syslog {
            let stale = self.syslog.as_ref().map_or(true, |syslog| {
                syslog.ident() != config.syslog_ident
                    || syslog.socket_path() != config.syslog_socket.as_path()
            });
            if stale {
                self.syslog = Some(SyslogAppender::new(
                    config.syslog_ident.clone(),
                    &config.syslog_socket,
                ));
            }
        } else {
            self.syslog = None;
        }

        self.applied = Some(Arc::clone(config));
    }

    fn retry_due(&self) -> bool {
        self.file_retry_at.map_or(true, |at| Instant::now() >= at)
    }

    fn open_file(&mut self, config: &LoggerConfig) {
        match RotatingFileAppender::open(
            &config.log_file,
            rotation_policy(config),
            Arc::clone(&self.clock),
        ) {
            Ok(file) => {
                self.file = Some(file);
                self.file_retry_at = None;
            }
            Err(e) => {
                eprintln!("[LOGGER ERROR] Failed to open log file: {}", e);
                self.file = None;
                self.file_retry_at = Some(Instant::now() + FILE_RETRY_INTERVAL);
            }
        }
    }

    /// Write one line to every enabled sink, returning the number of failures
    pub fn dispatch(&mut self, line: &str, config: &Arc<LoggerConfig>) -> usize {
        self.reconcile(config);

        let level = level_of_line(line);
        let mut errors = 0;

        if config.enable_console {
            let result = self.console.append(line, level);
            errors += usize::from(!self.track("console", result));
        }

        if config.enable_file {
            // No handle means the line is skipped for the file sink this cycle
            if let Some(file) = self.file.as_mut() {
                let result = file.append(line, level);
                errors += usize::from(!self.track("file", result));
            }
        }

        if config.enable_syslog {
            if let Some(syslog) = self.syslog.as_mut() {
                let result = syslog.append(line, level);
                errors += usize::from(!self.track("syslog", result));
            }
        }

        errors += self.dispatch_extra(line, level);
        errors
    }

    /// Extra appenders are user code; a panic in one must not take down the worker
    fn dispatch_extra(&mut self, line: &str, level: LogLevel) -> usize {
        let mut errors = 0;
        for idx in 0..self.extra.len() {
            let appender = &mut self.extra[idx];
            let name = format!("{}#{}", appender.name(), idx);

            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.append(line, level)
            }));

            match outcome {
                Ok(result) => errors += usize::from(!self.track(&name, result)),
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Appender {} panicked: {}. \
                         Other appenders continue to function.",
                        name,
                        panic_message(panic_info.as_ref())
                    );
                    errors += 1;
                }
            }
        }
        errors
    }

    /// Record the outcome of a sink write; returns true on success
    fn track(&mut self, sink: &str, result: super::error::Result<()>) -> bool {
        match result {
            Ok(()) => {
                if self.failing.remove(sink) {
                    eprintln!("[LOGGER WARNING] Sink '{}' recovered", sink);
                }
                true
            }
            Err(e) => {
                if self.failing.insert(sink.to_string()) {
                    eprintln!("[LOGGER ERROR] Sink '{}' failed: {}", sink, e);
                }
                false
            }
        }
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.console.flush() {
            eprintln!("[LOGGER ERROR] Console flush failed: {}", e);
        }
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush() {
                eprintln!("[LOGGER ERROR] File flush failed: {}", e);
            }
        }
        for appender in self.extra.iter_mut() {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| appender.flush()));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Appender {} flush failed: {}", appender.name(), e)
                }
                Err(panic_info) => eprintln!(
                    "[LOGGER CRITICAL] Appender {} panicked during flush: {}",
                    appender.name(),
                    panic_message(panic_info.as_ref())
                ),
            }
        }
    }

    /// Flush everything and release the file and socket
    pub fn close(&mut self) {
        self.flush();
        self.file = None;
        self.syslog = None;
        self.applied = None;
    }
}

fn rotation_policy(config: &LoggerConfig) -> RotationPolicy {
    RotationPolicy::new()
        .with_max_size(config.max_file_size)
        .with_max_backups(config.max_backup_files)
        .with_rotate_by_day(config.rotate_by_day)
        .with_compression(config.compress_backups)
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
