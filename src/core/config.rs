//! Engine configuration
//!
//! A plain value type. The engine keeps the active copy behind its
//! configuration lock and hands the worker an immutable snapshot per line.
//!
//! Sources, applied as overlays onto an existing value:
//! - INI text with a `[logger]` section (`apply_ini_str`)
//! - JSON documents (`from_json_str`, or `load_file` on a `.json` path)
//! - environment variables (`apply_env`)

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding a level name
pub const ENV_LOG_LEVEL: &str = "RUST_ASYNC_LOG_LEVEL";

/// Environment variable enabling (`1`/`true`) or disabling console colours
pub const ENV_LOG_COLOR: &str = "RUST_ASYNC_LOG_COLOR";

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub log_file: PathBuf,
    pub runtime_level: LogLevel,
    pub enable_console: bool,
    pub enable_file: bool,
    pub enable_color: bool,
    pub enable_syslog: bool,
    /// Rotate once the active file reaches this many bytes
    pub max_file_size: u64,
    /// Rotated files to keep; 0 keeps all of them
    pub max_backup_files: usize,
    pub rotate_by_day: bool,
    /// Gzip rotated files
    pub compress_backups: bool,
    /// When non-empty, only records tagged with one of these modules pass
    pub enable_modules: Vec<String>,
    /// Records whose message contains any of these are suppressed
    pub filter_keywords: Vec<String>,
    pub syslog_ident: String,
    pub syslog_socket: PathBuf,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("app.log"),
            runtime_level: LogLevel::Info,
            enable_console: true,
            enable_file: true,
            enable_color: true,
            enable_syslog: false,
            max_file_size: 500 * BYTES_PER_MB,
            max_backup_files: 10,
            rotate_by_day: true,
            compress_backups: false,
            enable_modules: Vec::new(),
            filter_keywords: Vec::new(),
            syslog_ident: "rust_async_log_engine".to_string(),
            syslog_socket: PathBuf::from("/dev/log"),
        }
    }
}

impl LoggerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = path.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.runtime_level = level;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.enable_console = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_file(mut self, enabled: bool) -> Self {
        self.enable_file = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_color(mut self, enabled: bool) -> Self {
        self.enable_color = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_syslog(mut self, enabled: bool) -> Self {
        self.enable_syslog = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backup_files = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_rotate_by_day(mut self, enabled: bool) -> Self {
        self.rotate_by_day = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress_backups = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enable_modules = modules.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_filter_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_syslog_ident(mut self, ident: impl Into<String>) -> Self {
        self.syslog_ident = ident.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_syslog_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.syslog_socket = path.into();
        self
    }

    /// Whether a record tagged `module` passes the module allow-list
    pub fn module_allowed(&self, module: Option<&str>) -> bool {
        match module {
            Some(module) if !self.enable_modules.is_empty() => {
                self.enable_modules.iter().any(|m| m == module)
            }
            _ => true,
        }
    }

    /// Whether `message` hits one of the keyword filters
    pub fn is_filtered(&self, message: &str) -> bool {
        self.filter_keywords
            .iter()
            .any(|k| !k.is_empty() && message.contains(k.as_str()))
    }

    /// Overlay `key = value` pairs from the `[logger]` section of INI text
    ///
    /// Lines outside `[logger]`, unknown keys, lines without `=`, malformed
    /// numbers and unknown level names are skipped.
    pub fn apply_ini_str(&mut self, text: &str) {
        let mut section = String::new();

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_string();
                continue;
            }

            if section != "logger" {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            self.apply_key(key.trim(), value.trim());
        }
    }

    fn apply_key(&mut self, key: &str, value: &str) {
        match key {
            "level" => {
                if let Ok(level) = value.parse() {
                    self.runtime_level = level;
                }
            }
            "log_file" => self.log_file = PathBuf::from(value),
            "enable_console" => self.enable_console = parse_bool(value),
            "enable_file" => self.enable_file = parse_bool(value),
            "enable_color" => self.enable_color = parse_bool(value),
            "enable_syslog" => self.enable_syslog = parse_bool(value),
            "rotate_by_day" => self.rotate_by_day = parse_bool(value),
            "compress_backups" => self.compress_backups = parse_bool(value),
            "max_file_size" => {
                if let Some(bytes) = value
                    .parse::<u64>()
                    .ok()
                    .and_then(|mb| mb.checked_mul(BYTES_PER_MB))
                {
                    self.max_file_size = bytes;
                }
            }
            "max_backup_files" => {
                if let Ok(count) = value.parse() {
                    self.max_backup_files = count;
                }
            }
            "enable_modules" => self.enable_modules = parse_list(value),
            "filter_keywords" => self.filter_keywords = parse_list(value),
            "syslog_ident" => self.syslog_ident = value.to_string(),
            "syslog_socket" => self.syslog_socket = PathBuf::from(value),
            _ => {}
        }
    }

    /// Parse a full configuration from JSON; absent fields keep their defaults
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a configuration file as an overlay onto `self`
    ///
    /// `.json` files replace the whole value; anything else is read as INI.
    /// Fails only if the file cannot be read or a JSON document is invalid.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading configuration",
                format!("Failed to read '{}'", path.display()),
                e,
            )
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            *self = Self::from_json_str(&text).map_err(|e| {
                LoggerError::config(path.display().to_string(), e.to_string())
            })?;
        } else {
            self.apply_ini_str(&text);
        }
        Ok(())
    }

    /// Overlay the level and colour environment variables
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Same as [`apply_env`](Self::apply_env) with an injectable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL).and_then(|v| v.parse().ok()) {
            self.runtime_level = level;
        }
        if let Some(color) = lookup(ENV_LOG_COLOR) {
            let color = color.trim();
            self.enable_color = color == "1" || color.eq_ignore_ascii_case("true");
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
