//! Rotating file appender
//!
//! Writes lines to a single active file and rotates it when the local
//! calendar day changes or when the file reaches its size limit. A rotated
//! file is renamed to `<path>_<YYYYMMDD_HHMMSS>` and a fresh file is opened at
//! the original path.

use crate::core::clock::Clock;
use crate::core::error::{LoggerError, Result};
use crate::core::{Appender, LogLevel};
use chrono::{DateTime, Local, NaiveDate};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// When and how to rotate
///
/// # Examples
///
/// ```
/// use rust_async_log_engine::appenders::RotationPolicy;
///
/// let policy = RotationPolicy::new()
///     .with_max_size(50 * 1024 * 1024)
///     .with_max_backups(7)
///     .with_rotate_by_day(true);
/// assert_eq!(policy.max_bytes, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotate once the active file holds this many bytes
    pub max_bytes: u64,
    /// Maximum number of rotated files to keep; 0 keeps all
    pub max_backup_files: usize,
    /// Rotate when the local calendar day changes
    pub rotate_by_day: bool,
    /// Gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 500 * 1024 * 1024,
            max_backup_files: 10,
            rotate_by_day: true,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_bytes = bytes;
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
        self.compress = enabled;
        self
    }
}

/// Why a rotation is due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTrigger {
    None,
    DayChanged,
    SizeLimit,
}

pub struct RotatingFileAppender {
    base_path: PathBuf,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    /// Local day of the last open or rotation
    current_day: NaiveDate,
    clock: Arc<dyn Clock>,
    rotations: u64,
}

impl RotatingFileAppender {
    /// Open (or create) the active file at `path`
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created or opened
    pub fn open<P: AsRef<Path>>(
        path: P,
        policy: RotationPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size) = Self::open_active(&base_path)?;
        let current_day = clock.now().date_naive();

        Ok(Self {
            base_path,
            policy,
            writer: Some(BufWriter::new(file)),
            current_size,
            current_day,
            clock,
            rotations: 0,
        })
    }

    fn open_active(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_appender(
                    path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })?;

        if file.try_lock_exclusive().is_err() {
            eprintln!(
                "[LOGGER WARNING] {}",
                LoggerError::file_lock(path.display().to_string())
            );
        }

        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_appender(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();

        Ok((file, size))
    }

    /// Decide whether a rotation is due at `now`; day changes win over size
    pub fn check_rotation(&self, now: &DateTime<Local>) -> RotationTrigger {
        if self.policy.rotate_by_day && now.date_naive() != self.current_day {
            RotationTrigger::DayChanged
        } else if self.current_size >= self.policy.max_bytes {
            RotationTrigger::SizeLimit
        } else {
            RotationTrigger::None
        }
    }

    /// Close the active file, rename it with a timestamp suffix and reopen
    ///
    /// Returns the path the old file was moved to.
    pub fn rotate(&mut self, now: &DateTime<Local>) -> Result<PathBuf> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let mut backup = self.backup_path(now)?;
        if self.base_path.exists() {
            fs::rename(&self.base_path, &backup).map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to rename to '{}': {}", backup.display(), e),
                )
            })?;

            if self.policy.compress {
                match compress_file(&backup) {
                    Ok(gz) => backup = gz,
                    Err(e) => eprintln!("[LOGGER WARNING] Backup compression failed: {}", e),
                }
            }
        }

        let (file, size) = Self::open_active(&self.base_path).map_err(|e| {
            LoggerError::file_rotation(
                self.base_path.display().to_string(),
                format!("Failed to create new log file: {}", e),
            )
        })?;

        self.writer = Some(BufWriter::new(file));
        self.current_size = size;
        self.current_day = now.date_naive();
        self.rotations += 1;

        if let Err(e) = self.prune_backups() {
            eprintln!("[LOGGER WARNING] Failed to prune old backups: {}", e);
        }

        Ok(backup)
    }

    /// Backup name for a rotation at `now`
    ///
    /// Within one second the counter only grows, so a later backup never
    /// takes a slot freed by pruning.
    fn backup_path(&self, now: &DateTime<Local>) -> Result<PathBuf> {
        let stamp = now.format("%Y%m%d_%H%M%S").to_string();
        let stem = format!("{}_{}", self.base_path.display(), stamp);

        let last = self
            .backup_entries()?
            .into_iter()
            .filter(|(key, _)| key.0 == stamp)
            .map(|(key, _)| key.1)
            .max();

        Ok(match last {
            None => PathBuf::from(stem),
            Some(n) => PathBuf::from(format!("{}_{}", stem, n.saturating_add(1))),
        })
    }

    /// Rotated files belonging to this appender, oldest first
    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .backup_entries()?
            .into_iter()
            .map(|(_, path)| path)
            .collect())
    }

    /// Regular files named like our backups, sorted by (stamp, counter)
    fn backup_entries(&self) -> Result<Vec<((String, u64), PathBuf)>> {
        let file_name = self
            .base_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let prefix = format!("{}_", file_name);
        let dir = match self.base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut entries: Vec<((String, u64), PathBuf)> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| {
                let name = entry.file_name();
                let (stamp, counter) = name
                    .to_str()?
                    .strip_prefix(prefix.as_str())
                    .and_then(parse_backup_suffix)?;
                Some(((stamp.to_string(), counter), entry.path()))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    fn prune_backups(&self) -> Result<()> {
        if self.policy.max_backup_files == 0 {
            return Ok(());
        }

        let backups = self.backups()?;
        let excess = backups.len().saturating_sub(self.policy.max_backup_files);
        for old in &backups[..excess] {
            fs::remove_file(old).map_err(|e| {
                LoggerError::io_operation(
                    "removing old backup",
                    format!("Failed to remove '{}'", old.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn current_day(&self) -> NaiveDate {
        self.current_day
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: RotationPolicy) {
        self.policy = policy;
    }

    /// Number of successful rotations since open
    #[must_use]
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Whether a file handle is currently open
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        "file"
    }

    fn append(&mut self, line: &str, _level: LogLevel) -> Result<()> {
        let now = self.clock.now();
        let trigger = self.check_rotation(&now);
        let mut rotation_error = None;

        if trigger != RotationTrigger::None {
            if let Err(e) = self.rotate(&now) {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );

                if self.writer.is_none() {
                    match Self::open_active(&self.base_path) {
                        Ok((file, size)) => {
                            self.writer = Some(BufWriter::new(file));
                            self.current_size = size;
                        }
                        Err(reopen_err) => {
                            eprintln!(
                                "[LOGGER ERROR] Failed to reopen log file after rotation failure: {}",
                                reopen_err
                            );
                        }
                    }
                }

                // Do not retry on every line: accept an oversized file until
                // the next trigger.
                self.current_size = 0;
                self.current_day = now.date_naive();

                if self.writer.is_none() {
                    return Err(e);
                }
                rotation_error = Some(e);
            }
        }

        let writer = self.writer.as_mut().ok_or_else(|| {
            LoggerError::file_appender(self.base_path.display().to_string(), "No open file handle")
        })?;

        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to write log line: {}", e),
                )
            })?;
        self.current_size += line.len() as u64 + 1;

        // The line was written; still report the failed rotation
        match rotation_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for RotatingFileAppender {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

/// Parse a backup suffix `YYYYMMDD_HHMMSS[_N][.gz]` into its stamp and counter
///
/// The bare stamp has counter 0.
fn parse_backup_suffix(suffix: &str) -> Option<(&str, u64)> {
    let suffix = suffix.strip_suffix(".gz").unwrap_or(suffix);
    let bytes = suffix.as_bytes();
    if bytes.len() < 15 {
        return None;
    }

    let stamp_ok = bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[8] == b'_'
        && bytes[9..15].iter().all(u8::is_ascii_digit);
    if !stamp_ok {
        return None;
    }

    let (stamp, rest) = suffix.split_at(15);
    if rest.is_empty() {
        return Some((stamp, 0));
    }

    let counter = rest.strip_prefix('_')?;
    if counter.is_empty() || !counter.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    counter.parse().ok().map(|n| (stamp, n))
}

/// Gzip `path` into `<path>.gz`, removing the original only on success
fn compress_file(path: &Path) -> Result<PathBuf> {
    use std::io::{BufReader, Read};

    let gz_path = PathBuf::from(format!("{}.gz", path.display()));
    let temp_path = PathBuf::from(format!("{}.gz.tmp", path.display()));

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary file: {}", temp_path.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let streamed = (|| -> std::io::Result<()> {
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            encoder.write_all(&buffer[..n])?;
        }
        encoder.finish()?.flush()
    })();

    if let Err(e) = streamed.and_then(|()| fs::rename(&temp_path, &gz_path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress '{}'", path.display()),
            e,
        ));
    }

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compressed {} but could not remove the original: {}",
            path.display(),
            e
        );
    }

    Ok(gz_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use chrono::{Duration, TimeZone};
    use std::io::Read;
    use tempfile::tempdir;

    fn clock_at(hour: u32) -> Arc<ManualClock> {
        let start = Local
            .with_ymd_and_hms(2025, 3, 14, hour, 0, 0)
            .single()
            .expect("valid datetime");
        Arc::new(ManualClock::new(start))
    }

    fn no_day_rotation(max_bytes: u64) -> RotationPolicy {
        RotationPolicy::new()
            .with_max_size(max_bytes)
            .with_rotate_by_day(false)
    }

    #[test]
    fn test_policy_builder() {
        let policy = RotationPolicy::new()
            .with_max_size(1024)
            .with_max_backups(3)
            .with_compression(true)
            .with_rotate_by_day(false);

        assert_eq!(policy.max_bytes, 1024);
        assert_eq!(policy.max_backup_files, 3);
        assert!(policy.compress);
        assert!(!policy.rotate_by_day);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/app.log");

        let appender = RotatingFileAppender::open(&path, RotationPolicy::default(), clock_at(9)).unwrap();
        assert!(path.exists());
        assert!(appender.is_open());
        assert_eq!(appender.current_size(), 0);
    }

    #[test]
    fn test_size_trigger_rotates_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("size.log");
        let clock = clock_at(9);
        let mut appender = RotatingFileAppender::open(&path, no_day_rotation(100), clock.clone()).unwrap();

        // 10 bytes per line including the newline
        for i in 0..15 {
            appender.append(&format!("line {:04}", i), LogLevel::Info).unwrap();
        }
        appender.flush().unwrap();

        assert_eq!(appender.rotations(), 1);
        let backups = appender.backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert!(backups[0]
            .to_string_lossy()
            .ends_with("size.log_20250314_090000"));

        let old = fs::read_to_string(&backups[0]).unwrap();
        assert_eq!(old.lines().count(), 10);
        let current = fs::read_to_string(&path).unwrap();
        assert_eq!(current.lines().count(), 5);
        assert!(current.starts_with("line 0010"));
    }

    #[test]
    fn test_day_change_wins_over_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daily.log");
        let clock = clock_at(23);
        let policy = RotationPolicy::new().with_max_size(1_000_000).with_rotate_by_day(true);
        let mut appender = RotatingFileAppender::open(&path, policy, clock.clone()).unwrap();

        appender.append("before midnight", LogLevel::Info).unwrap();
        assert_eq!(appender.check_rotation(&clock.now()), RotationTrigger::None);

        clock.advance(Duration::hours(2));
        assert_eq!(appender.check_rotation(&clock.now()), RotationTrigger::DayChanged);

        appender.append("after midnight", LogLevel::Info).unwrap();
        appender.flush().unwrap();

        assert_eq!(appender.rotations(), 1);
        assert_eq!(appender.current_day(), clock.now().date_naive());
        let backups = appender.backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].to_string_lossy().ends_with("daily.log_20250315_010000"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "after midnight\n");
    }

    #[test]
    fn test_same_second_rotations_do_not_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("burst.log");
        let clock = clock_at(9);
        let mut appender = RotatingFileAppender::open(&path, no_day_rotation(1), clock.clone()).unwrap();

        for i in 0..3 {
            appender.append(&format!("entry {}", i), LogLevel::Info).unwrap();
        }

        let names: Vec<String> = appender
            .backups()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["burst.log_20250314_090000", "burst.log_20250314_090000_1"]
        );
    }

    #[test]
    fn test_backups_are_pruned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prune.log");
        let clock = clock_at(9);
        let policy = no_day_rotation(1).with_max_backups(2);
        let mut appender = RotatingFileAppender::open(&path, policy, clock.clone()).unwrap();

        for i in 0..6 {
            appender.append(&format!("entry {}", i), LogLevel::Info).unwrap();
            clock.advance(Duration::seconds(1));
        }

        let backups = appender.backups().unwrap();
        assert_eq!(backups.len(), 2);
        // The two newest survive
        assert!(backups[0].to_string_lossy().ends_with("prune.log_20250314_090004"));
        assert!(backups[1].to_string_lossy().ends_with("prune.log_20250314_090005"));
        assert_eq!(fs::read_to_string(&backups[1]).unwrap(), "entry 4\n");
    }

    #[test]
    fn test_pruning_within_one_second_keeps_newest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("burst.log");
        let policy = no_day_rotation(1).with_max_backups(2);
        let mut appender = RotatingFileAppender::open(&path, policy, clock_at(9)).unwrap();

        for i in 0..5 {
            appender.append(&format!("entry {}", i), LogLevel::Info).unwrap();
        }
        appender.flush().unwrap();

        let contents: Vec<String> = appender
            .backups()
            .unwrap()
            .iter()
            .map(|p| fs::read_to_string(p).unwrap())
            .collect();
        assert_eq!(contents, vec!["entry 2\n", "entry 3\n"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "entry 4\n");
    }

    #[test]
    fn test_backups_order_by_numeric_counter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("many.log");
        let mut appender = RotatingFileAppender::open(&path, no_day_rotation(1), clock_at(9)).unwrap();

        for i in 0..13 {
            appender.append(&format!("entry {}", i), LogLevel::Info).unwrap();
        }
        appender.flush().unwrap();

        let backups = appender.backups().unwrap();
        assert_eq!(backups.len(), 12);
        for (i, backup) in backups.iter().enumerate() {
            assert_eq!(fs::read_to_string(backup).unwrap(), format!("entry {}\n", i));
        }
        assert!(backups[11].to_string_lossy().ends_with("many.log_20250314_090000_11"));
    }

    #[test]
    fn test_failed_rename_keeps_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stuck.log");

        // A non-empty directory squats on the backup name, so the rename fails
        let squatter = dir.path().join("stuck.log_20250314_090000");
        fs::create_dir(&squatter).unwrap();
        fs::write(squatter.join("keep"), "x").unwrap();

        let mut appender = RotatingFileAppender::open(&path, no_day_rotation(10), clock_at(9)).unwrap();
        appender.append("first line", LogLevel::Info).unwrap();

        let err = appender.append("2nd", LogLevel::Info).unwrap_err();
        assert!(matches!(err, LoggerError::FileRotationError { .. }), "{:?}", err);
        assert!(appender.is_open());
        assert_eq!(appender.rotations(), 0);

        // No retry until the size limit is reached again
        appender.append("3rd", LogLevel::Info).unwrap();
        appender.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first line\n2nd\n3rd\n");
        assert!(squatter.join("keep").exists());
        assert!(appender.backups().unwrap().is_empty());
    }

    #[test]
    fn test_compressed_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gz.log");
        let policy = no_day_rotation(1).with_compression(true);
        let mut appender = RotatingFileAppender::open(&path, policy, clock_at(9)).unwrap();

        appender.append("compress me", LogLevel::Info).unwrap();
        appender.append("second", LogLevel::Info).unwrap();

        let backups = appender.backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].to_string_lossy().ends_with(".gz"));

        let mut decoder = flate2::read::GzDecoder::new(File::open(&backups[0]).unwrap());
        let mut text = String::new();
        decoder.read_to_string(&mut text).unwrap();
        assert_eq!(text, "compress me\n");
    }

    #[test]
    fn test_existing_file_size_is_counted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("existing.log");
        fs::write(&path, "0123456789\n").unwrap();

        let appender = RotatingFileAppender::open(&path, no_day_rotation(1000), clock_at(9)).unwrap();
        assert_eq!(appender.current_size(), 11);
    }

    #[test]
    fn test_backup_suffix_recognition() {
        assert_eq!(parse_backup_suffix("20250314_090000"), Some(("20250314_090000", 0)));
        assert_eq!(parse_backup_suffix("20250314_090000_12"), Some(("20250314_090000", 12)));
        assert_eq!(parse_backup_suffix("20250314_090000.gz"), Some(("20250314_090000", 0)));
        assert_eq!(parse_backup_suffix("20250314_090000_3.gz"), Some(("20250314_090000", 3)));
        assert_eq!(parse_backup_suffix("20250314"), None);
        assert_eq!(parse_backup_suffix("2025031x_090000"), None);
        assert_eq!(parse_backup_suffix("20250314_090000_"), None);
        assert_eq!(parse_backup_suffix("20250314_090000.log"), None);
        assert_eq!(parse_backup_suffix("20250314_090000.gz.tmp"), None);
    }
}
