//! Property-based tests for rust_async_log_engine using proptest

use chrono::{Local, TimeZone};
use proptest::prelude::*;
use rust_async_log_engine::core::formatter::{format_line, level_of_line, sprintf};
use rust_async_log_engine::prelude::*;
use rust_async_log_engine::{BoundedQueue, LevelGate, PushOutcome};

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Off),
        Just(LogLevel::Error),
        Just(LogLevel::Warn),
        Just(LogLevel::Info),
        Just(LogLevel::Debug),
    ]
}

// ============================================================================
// Level Gate Tests
// ============================================================================

proptest! {
    /// admit(S) holds exactly when S <= T in the severity ordering
    #[test]
    fn test_gate_admits_iff_at_or_below_threshold(level in any_level(), threshold in any_level()) {
        let gate = LevelGate::new(threshold);
        prop_assert_eq!(gate.admit(level), level <= threshold);
        prop_assert_eq!(gate.admit(level), level.as_u8() <= threshold.as_u8());
    }

    /// Out-of-range raw levels never change the threshold
    #[test]
    fn test_gate_ignores_invalid_raw(start in any_level(), raw in 5u8..=255) {
        let gate = LevelGate::new(start);
        prop_assert!(!gate.set_raw(raw));
        prop_assert_eq!(gate.level(), start);
    }

    /// Level names round trip through Display and FromStr
    #[test]
    fn test_log_level_str_roundtrip(level in any_level(), lower in any::<bool>()) {
        let text = if lower { level.to_str().to_lowercase() } else { level.to_string() };
        let parsed: LogLevel = text.parse().unwrap();
        prop_assert_eq!(parsed, level);
    }
}

// ============================================================================
// Formatter Tests
// ============================================================================

proptest! {
    /// Any message renders to one line whose level tag is recoverable
    #[test]
    fn test_rendered_line_is_single_and_tagged(
        level in any_level(),
        message in ".*",
        module in proptest::option::of("[A-Za-z]{1,12}"),
    ) {
        let ts = Local.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).single().unwrap();
        let mut record = LogRecord::new(level, message).with_timestamp(ts);
        if let Some(module) = module {
            record = record.with_module(module);
        }

        let line = format_line(&record);
        prop_assert_eq!(line.lines().count().max(1), 1);
        prop_assert!(!line.contains('\n'));
        prop_assert!(line.starts_with("[2025-06-01 12:30:00.000000] ["));
        prop_assert_eq!(level_of_line(&line), level);
    }

    /// Custom labels are written verbatim and read back as untagged
    #[test]
    fn test_custom_label_reads_as_off(label in "AUDIT_[A-Z]{1,6}", message in "[a-z ]*") {
        let record = LogRecord::new(LogLevel::Info, message).with_label(label.clone());
        let line = format_line(&record);
        let tag = format!("] [{}] ", label);
        prop_assert!(line.contains(&tag));
        prop_assert_eq!(level_of_line(&line), LogLevel::Off);
    }

    /// sprintf never panics, whatever the template and arguments
    #[test]
    fn test_sprintf_never_panics(
        template in ".*",
        ints in proptest::collection::vec(any::<i64>(), 0..4),
        text in "[a-z]{0,8}",
    ) {
        let mut args: Vec<FormatArg> = ints.into_iter().map(FormatArg::from).collect();
        args.push(FormatArg::from(text));
        let _ = sprintf(&template, &args);
    }

    /// Templates without '%' are returned unchanged
    #[test]
    fn test_sprintf_plain_text_is_identity(template in "[^%]*") {
        prop_assert_eq!(sprintf(&template, &[]), template);
    }

    /// A missing argument produces the inline marker instead of failing
    #[test]
    fn test_sprintf_missing_argument_marker(prefix in "[a-z ]{0,10}") {
        let template = format!("{}%d", prefix);
        let out = sprintf(&template, &[]);
        prop_assert!(out.starts_with("<format error:"));
        prop_assert!(out.ends_with(&template));
    }
}

// ============================================================================
// Configuration Tests
// ============================================================================

proptest! {
    /// The INI parser accepts any text without panicking
    #[test]
    fn test_ini_parser_never_panics(text in "(?s).{0,400}") {
        let mut config = LoggerConfig::default();
        config.apply_ini_str(&text);
    }

    /// Malformed sizes leave the previous value in place
    #[test]
    fn test_malformed_size_is_ignored(value in "[a-z.\\-]{1,8}") {
        let mut config = LoggerConfig::default();
        let before = config.max_file_size;
        config.apply_ini_str(&format!("[logger]\nmax_file_size = {}\n", value));
        prop_assert_eq!(config.max_file_size, before);
    }

    /// Sizes are given in megabytes
    #[test]
    fn test_size_in_megabytes(mb in 1u64..4096) {
        let mut config = LoggerConfig::default();
        config.apply_ini_str(&format!("[logger]\nmax_file_size={}", mb));
        prop_assert_eq!(config.max_file_size, mb * 1024 * 1024);
    }

    /// Keys outside the [logger] section are never applied
    #[test]
    fn test_other_sections_ignored(section in "[a-km-z]{1,8}", level in any_level()) {
        let mut config = LoggerConfig::default();
        config.apply_ini_str(&format!("[{}]\nlevel = {}\n", section, level));
        prop_assert_eq!(config, LoggerConfig::default());
    }
}

// ============================================================================
// Bounded Queue Tests
// ============================================================================

proptest! {
    /// Pushes beyond capacity are rejected and FIFO order holds for the rest
    #[test]
    fn test_queue_rejects_newest(capacity in 1usize..64, extra in 0usize..64) {
        let queue = BoundedQueue::new(capacity);
        let mut rejected = 0;
        for i in 0..capacity + extra {
            match queue.push(i) {
                PushOutcome::Accepted(depth) => prop_assert_eq!(depth, i + 1),
                PushOutcome::Full => rejected += 1,
                PushOutcome::Closed => prop_assert!(false, "queue is open"),
            }
        }
        prop_assert_eq!(rejected, extra);

        let drained: Vec<usize> = std::iter::from_fn(|| queue.try_pop()).collect();
        prop_assert_eq!(drained, (0..capacity).collect::<Vec<_>>());
    }
}
