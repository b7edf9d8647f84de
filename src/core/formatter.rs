//! Line rendering
//!
//! Every record becomes one immutable text line:
//!
//! ```text
//! [2025-01-08 10:30:45.123456] [INFO] [Network] [src/net.rs:42:connect] connected
//! ```
//!
//! The module and location groups are omitted when the record has none. The
//! drain worker recovers the level from the second bracket group, so the
//! timestamp and level groups always come first.

use super::log_level::LogLevel;
use super::log_record::LogRecord;
use chrono::{DateTime, Local};
use std::fmt::{self, Write as _};

/// Local time with microsecond resolution: `2025-01-08 10:30:45.123456`
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Render a record into its final queue line
pub fn format_line(record: &LogRecord) -> String {
    let mut line = String::with_capacity(64 + record.message.len());
    let _ = write!(
        line,
        "[{}] [{}] ",
        format_timestamp(&record.timestamp),
        record.label
    );

    if let Some(module) = record.module.as_deref().filter(|m| !m.is_empty()) {
        let _ = write!(line, "[{}] ", module);
    }

    if let Some(file) = &record.file {
        let _ = write!(
            line,
            "[{}:{}:{}] ",
            file,
            record.line.unwrap_or(0),
            record.function.as_deref().unwrap_or("?")
        );
    }

    line.push_str(&record.message);
    line
}

/// Extract the level tag embedded in a rendered line
///
/// Returns `LogLevel::Off` when the tag is missing or is a custom label.
pub fn level_of_line(line: &str) -> LogLevel {
    level_tag(line)
        .and_then(|tag| tag.parse().ok())
        .unwrap_or(LogLevel::Off)
}

fn level_tag(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('[')?;
    let rest = &rest[rest.find(']')? + 1..];
    let rest = rest.trim_start().strip_prefix('[')?;
    Some(&rest[..rest.find(']')?])
}

/// Argument for [`sprintf`]
#[derive(Debug, Clone, PartialEq)]
pub enum FormatArg {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Bool(bool),
}

impl fmt::Display for FormatArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatArg::Str(s) => write!(f, "{}", s),
            FormatArg::Int(i) => write!(f, "{}", i),
            FormatArg::UInt(u) => write!(f, "{}", u),
            FormatArg::Float(fl) => write!(f, "{}", fl),
            FormatArg::Char(c) => write!(f, "{}", c),
            FormatArg::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for FormatArg {
    fn from(s: String) -> Self {
        FormatArg::Str(s)
    }
}

impl From<&str> for FormatArg {
    fn from(s: &str) -> Self {
        FormatArg::Str(s.to_string())
    }
}

impl From<i32> for FormatArg {
    fn from(i: i32) -> Self {
        FormatArg::Int(i64::from(i))
    }
}

impl From<i64> for FormatArg {
    fn from(i: i64) -> Self {
        FormatArg::Int(i)
    }
}

impl From<u32> for FormatArg {
    fn from(u: u32) -> Self {
        FormatArg::UInt(u64::from(u))
    }
}

impl From<u64> for FormatArg {
    fn from(u: u64) -> Self {
        FormatArg::UInt(u)
    }
}

impl From<usize> for FormatArg {
    fn from(u: usize) -> Self {
        FormatArg::UInt(u as u64)
    }
}

impl From<f64> for FormatArg {
    fn from(f: f64) -> Self {
        FormatArg::Float(f)
    }
}

impl From<char> for FormatArg {
    fn from(c: char) -> Self {
        FormatArg::Char(c)
    }
}

impl From<bool> for FormatArg {
    fn from(b: bool) -> Self {
        FormatArg::Bool(b)
    }
}

#[derive(Debug, Default)]
struct Spec {
    left_align: bool,
    zero_pad: bool,
    plus: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Render a printf-style template at runtime
///
/// Supports `%s %d %i %u %f %e %x %X %o %c %%` with `-`, `0`, `+` flags, width
/// and precision. A malformed template never fails: the result is an inline
/// marker followed by the raw template.
///
/// # Example
///
/// ```
/// use rust_async_log_engine::core::formatter::{sprintf, FormatArg};
///
/// let line = sprintf("connected to %s:%d", &["127.0.0.1".into(), 8080.into()]);
/// assert_eq!(line, "connected to 127.0.0.1:8080");
///
/// let broken = sprintf("value %q", &[1.into()]);
/// assert!(broken.starts_with("<format error:"));
/// ```
pub fn sprintf(template: &str, args: &[FormatArg]) -> String {
    match try_sprintf(template, args) {
        Ok(out) => out,
        Err(reason) => format!("<format error: {}> {}", reason, template),
    }
}

fn try_sprintf(template: &str, args: &[FormatArg]) -> Result<String, String> {
    let mut out = String::with_capacity(template.len() + 16 * args.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left_align = true,
                '0' => spec.zero_pad = true,
                '+' => spec.plus = true,
                _ => break,
            }
            chars.next();
        }

        spec.width = read_number(&mut chars);
        if chars.peek() == Some(&'.') {
            chars.next();
            spec.precision = Some(read_number(&mut chars).unwrap_or(0));
        }

        let conversion = chars
            .next()
            .ok_or_else(|| "dangling '%' at end of template".to_string())?;

        if conversion == '%' {
            out.push('%');
            continue;
        }

        let arg = args
            .next()
            .ok_or_else(|| format!("missing argument for '%{}'", conversion))?;
        let body = convert(conversion, arg, &spec)?;
        pad_into(&mut out, &body, &spec, conversion);
    }

    Ok(out)
}

fn read_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut value: Option<usize> = None;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit as usize));
        chars.next();
    }
    value
}

fn convert(conversion: char, arg: &FormatArg, spec: &Spec) -> Result<String, String> {
    let mismatch = || format!("'%{}' cannot format {:?}", conversion, arg);
    let signed = |value: String, negative: bool| {
        if spec.plus && !negative {
            format!("+{}", value)
        } else {
            value
        }
    };

    match conversion {
        's' => {
            let text = arg.to_string();
            Ok(match spec.precision {
                Some(max) => text.chars().take(max).collect(),
                None => text,
            })
        }
        'd' | 'i' => match arg {
            FormatArg::Int(i) => Ok(signed(i.to_string(), *i < 0)),
            FormatArg::UInt(u) => Ok(signed(u.to_string(), false)),
            FormatArg::Bool(b) => Ok(u8::from(*b).to_string()),
            _ => Err(mismatch()),
        },
        'u' => match arg {
            FormatArg::UInt(u) => Ok(u.to_string()),
            FormatArg::Int(i) if *i >= 0 => Ok(i.to_string()),
            _ => Err(mismatch()),
        },
        'f' | 'F' | 'e' | 'E' => {
            let value = match arg {
                FormatArg::Float(f) => *f,
                FormatArg::Int(i) => *i as f64,
                FormatArg::UInt(u) => *u as f64,
                _ => return Err(mismatch()),
            };
            let precision = spec.precision.unwrap_or(6);
            let body = match conversion {
                'e' => format!("{:.*e}", precision, value),
                'E' => format!("{:.*E}", precision, value),
                _ => format!("{:.*}", precision, value),
            };
            Ok(signed(body, value.is_sign_negative()))
        }
        'x' | 'X' | 'o' => {
            let value = match arg {
                FormatArg::UInt(u) => *u,
                FormatArg::Int(i) => *i as u64,
                _ => return Err(mismatch()),
            };
            Ok(match conversion {
                'x' => format!("{:x}", value),
                'X' => format!("{:X}", value),
                _ => format!("{:o}", value),
            })
        }
        'c' => match arg {
            FormatArg::Char(c) => Ok(c.to_string()),
            FormatArg::UInt(u) => u32::try_from(*u)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .ok_or_else(mismatch),
            FormatArg::Int(i) => u32::try_from(*i)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        other => Err(format!("unsupported conversion '%{}'", other)),
    }
}

fn pad_into(out: &mut String, body: &str, spec: &Spec, conversion: char) {
    let len = body.chars().count();
    let width = spec.width.unwrap_or(0);
    if len >= width {
        out.push_str(body);
        return;
    }

    let fill = width - len;
    if spec.left_align {
        out.push_str(body);
        out.extend(std::iter::repeat(' ').take(fill));
    } else if spec.zero_pad && conversion != 's' && conversion != 'c' {
        let (sign, digits) = match body.chars().next() {
            Some(s @ ('-' | '+')) => (Some(s), &body[1..]),
            _ => (None, body),
        };
        if let Some(sign) = sign {
            out.push(sign);
        }
        out.extend(std::iter::repeat('0').take(fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat(' ').take(fill));
        out.push_str(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::microseconds(123456)
    }

    #[test]
    fn test_timestamp_has_microseconds() {
        assert_eq!(format_timestamp(&fixed_time()), "2025-01-08 10:30:45.123456");
    }

    #[test]
    fn test_format_plain_line() {
        let record = LogRecord::new(LogLevel::Info, "user=alice action=login")
            .with_timestamp(fixed_time());
        assert_eq!(
            format_line(&record),
            "[2025-01-08 10:30:45.123456] [INFO] user=alice action=login"
        );
    }

    #[test]
    fn test_format_with_module_and_location() {
        let record = LogRecord::new(LogLevel::Error, "open failed")
            .with_timestamp(fixed_time())
            .with_module("FileIO")
            .with_location("src/io.rs", 12, "open_config");
        assert_eq!(
            format_line(&record),
            "[2025-01-08 10:30:45.123456] [ERROR] [FileIO] [src/io.rs:12:open_config] open failed"
        );
    }

    #[test]
    fn test_level_round_trips_through_line() {
        for level in [LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug] {
            let line = format_line(&LogRecord::new(level, "[not a level] text"));
            assert_eq!(level_of_line(&line), level);
        }
    }

    #[test]
    fn test_level_of_unknown_label() {
        let line = format_line(&LogRecord::new(LogLevel::Error, "x").with_label("CRITICAL"));
        assert_eq!(level_of_line(&line), LogLevel::Off);
        assert_eq!(level_of_line("no brackets here"), LogLevel::Off);
        assert_eq!(level_of_line("[only one group]"), LogLevel::Off);
    }

    #[test]
    fn test_sprintf_conversions() {
        assert_eq!(
            sprintf("%s has %d items (%.2f%%)", &["cart".into(), 3.into(), 12.5.into()]),
            "cart has 3 items (12.50%)"
        );
        assert_eq!(sprintf("%5d|%-5d|%05d", &[42.into(), 42.into(), (-42).into()]), "   42|42   |-0042");
        assert_eq!(sprintf("%x %X %o", &[255u32.into(), 255u32.into(), 8u32.into()]), "ff FF 10");
        assert_eq!(sprintf("%c%c", &['o'.into(), 107u32.into()]), "ok");
        assert_eq!(sprintf("%.3s", &["abcdef".into()]), "abc");
        assert_eq!(sprintf("%+d", &[7.into()]), "+7");
    }

    #[test]
    fn test_sprintf_ignores_extra_args() {
        assert_eq!(sprintf("plain", &[1.into()]), "plain");
    }

    #[test]
    fn test_sprintf_errors_become_markers() {
        let missing = sprintf("port %d", &[]);
        assert_eq!(missing, "<format error: missing argument for '%d'> port %d");

        let dangling = sprintf("100%", &[]);
        assert!(dangling.starts_with("<format error: dangling"));

        let mismatch = sprintf("%d", &["abc".into()]);
        assert!(mismatch.starts_with("<format error: '%d' cannot format"));

        let wide = sprintf("%c", &[0x1_0000_0041u64.into()]);
        assert!(wide.starts_with("<format error: '%c' cannot format"), "{}", wide);

        let unsupported = sprintf("%q", &[1.into()]);
        assert!(unsupported.contains("unsupported conversion '%q'"));
    }
}
