//! System log appender
//!
//! Sends each line as a BSD-style datagram (`<PRI>ident[pid]: line`) to the
//! local syslog socket. The socket is connected lazily and dropped on any
//! send failure so the next line reconnects.

use crate::core::error::{LoggerError, Result};
use crate::core::{Appender, LogLevel};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::net::UnixDatagram;

/// Facility code for user-level messages
pub const FACILITY_USER: u8 = 1;

pub struct SyslogAppender {
    ident: String,
    socket_path: PathBuf,
    pid: u32,
    #[cfg(unix)]
    socket: Option<UnixDatagram>,
}

impl SyslogAppender {
    /// Create an appender that writes to `socket_path` under `ident`
    ///
    /// Nothing is opened until the first line is appended.
    pub fn new(ident: impl Into<String>, socket_path: impl AsRef<Path>) -> Self {
        Self {
            ident: ident.into(),
            socket_path: socket_path.as_ref().to_path_buf(),
            pid: std::process::id(),
            #[cfg(unix)]
            socket: None,
        }
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// `<PRI>` value for `level`: facility * 8 + severity
    pub fn priority(level: LogLevel) -> u8 {
        FACILITY_USER * 8 + level.syslog_severity()
    }

    fn frame(&self, line: &str, level: LogLevel) -> String {
        format!(
            "<{}>{}[{}]: {}",
            Self::priority(level),
            self.ident,
            self.pid,
            line
        )
    }

    #[cfg(unix)]
    fn send(&mut self, datagram: &str) -> Result<()> {
        if self.socket.is_none() {
            let socket = UnixDatagram::unbound()
                .and_then(|s| s.connect(&self.socket_path).map(|()| s))
                .map_err(|e| {
                    LoggerError::syslog(format!(
                        "cannot connect to '{}': {}",
                        self.socket_path.display(),
                        e
                    ))
                })?;
            self.socket = Some(socket);
        }

        let sent = match self.socket.as_ref() {
            Some(socket) => socket.send(datagram.as_bytes()),
            None => return Err(LoggerError::syslog("socket unavailable")),
        };

        sent.map(|_| ()).map_err(|e| {
            self.socket = None;
            LoggerError::syslog(format!("send failed: {}", e))
        })
    }

    #[cfg(not(unix))]
    fn send(&mut self, _datagram: &str) -> Result<()> {
        Err(LoggerError::syslog("system log is not supported on this platform"))
    }
}

impl Appender for SyslogAppender {
    fn append(&mut self, line: &str, level: LogLevel) -> Result<()> {
        let datagram = self.frame(line, level);
        self.send(&datagram)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "syslog"
    }
}
