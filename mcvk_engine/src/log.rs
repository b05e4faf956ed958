//! Internal logging system for the mcvk engine
//!
//! This module provides a flexible logging system with:
//! - Customizable logger via Logger trait
//! - Severity levels (Diagnostic, Info, Warn, Error, Fatal)
//! - Colored console output by default
//! - File and line information for ERROR and FATAL logs
//! - Error-producing macros that log before returning an [`Error`](crate::error::Error)

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to redirect engine output (file logging, test capture, etc.)
///
/// # Example
///
/// ```no_run
/// use mcvk_engine::mcvk::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "mcvk::swapchain", "mcvk::vulkan")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for ERROR and FATAL logs)
    pub file: Option<&'static str>,

    /// Source line (only for ERROR and FATAL logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    /// Narration of startup decisions (candidate devices, chosen formats...)
    Diagnostic = 0,

    /// Important informational messages
    Info = 1,

    /// Warning messages (potential issues)
    Warn = 2,

    /// Recoverable failures (with file:line details)
    Error = 3,

    /// Failures that stop the application (with file:line details)
    Fatal = 4,
}

impl LogSeverity {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogSeverity::Diagnostic,
            1 => LogSeverity::Info,
            2 => LogSeverity::Warn,
            3 => LogSeverity::Error,
            _ => LogSeverity::Fatal,
        }
    }

    /// Whether the default logger routes this severity to stderr
    pub fn is_failure(self) -> bool {
        self >= LogSeverity::Error
    }
}

/// Default logger implementation using colored console output
///
/// Colors:
/// - Diagnostic: bright_black
/// - Info: green
/// - Warn: yellow
/// - Error: red + bold
/// - Fatal: white on red, bold
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error/Fatal: `[timestamp] [ERROR] [source] message (file:line)` on stderr
pub struct DefaultLogger;

impl DefaultLogger {
    /// Build the printed line without color codes
    pub fn format_plain(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");
        let severity = match entry.severity {
            LogSeverity::Diagnostic => "DIAG ",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
            LogSeverity::Fatal => "FATAL",
        };

        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity, entry.source, entry.message, file, line
            ),
            _ => format!("[{}] [{}] [{}] {}", timestamp, severity, entry.source, entry.message),
        }
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        // Format timestamp as YYYY-MM-DD HH:MM:SS.mmm
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let severity_str = match entry.severity {
            LogSeverity::Diagnostic => "DIAG ".bright_black(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
            LogSeverity::Fatal => "FATAL".white().on_red().bold(),
        };

        let source = entry.source.bright_blue();

        let line = if let (Some(file), Some(line)) = (entry.file, entry.line) {
            format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp,
                severity_str,
                source,
                entry.message,
                file,
                line
            )
        } else {
            format!("[{}] [{}] [{}] {}", timestamp, severity_str, source, entry.message)
        };

        if entry.severity.is_failure() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a DIAGNOSTIC message (startup narration, shown in debug builds by default)
///
/// # Example
///
/// ```no_run
/// # use mcvk_engine::engine_diagnostic;
/// engine_diagnostic!("mcvk::accelerator", "Candidate {} rejected", "llvmpipe");
/// ```
#[macro_export]
macro_rules! engine_diagnostic {
    ($source:expr, $($arg:tt)*) => {
        $crate::mcvk::Engine::log(
            $crate::mcvk::log::LogSeverity::Diagnostic,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message (important events)
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::mcvk::Engine::log(
            $crate::mcvk::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message (potential issues)
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::mcvk::Engine::log(
            $crate::mcvk::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
///
/// # Example
///
/// ```no_run
/// # use mcvk_engine::engine_error;
/// engine_error!("mcvk::frame", "Failed to present image {}", 2);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::mcvk::Engine::log_detailed(
            $crate::mcvk::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log a FATAL message with file:line information
#[macro_export]
macro_rules! engine_fatal {
    ($source:expr, $($arg:tt)*) => {
        $crate::mcvk::Engine::log_detailed(
            $crate::mcvk::log::LogSeverity::Fatal,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR and evaluate to `Error::BackendError` with the same message
///
/// # Example
///
/// ```no_run
/// # use mcvk_engine::engine_err;
/// # fn f() -> mcvk_engine::mcvk::Result<()> {
/// return Err(engine_err!("mcvk::swapchain", "No surface formats reported"));
/// # }
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::mcvk::Engine::log_detailed(
            $crate::mcvk::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::mcvk::Error::BackendError(message)
    }};
}

/// Log a FATAL and evaluate to `Error::InitializationFailed` with the same message
#[macro_export]
macro_rules! engine_init_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::mcvk::Engine::log_detailed(
            $crate::mcvk::log::LogSeverity::Fatal,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::mcvk::Error::InitializationFailed(message)
    }};
}

/// Log a FATAL and evaluate to `Error::Unrecoverable` with the same message
#[macro_export]
macro_rules! engine_fatal_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::mcvk::Engine::log_detailed(
            $crate::mcvk::log::LogSeverity::Fatal,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::mcvk::Error::Unrecoverable(message)
    }};
}

/// Log an ERROR and return `Err(Error::BackendError)` from the enclosing function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
