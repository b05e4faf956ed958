/// mcvk Engine - process-wide engine services
///
/// Holds the global logger, the minimum log severity and applies the
/// process-level parts of [`Config`]. GPU objects are never stored here:
/// they are owned by the [`Renderer`](crate::renderer::Renderer) that built them.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::config::Config;
use crate::lifecycle;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Messages below this severity are dropped before reaching the logger
static MIN_SEVERITY: AtomicU8 = AtomicU8::new(if cfg!(debug_assertions) {
    LogSeverity::Diagnostic as u8
} else {
    LogSeverity::Info as u8
});

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

// ===== PUBLIC API =====

/// Engine services entry point
///
/// # Example
///
/// ```no_run
/// use mcvk_engine::mcvk::{Config, Engine};
///
/// Engine::initialize(&Config::default());
/// ```
pub struct Engine;

impl Engine {
    /// Apply the process-level settings of a configuration
    ///
    /// Sets the minimum log severity and toggles lifecycle checks.
    /// Safe to call more than once; the last call wins.
    pub fn initialize(config: &Config) {
        Self::set_min_severity(config.min_log_severity);
        lifecycle::set_enabled(config.lifecycle_checks);
        crate::engine_diagnostic!(
            "mcvk::Engine",
            "Engine initialized (lifecycle checks: {}, min severity: {:?})",
            config.lifecycle_checks,
            config.min_log_severity
        );
    }

    // ===== LOGGER API =====

    /// Set a custom logger
    ///
    /// Replaces the current logger (DefaultLogger by default).
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = self::logger().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = self::logger().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Discard messages below `severity`
    pub fn set_min_severity(severity: LogSeverity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    /// Current minimum severity
    pub fn min_severity() -> LogSeverity {
        LogSeverity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    /// Internal logging method with file:line information (for ERROR and FATAL logs)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }

    fn dispatch(entry: LogEntry) {
        if entry.severity < Self::min_severity() {
            return;
        }
        if let Ok(lock) = logger().read() {
            lock.log(&entry);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
