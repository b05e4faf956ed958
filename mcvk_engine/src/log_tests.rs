//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, and DefaultLogger.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "mcvk::test".to_string(),
        message: "something happened".to_string(),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Diagnostic < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
    assert!(LogSeverity::Error < LogSeverity::Fatal);
}

#[test]
fn test_log_severity_u8_roundtrip() {
    for severity in [
        LogSeverity::Diagnostic,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
        LogSeverity::Fatal,
    ] {
        assert_eq!(LogSeverity::from_u8(severity as u8), severity);
    }
    assert_eq!(LogSeverity::from_u8(200), LogSeverity::Fatal);
}

#[test]
fn test_failure_severities() {
    assert!(!LogSeverity::Diagnostic.is_failure());
    assert!(!LogSeverity::Info.is_failure());
    assert!(!LogSeverity::Warn.is_failure());
    assert!(LogSeverity::Error.is_failure());
    assert!(LogSeverity::Fatal.is_failure());
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_format_plain_without_location() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Info, None, None));
    assert!(line.contains("[INFO ]"));
    assert!(line.contains("[mcvk::test]"));
    assert!(line.ends_with("something happened"));
}

#[test]
fn test_format_plain_with_location() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Fatal, Some("frame.rs"), Some(12)));
    assert!(line.contains("[FATAL]"));
    assert!(line.ends_with("(frame.rs:12)"));
}

#[test]
fn test_default_logger_does_not_panic() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Diagnostic,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
        LogSeverity::Fatal,
    ] {
        logger.log(&entry(severity, Some("log_tests.rs"), Some(1)));
    }
}
