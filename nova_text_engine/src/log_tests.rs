//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, DefaultLogger, and the
//! error-constructing macros.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::error::{Error, Result};
use std::time::SystemTime;

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    // Test PartialOrd implementation
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_equality() {
    assert_eq!(LogSeverity::Info, LogSeverity::Info);
    assert_ne!(LogSeverity::Trace, LogSeverity::Debug);
    assert_ne!(LogSeverity::Info, LogSeverity::Error);
}

#[test]
fn test_log_severity_debug() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Debug), "Debug");
    assert_eq!(format!("{:?}", LogSeverity::Info), "Info");
    assert_eq!(format!("{:?}", LogSeverity::Warn), "Warn");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_creation_without_file_line() {
    let entry = LogEntry {
        severity: LogSeverity::Info,
        timestamp: SystemTime::now(),
        source: "novatext::Engine".to_string(),
        message: "Engine initialized".to_string(),
        file: None,
        line: None,
    };

    assert_eq!(entry.severity, LogSeverity::Info);
    assert_eq!(entry.source, "novatext::Engine");
    assert_eq!(entry.message, "Engine initialized");
    assert!(entry.file.is_none());
    assert!(entry.line.is_none());
}

#[test]
fn test_log_entry_creation_with_file_line() {
    let entry = LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "novatext::vulkan".to_string(),
        message: "Vulkan error".to_string(),
        file: Some("vulkan_context.rs"),
        line: Some(42),
    };

    assert_eq!(entry.severity, LogSeverity::Error);
    assert_eq!(entry.file, Some("vulkan_context.rs"));
    assert_eq!(entry.line, Some(42));
}

#[test]
fn test_log_entry_clone() {
    let entry1 = LogEntry {
        severity: LogSeverity::Warn,
        timestamp: SystemTime::now(),
        source: "test".to_string(),
        message: "warning".to_string(),
        file: Some("test.rs"),
        line: Some(10),
    };

    let entry2 = entry1.clone();

    assert_eq!(entry1.severity, entry2.severity);
    assert_eq!(entry1.source, entry2.source);
    assert_eq!(entry1.message, entry2.message);
    assert_eq!(entry1.file, entry2.file);
    assert_eq!(entry1.line, entry2.line);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_all_severities_without_file_line() {
    let logger = DefaultLogger;
    let timestamp = SystemTime::now();

    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        let entry = LogEntry {
            severity,
            timestamp,
            source: "test".to_string(),
            message: format!("{:?} message", severity),
            file: None,
            line: None,
        };
        // Just verify it doesn't panic
        logger.log(&entry);
    }
}

#[test]
fn test_default_logger_error_with_file_line() {
    let logger = DefaultLogger;
    let entry = LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "novatext::vulkan".to_string(),
        message: "Critical Vulkan error".to_string(),
        file: Some("vulkan_arena.rs"),
        line: Some(123),
    };

    // Test the file:line branch
    logger.log(&entry);
}

// ============================================================================
// LOGGER TRAIT TESTS
// ============================================================================

struct TestLogger {
    logged_count: std::sync::Mutex<usize>,
}

impl TestLogger {
    fn new() -> Self {
        Self {
            logged_count: std::sync::Mutex::new(0),
        }
    }

    fn get_count(&self) -> usize {
        *self.logged_count.lock().unwrap()
    }
}

impl Logger for TestLogger {
    fn log(&self, _entry: &LogEntry) {
        let mut count = self.logged_count.lock().unwrap();
        *count += 1;
    }
}

#[test]
fn test_custom_logger_implementation() {
    let logger = TestLogger::new();
    assert_eq!(logger.get_count(), 0);

    let entry = LogEntry {
        severity: LogSeverity::Info,
        timestamp: SystemTime::now(),
        source: "test".to_string(),
        message: "test".to_string(),
        file: None,
        line: None,
    };

    logger.log(&entry);
    assert_eq!(logger.get_count(), 1);

    logger.log(&entry);
    assert_eq!(logger.get_count(), 2);
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
}

// ============================================================================
// ERROR-CONSTRUCTING MACRO TESTS
// ============================================================================

#[test]
fn test_engine_err_builds_backend_error() {
    let err = crate::engine_err!("test", "fence creation failed: {}", -4);
    match err {
        Error::BackendError(msg) => {
            assert_eq!(msg, "fence creation failed: -4");
        }
        other => panic!("expected BackendError, got {:?}", other),
    }
}

#[test]
fn test_engine_bail_returns_early() {
    fn failing() -> Result<i32> {
        crate::engine_bail!("test", "device lost ({})", "simulated");
    }

    let result = failing();
    assert!(matches!(result, Err(Error::BackendError(_))));
    if let Err(e) = result {
        assert!(format!("{}", e).contains("device lost (simulated)"));
    }
}

#[test]
fn test_engine_bail_not_reached_on_success() {
    fn conditional(fail: bool) -> Result<i32> {
        if fail {
            crate::engine_bail!("test", "requested failure");
        }
        Ok(7)
    }

    assert_eq!(conditional(false).unwrap(), 7);
    assert!(conditional(true).is_err());
}
