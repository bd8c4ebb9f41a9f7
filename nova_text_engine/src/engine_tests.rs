//! Unit tests for engine.rs
//!
//! Tests the global logging registry. All tests touching the shared logger
//! run serialized to avoid cross-test interference.

use crate::engine::Engine;
use crate::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER
// ============================================================================

/// Capturing logger that records every entry it receives
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
    }
}

// ============================================================================
// LOGGER REGISTRY TESTS
// ============================================================================

#[test]
#[serial]
fn test_set_logger_routes_entries() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger {
        entries: entries.clone(),
    });

    Engine::log(LogSeverity::Info, "test", "hello".to_string());

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].severity, LogSeverity::Info);
        assert_eq!(captured[0].source, "test");
        assert_eq!(captured[0].message, "hello");
        assert!(captured[0].file.is_none());
        assert!(captured[0].line.is_none());
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_log_detailed_carries_file_line() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger {
        entries: entries.clone(),
    });

    Engine::log_detailed(
        LogSeverity::Error,
        "novatext::vulkan",
        "boom".to_string(),
        "vulkan_arena.rs",
        99,
    );

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].severity, LogSeverity::Error);
        assert_eq!(captured[0].file, Some("vulkan_arena.rs"));
        assert_eq!(captured[0].line, Some(99));
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_reset_logger_stops_capture() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger {
        entries: entries.clone(),
    });

    Engine::log(LogSeverity::Debug, "test", "captured".to_string());
    Engine::reset_logger();
    Engine::log(LogSeverity::Debug, "test", "not captured".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].message, "captured");
}

#[test]
#[serial]
fn test_logging_macros_route_through_engine() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger {
        entries: entries.clone(),
    });

    crate::engine_info!("test", "info {}", 1);
    crate::engine_warn!("test", "warn {}", 2);
    crate::engine_error!("test", "error {}", 3);

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 3);
        assert_eq!(captured[0].severity, LogSeverity::Info);
        assert_eq!(captured[0].message, "info 1");
        assert_eq!(captured[1].severity, LogSeverity::Warn);
        assert_eq!(captured[1].message, "warn 2");
        assert_eq!(captured[2].severity, LogSeverity::Error);
        assert_eq!(captured[2].message, "error 3");
        // engine_error! carries the call site
        assert!(captured[2].file.is_some());
        assert!(captured[2].line.is_some());
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_err_logs_and_returns_error() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger {
        entries: entries.clone(),
    });

    let err = crate::engine_err!("test", "allocation failed: {} bytes", 4096);

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].severity, LogSeverity::Error);
        assert_eq!(captured[0].message, "allocation failed: 4096 bytes");
    }
    assert!(format!("{}", err).contains("allocation failed: 4096 bytes"));

    Engine::reset_logger();
}
