//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone,
//! std::error::Error), including the structured CapacityExhausted variant.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("Vulkan initialization failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("Vulkan initialization failed"));
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    let display = format!("{}", err);
    assert_eq!(display, "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("Atlas pixel payload is empty".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("Atlas pixel payload is empty"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("Window creation failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Initialization failed"));
    assert!(display.contains("Window creation failed"));
}

#[test]
fn test_capacity_exhausted_display() {
    let err = Error::CapacityExhausted {
        requested: 600,
        capacity: 1024,
    };
    let display = format!("{}", err);
    assert!(display.contains("capacity exhausted"));
    assert!(display.contains("600"));
    assert!(display.contains("1024"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    // Verify Error implements std::error::Error trait
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let err1 = Error::BackendError("test".to_string());
    assert!(format!("{:?}", err1).contains("BackendError"));

    let err2 = Error::OutOfMemory;
    assert!(format!("{:?}", err2).contains("OutOfMemory"));

    let err3 = Error::InvalidResource("resource".to_string());
    assert!(format!("{:?}", err3).contains("InvalidResource"));

    let err4 = Error::InitializationFailed("init".to_string());
    assert!(format!("{:?}", err4).contains("InitializationFailed"));

    let err5 = Error::CapacityExhausted {
        requested: 1,
        capacity: 0,
    };
    assert!(format!("{:?}", err5).contains("CapacityExhausted"));
}

#[test]
fn test_error_clone() {
    let err1 = Error::BackendError("test".to_string());
    let err2 = err1.clone();
    assert_eq!(format!("{}", err1), format!("{}", err2));

    let err3 = Error::CapacityExhausted {
        requested: 4096,
        capacity: 1024,
    };
    let err4 = err3.clone();
    assert_eq!(format!("{}", err3), format!("{}", err4));
}

// ============================================================================
// RESULT TYPE TESTS
// ============================================================================

#[test]
fn test_result_type_ok() {
    fn returns_ok() -> Result<i32> {
        Ok(42)
    }

    let result = returns_ok();
    assert!(result.is_ok());
    assert_eq!(result.unwrap(), 42);
}

#[test]
fn test_result_type_err() {
    fn returns_error() -> Result<i32> {
        Err(Error::OutOfMemory)
    }

    let result = returns_error();
    assert!(result.is_err());

    if let Err(e) = result {
        assert_eq!(format!("{}", e), "Out of GPU memory");
    }
}

// ============================================================================
// ERROR PROPAGATION TESTS
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::CapacityExhausted {
            requested: 600,
            capacity: 512,
        })
    }

    fn outer() -> Result<i32> {
        inner()?;
        Ok(42)
    }

    let result = outer();
    assert!(matches!(
        result,
        Err(Error::CapacityExhausted {
            requested: 600,
            capacity: 512
        })
    ));
}

#[test]
fn test_error_message_content() {
    // Error messages carry enough context to diagnose without a debugger
    let err1 = Error::BackendError("Vulkan error code: -3".to_string());
    assert!(format!("{}", err1).contains("Vulkan error code: -3"));

    let err2 = Error::InvalidResource("Atlas is 0x0".to_string());
    assert!(format!("{}", err2).contains("Atlas is 0x0"));

    let err3 = Error::InitializationFailed("Failed to load vulkan-1.dll".to_string());
    assert!(format!("{}", err3).contains("vulkan-1.dll"));
}
