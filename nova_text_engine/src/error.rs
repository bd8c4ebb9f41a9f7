//! Error types for the NovaText engine
//!
//! This module defines the error types used throughout the engine,
//! covering GPU resource creation, streaming-arena allocation, and
//! initialization.

use std::fmt;

/// Result type for NovaText engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// NovaText engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (unexpected Vulkan result, lock poisoning, ...)
    BackendError(String),

    /// Out of GPU memory, or no memory type with the required properties
    OutOfMemory,

    /// Invalid resource (empty atlas, mismatched pixel payload, ...)
    InvalidResource(String),

    /// Initialization failed (device, swapchain, upload preconditions)
    InitializationFailed(String),

    /// A streaming-arena allocation would overrun the arena's capacity.
    ///
    /// Recoverable: grow the arena (`grow_if_needed`) and retry. The arena
    /// never wraps around or truncates.
    CapacityExhausted {
        /// Bytes the failed allocation asked for
        requested: u64,
        /// Current arena capacity in bytes
        capacity: u64,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::CapacityExhausted { requested, capacity } => write!(
                f,
                "Arena capacity exhausted: requested {} bytes with {} bytes capacity",
                requested, capacity
            ),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
