//! Error types for the Lumen geometry manager
//!
//! This module defines the error types used throughout the crate,
//! including configuration, surface state, and GPU allocation failures.

use std::fmt;

/// Result type for Lumen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (GPU driver, poisoned lock, etc.)
    BackendError(String),

    /// Out of GPU memory, and no evictor could free anything
    OutOfMemory,

    /// Invalid resource (unknown geometry type, unknown surface, etc.)
    InvalidResource(String),

    /// Invalid geometry description (missing/unknown primitive, bad arrays)
    Configuration(String),

    /// A draw was requested while no rendering surface is active
    NoActiveSurface,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Error::NoActiveSurface => write!(f, "No active rendering surface"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Whether this error is a GPU out-of-memory condition
    ///
    /// The memory coordinator only retries allocations failing this way.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Error::OutOfMemory)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
