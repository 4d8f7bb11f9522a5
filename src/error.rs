//! Error types for the plug-in framework core.
//!
//! Uses `thiserror` for ergonomic error handling with automatic `Display`
//! and `Error` trait implementations. Host implementations return the same
//! error type from their registry callbacks, so host statuses propagate
//! through a scan unchanged.

use thiserror::Error;

/// The primary error type for plug-in framework operations.
#[derive(Error, Debug)]
pub enum PlugError {
    /// The host or an allocator reported insufficient system resources.
    #[error("Insufficient resources: {0}")]
    Resource(String),

    /// A plug-in descriptor could not be parsed.
    #[error("Malformed descriptor: {0}")]
    Malformed(String),

    /// Descriptor or directory I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A status returned by a host registry operation.
    #[error("Host error: {0}")]
    Host(String),
}

/// A specialized `Result` type for plug-in framework operations.
pub type Result<T> = std::result::Result<T, PlugError>;
