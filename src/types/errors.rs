//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.
//!
//! Errors fall into two tiers. *Deliberate* errors (validation, not-found,
//! internal) are raised on purpose by an operation and travel unchanged to the
//! transport boundary. Everything else (remote failures, timeouts, codec
//! problems) is caught at the operation boundary and folded into the error
//! envelope.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the DeviceHub core.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-correctable input problems (map to INVALID_PARAMS).
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown tool, service or method (map to NOT_FOUND).
    #[error("not found: {0}")]
    NotFound(String),

    /// Deliberately raised system errors (map to INTERNAL_ERROR).
    #[error("internal error: {0}")]
    Internal(String),

    /// The remote catalog rejected or failed a call.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// The remote catalog did not answer in time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error was raised on purpose and must keep its classification.
    pub fn is_deliberate(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::NotFound(_) | Error::Internal(_)
        )
    }

    /// Error code carried in IPC error frames.
    pub fn to_ipc_error_code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "INVALID_PARAMS",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Internal(_)
            | Error::Gateway(_)
            | Error::Timeout(_)
            | Error::Serialization(_)
            | Error::Io(_) => "INTERNAL_ERROR",
        }
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::Gateway(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }
}
