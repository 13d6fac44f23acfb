//! Bridge-side error taxonomy.
//!
//! These errors cover the bridge's own fault domain: loading, symbol
//! resolution, and argument/result marshaling. Native status codes are
//! never mapped into this type; they pass through as
//! [`Fmi2Status`](crate::Fmi2Status) verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the bridge itself
#[derive(Error, Debug)]
pub enum Fmi2Error {
    #[error("failed to load shared library '{path}': {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    #[error("symbol '{symbol}' not found in the loaded library")]
    SymbolNotFound { symbol: String },

    #[error("invalid string: {0}")]
    InvalidString(String),

    #[error("fmi2Instantiate returned no component for instance '{instance_name}'")]
    InstantiationFailed { instance_name: String },

    #[error("failed to release the library handle: {reason}")]
    CloseFailed { reason: String },
}

impl From<std::ffi::NulError> for Fmi2Error {
    fn from(e: std::ffi::NulError) -> Self {
        Fmi2Error::InvalidString(format!("string contains an interior NUL byte: {}", e))
    }
}
