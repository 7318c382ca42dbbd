//! Error types for the rustyblue-keys library
//!
//! This module defines the recoverable error types used throughout the library.
//! Misuse of the API (stale handles, broken collaborator contracts) is not
//! represented here; it panics with an `invalid usage:` message instead.

use thiserror::Error;

/// Errors reported by bond store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeysError {
    #[error("Settings store returned error {0}")]
    Storage(i32),

    #[error("Invalid settings key path: {0}")]
    InvalidKeyPath(String),

    #[error("Invalid stored record length: {0}")]
    InvalidRecordLength(usize),

    #[error("Failed to encode record: {0}")]
    Encode(String),

    #[error("No free key slot")]
    NoFreeSlot,
}

impl KeysError {
    /// Status code in the settings store convention (negative on failure).
    pub fn code(&self) -> i32 {
        match self {
            KeysError::Storage(code) => *code,
            KeysError::InvalidKeyPath(_) | KeysError::InvalidRecordLength(_) => -22,
            KeysError::Encode(_) => -5,
            KeysError::NoFreeSlot => -12,
        }
    }
}

/// Result type for bond store operations
pub type KeysResult<T> = Result<T, KeysError>;

/// Abort on a broken API contract.
#[track_caller]
pub(crate) fn invalid_usage(what: &str) -> ! {
    panic!("invalid usage: {}", what)
}
