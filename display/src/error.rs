//! Display error types.

use thiserror::Error;

/// Errors persisting the preferred currency.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Preference file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode preference: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type PreferenceResult<T> = Result<T, PreferenceError>;
