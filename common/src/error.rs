//! Error types for shared storefront types.

use thiserror::Error;

/// Errors raised while interpreting currency data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    /// The code is not one of the supported storefront currencies.
    #[error("Unsupported currency: {0}")]
    Unsupported(String),
}
