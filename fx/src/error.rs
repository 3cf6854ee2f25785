//! FX error types.

use storefront_common::CurrencyCode;
use thiserror::Error;

/// Errors that can occur while fetching or presenting exchange rates.
///
/// None of these reach a shopper: the rate service turns provider errors into
/// an identity table and the formatter turns format errors into a plain
/// symbol-prefixed amount.
#[derive(Debug, Error)]
pub enum FxError {
    /// Transport-level failure talking to the rate API.
    #[error("Rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate API answered with an unexpected status.
    #[error("Rate API returned status {status} for base {base}")]
    HttpStatus { status: u16, base: CurrencyCode },

    /// Rate API refused the request (quota or key limits).
    #[error("Rate API request limit exceeded for base {0}")]
    RateLimited(CurrencyCode),

    /// Rate API reported an error in its body.
    #[error("Rate API error: {0}")]
    Api(String),

    /// Response body was not the expected JSON.
    #[error("Failed to decode rate response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Response carried no usable rate for any supported currency.
    #[error("No usable rates in response for base {0}")]
    EmptyRates(CurrencyCode),

    /// Currency has no ISO 4217 metadata in the formatting tables.
    #[error("No currency metadata for {0}")]
    MissingCurrencyMetadata(CurrencyCode),

    /// Locale tag has no known number layout.
    #[error("Unsupported locale: {0}")]
    UnsupportedLocale(String),
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
