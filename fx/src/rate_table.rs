//! Exchange rate tables.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use storefront_common::CurrencyCode;
use tracing::debug;

use crate::error::{FxError, FxResult};

/// Where a rate table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Fetched from the rate API.
    Api,
    /// Identity table used because no real rates were available.
    Fallback,
}

/// Snapshot of rates for every supported currency against one base.
///
/// Tables are never mutated after construction; a newer fetch replaces the
/// whole table.
#[derive(Debug, Clone, Serialize)]
pub struct RateTable {
    pub base: CurrencyCode,
    pub rates: HashMap<CurrencyCode, Decimal>,
    pub timestamp: DateTime<Utc>,
    pub source: RateSource,
}

impl RateTable {
    /// Table where every currency converts 1:1.
    pub fn identity(base: CurrencyCode) -> Self {
        Self {
            base,
            rates: CurrencyCode::ALL
                .into_iter()
                .map(|code| (code, Decimal::ONE))
                .collect(),
            timestamp: Utc::now(),
            source: RateSource::Fallback,
        }
    }

    /// Build a table from already validated rates.
    pub fn new(base: CurrencyCode, mut rates: HashMap<CurrencyCode, Decimal>) -> Self {
        rates.insert(base, Decimal::ONE);
        Self {
            base,
            rates,
            timestamp: Utc::now(),
            source: RateSource::Api,
        }
    }

    /// Normalise a raw provider response keyed by ISO code.
    ///
    /// Unsupported codes are ignored, non-positive or non-finite values are
    /// dropped, and the base always maps to exactly 1.
    pub fn from_api(base: CurrencyCode, raw: &HashMap<String, f64>) -> FxResult<Self> {
        let mut rates = HashMap::with_capacity(CurrencyCode::ALL.len());

        for (code, value) in raw {
            let Ok(currency) = code.parse::<CurrencyCode>() else {
                continue;
            };
            match decimal_from_json(*value) {
                Some(rate) if rate > Decimal::ZERO => {
                    rates.insert(currency, rate);
                }
                _ => {
                    debug!(base = %base, currency = %currency, value = *value, "Dropping unusable rate");
                }
            }
        }

        if rates.keys().all(|c| *c == base) {
            return Err(FxError::EmptyRates(base));
        }

        Ok(Self::new(base, rates))
    }

    /// Rate from the base to `to`, if known.
    pub fn rate(&self, to: CurrencyCode) -> Option<Decimal> {
        self.rates.get(&to).copied()
    }

    /// Convert `amount` of the base currency into `to`.
    ///
    /// `None` when the rate is unknown or the product overflows.
    pub fn convert(&self, amount: Decimal, to: CurrencyCode) -> Option<Decimal> {
        self.rate(to).and_then(|rate| amount.checked_mul(rate))
    }

    pub fn is_fallback(&self) -> bool {
        self.source == RateSource::Fallback
    }

    /// Whether every supported currency has a rate.
    pub fn is_complete(&self) -> bool {
        CurrencyCode::ALL.iter().all(|c| self.rates.contains_key(c))
    }

    /// Currencies with no rate in this table.
    pub fn missing(&self) -> Vec<CurrencyCode> {
        CurrencyCode::ALL
            .into_iter()
            .filter(|c| !self.rates.contains_key(c))
            .collect()
    }
}

/// JSON numbers arrive as `f64`; go through the shortest decimal rendering so
/// `0.92` becomes exactly `0.92` rather than its binary approximation.
fn decimal_from_json(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    value.to_string().parse().ok()
}
