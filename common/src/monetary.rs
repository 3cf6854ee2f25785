//! Monetary amounts.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::currency::CurrencyCode;

/// A price or amount in a specific currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub value: Decimal,
    pub currency: CurrencyCode,
}

impl Money {
    pub fn new(value: Decimal, currency: CurrencyCode) -> Self {
        Self { value, currency }
    }

    /// Round to the currency's minor units, half away from zero.
    pub fn round(&self) -> Self {
        Self {
            value: self.value.round_dp_with_strategy(
                self.currency.decimal_places(),
                RoundingStrategy::MidpointAwayFromZero,
            ),
            currency: self.currency,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_respects_minor_units() {
        assert_eq!(Money::new(dec!(10.005), CurrencyCode::Usd).round().value, dec!(10.01));
        assert_eq!(Money::new(dec!(-10.005), CurrencyCode::Usd).round().value, dec!(-10.01));
        assert_eq!(Money::new(dec!(1234.5), CurrencyCode::Jpy).round().value, dec!(1235));
    }

    #[test]
    fn test_display() {
        let m = Money::new(dec!(19.99), CurrencyCode::Gbp);
        assert_eq!(m.to_string(), "19.99 GBP");
    }
}
