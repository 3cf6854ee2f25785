//! Per-session cache of pair rates.

use dashmap::DashMap;
use rust_decimal::Decimal;
use storefront_common::CurrencyCode;
use storefront_fx::{PriceConverter, RateQuote};
use tracing::debug;

/// Rates already resolved this session, keyed `"FROM-TO"`.
///
/// Sits in front of the rate-table cache so repeated displays of the same
/// pair skip the rate service entirely. Only market rates are kept; a
/// fallback quote is retried on the next lookup.
#[derive(Debug, Default)]
pub struct SessionRateCache {
    rates: DashMap<String, Decimal>,
}

impl SessionRateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(from: CurrencyCode, to: CurrencyCode) -> String {
        format!("{}-{}", from, to)
    }

    pub fn get(&self, from: CurrencyCode, to: CurrencyCode) -> Option<Decimal> {
        self.rates.get(&Self::key(from, to)).map(|r| *r)
    }

    pub fn insert(&self, from: CurrencyCode, to: CurrencyCode, rate: Decimal) {
        self.rates.insert(Self::key(from, to), rate);
    }

    /// Cached rate for the pair, or a fresh quote from `converter`.
    pub async fn resolve(
        &self,
        converter: &PriceConverter,
        from: CurrencyCode,
        to: CurrencyCode,
    ) -> RateQuote {
        if let Some(rate) = self.get(from, to) {
            debug!(from = %from, to = %to, "Session rate hit");
            return RateQuote {
                from,
                to,
                rate,
                fallback: false,
            };
        }

        let quote = converter.quote(from, to).await;
        if !quote.fallback && from != to {
            self.insert(from, to, quote.rate);
        }
        quote
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn clear(&self) {
        self.rates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use storefront_fx::{ExchangeRates, MockRateProvider, TtlCache, DEFAULT_RATE_TTL};

    fn setup() -> (Arc<MockRateProvider>, PriceConverter) {
        let provider = Arc::new(MockRateProvider::new());
        let rates = ExchangeRates::new(provider.clone(), Arc::new(TtlCache::new()), DEFAULT_RATE_TTL);
        (provider, PriceConverter::new(Arc::new(rates)))
    }

    #[test]
    fn test_key_format() {
        assert_eq!(SessionRateCache::key(CurrencyCode::Usd, CurrencyCode::Eur), "USD-EUR");
    }

    #[tokio::test]
    async fn test_resolve_caches_pair() {
        let (provider, converter) = setup();
        let session = SessionRateCache::new();

        let first = session.resolve(&converter, CurrencyCode::Usd, CurrencyCode::Eur).await;
        // Evict the table so only the session cache can answer.
        converter.rates().invalidate(CurrencyCode::Usd);
        let second = session.resolve(&converter, CurrencyCode::Usd, CurrencyCode::Eur).await;

        assert_eq!(first.rate, dec!(0.92));
        assert_eq!(second.rate, dec!(0.92));
        assert_eq!(provider.calls(), 1);
        assert_eq!(session.get(CurrencyCode::Usd, CurrencyCode::Eur), Some(dec!(0.92)));
    }

    #[tokio::test]
    async fn test_fallback_rates_are_not_kept() {
        let (provider, converter) = setup();
        provider.set_failing(true);
        let session = SessionRateCache::new();

        let quote = session.resolve(&converter, CurrencyCode::Usd, CurrencyCode::Gbp).await;

        assert!(quote.fallback);
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_same_pair_not_stored() {
        let (_, converter) = setup();
        let session = SessionRateCache::new();

        let quote = session.resolve(&converter, CurrencyCode::Sek, CurrencyCode::Sek).await;

        assert_eq!(quote.rate, Decimal::ONE);
        assert!(session.is_empty());
    }
}
