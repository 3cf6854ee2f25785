//! Price conversion between supported currencies.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use storefront_common::{CurrencyCode, Money};
use tracing::{debug, warn};

use crate::exchange::ExchangeRates;

/// Rate applied to convert between two currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateQuote {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub rate: Decimal,
    /// Rate is a stand-in of 1 rather than market data.
    pub fallback: bool,
}

impl RateQuote {
    fn identity(from: CurrencyCode, to: CurrencyCode, fallback: bool) -> Self {
        Self {
            from,
            to,
            rate: Decimal::ONE,
            fallback,
        }
    }

    /// `amount * rate`, or `None` if the product overflows.
    pub fn try_apply(&self, amount: Decimal) -> Option<Decimal> {
        amount.checked_mul(self.rate)
    }

    /// `amount * rate`. An amount too large to convert is returned unchanged.
    pub fn apply(&self, amount: Decimal) -> Decimal {
        self.try_apply(amount).unwrap_or_else(|| {
            warn!(
                from = %self.from,
                to = %self.to,
                amount = %amount,
                "Converted amount overflows, leaving amount unconverted"
            );
            amount
        })
    }
}

/// Converts amounts using tables from [`ExchangeRates`].
pub struct PriceConverter {
    rates: Arc<ExchangeRates>,
}

impl PriceConverter {
    pub fn new(rates: Arc<ExchangeRates>) -> Self {
        Self { rates }
    }

    /// Rate to multiply `from` amounts by to get `to` amounts.
    ///
    /// Same-currency quotes never touch the rate service. A target missing
    /// from the table yields a fallback quote of 1.
    pub async fn quote(&self, from: CurrencyCode, to: CurrencyCode) -> RateQuote {
        if from == to {
            return RateQuote::identity(from, to, false);
        }

        let table = self.rates.get_rates(from).await;
        match table.rate(to) {
            Some(rate) => {
                debug!(from = %from, to = %to, rate = %rate, "Resolved conversion rate");
                RateQuote {
                    from,
                    to,
                    rate,
                    fallback: table.is_fallback(),
                }
            }
            None => {
                warn!(from = %from, to = %to, "No rate for target currency, leaving amount unconverted");
                RateQuote::identity(from, to, true)
            }
        }
    }

    /// Convert a single amount.
    pub async fn convert(&self, amount: Decimal, from: CurrencyCode, to: CurrencyCode) -> Decimal {
        self.quote(from, to).await.apply(amount)
    }

    /// Convert many amounts with one rate lookup.
    pub async fn convert_batch(
        &self,
        amounts: &[Decimal],
        from: CurrencyCode,
        to: CurrencyCode,
    ) -> Vec<Decimal> {
        if amounts.is_empty() {
            return Vec::new();
        }

        let quote = self.quote(from, to).await;
        amounts.iter().map(|amount| quote.apply(*amount)).collect()
    }

    pub async fn convert_money(&self, money: &Money, to: CurrencyCode) -> Money {
        let value = self.convert(money.value, money.currency, to).await;
        Money::new(value, to)
    }

    pub fn rates(&self) -> &Arc<ExchangeRates> {
        &self.rates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::exchange::DEFAULT_RATE_TTL;
    use crate::provider::MockRateProvider;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn converter(provider: Arc<MockRateProvider>) -> PriceConverter {
        PriceConverter::new(Arc::new(ExchangeRates::new(
            provider,
            Arc::new(TtlCache::new()),
            DEFAULT_RATE_TTL,
        )))
    }

    #[tokio::test]
    async fn test_same_currency_is_untouched() {
        let provider = Arc::new(MockRateProvider::new());
        let converter = converter(provider.clone());

        assert_eq!(
            converter.convert(dec!(100), CurrencyCode::Usd, CurrencyCode::Usd).await,
            dec!(100)
        );
        for code in CurrencyCode::ALL {
            assert_eq!(converter.convert(dec!(12.34), code, code).await, dec!(12.34));
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_convert() {
        let converter = converter(Arc::new(MockRateProvider::new()));

        let eur = converter
            .convert(dec!(100), CurrencyCode::Usd, CurrencyCode::Eur)
            .await;

        assert_eq!(eur, dec!(92));
    }

    #[tokio::test]
    async fn test_missing_target_rate_returns_amount() {
        let provider = Arc::new(MockRateProvider::new());
        provider.remove_rate(CurrencyCode::Sek);
        let converter = converter(provider);

        let quote = converter.quote(CurrencyCode::Usd, CurrencyCode::Sek).await;
        assert!(quote.fallback);

        let amount = converter
            .convert(dec!(49.99), CurrencyCode::Usd, CurrencyCode::Sek)
            .await;
        assert_eq!(amount, dec!(49.99));
    }

    #[tokio::test]
    async fn test_provider_outage_degrades_to_identity() {
        let provider = Arc::new(MockRateProvider::new());
        provider.set_failing(true);
        let converter = converter(provider);

        let quote = converter.quote(CurrencyCode::Usd, CurrencyCode::Jpy).await;

        assert!(quote.fallback);
        assert_eq!(quote.rate, Decimal::ONE);
    }

    #[tokio::test]
    async fn test_batch_uses_one_fetch() {
        let provider = Arc::new(MockRateProvider::new());
        let converter = converter(provider.clone());

        let converted = converter
            .convert_batch(
                &[dec!(1), dec!(10), dec!(250)],
                CurrencyCode::Usd,
                CurrencyCode::Gbp,
            )
            .await;

        assert_eq!(converted, vec![dec!(0.79), dec!(7.9), dec!(197.5)]);
        assert_eq!(provider.calls(), 1);

        let none = converter
            .convert_batch(&[], CurrencyCode::Usd, CurrencyCode::Cad)
            .await;
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_convert_money() {
        let converter = converter(Arc::new(MockRateProvider::new()));

        let money = Money::new(dec!(10), CurrencyCode::Usd);
        let krw = converter.convert_money(&money, CurrencyCode::Krw).await;

        assert_eq!(krw.currency, CurrencyCode::Krw);
        assert_eq!(krw.value, dec!(13500));
    }

    #[tokio::test]
    async fn test_overflowing_amount_is_returned_unchanged() {
        let converter = converter(Arc::new(MockRateProvider::new()));
        let huge: Decimal = "1000000000000000000000000000".parse().unwrap();

        let krw = converter
            .convert(huge, CurrencyCode::Usd, CurrencyCode::Krw)
            .await;
        assert_eq!(krw, huge);

        let batch = converter
            .convert_batch(&[dec!(2), Decimal::MAX], CurrencyCode::Usd, CurrencyCode::Krw)
            .await;
        assert_eq!(batch, vec![dec!(2700), Decimal::MAX]);

        let quote = converter.quote(CurrencyCode::Usd, CurrencyCode::Krw).await;
        assert_eq!(quote.try_apply(huge), None);
        assert_eq!(quote.try_apply(dec!(1)), Some(dec!(1350)));
    }

    #[tokio::test]
    async fn test_round_trip_every_pair() {
        let converter = converter(Arc::new(MockRateProvider::new()));

        for from in CurrencyCode::ALL {
            for to in CurrencyCode::ALL {
                for amount in [dec!(0), dec!(0.01), dec!(19.99), dec!(-42.5), dec!(1234567.89)] {
                    let there = converter.convert(amount, from, to).await;
                    let back = converter.convert(there, to, from).await;

                    assert!(
                        (back - amount).abs() < dec!(0.000001),
                        "{} {} -> {} {} -> {}",
                        amount,
                        from,
                        there,
                        to,
                        back
                    );
                }
            }
        }
    }

    fn currency() -> impl Strategy<Value = CurrencyCode> {
        prop::sample::select(CurrencyCode::ALL.to_vec())
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    proptest! {
        #[test]
        fn prop_same_currency_identity(cents in -100_000_000i64..100_000_000, code in currency()) {
            let amount = Decimal::new(cents, 2);
            let converter = converter(Arc::new(MockRateProvider::new()));

            let converted = block_on(converter.convert(amount, code, code));

            prop_assert_eq!(converted, amount);
        }

        #[test]
        fn prop_round_trip(cents in -100_000_000i64..100_000_000, from in currency(), to in currency()) {
            let converter = converter(Arc::new(MockRateProvider::new()));
            let amount = Decimal::new(cents, 2);

            let (there, back) = block_on(async {
                let there = converter.convert(amount, from, to).await;
                let back = converter.convert(there, to, from).await;
                (there, back)
            });

            prop_assert!((back - amount).abs() < dec!(0.000001), "{} -> {} -> {}", amount, there, back);
        }
    }
}
