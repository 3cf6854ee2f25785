//! Cached access to rate tables with an identity fallback.

use std::sync::Arc;
use std::time::Duration;

use storefront_common::CurrencyCode;
use tracing::{error, info, instrument};

use crate::cache::TtlCache;
use crate::provider::RateProvider;
use crate::rate_table::RateTable;

/// Cache holding rate tables, keyed by [`ExchangeRates::cache_key`].
pub type RateTableCache = TtlCache<String, Arc<RateTable>>;

/// Default lifetime of a fetched table.
pub const DEFAULT_RATE_TTL: Duration = Duration::from_secs(60 * 60);

/// Serves rate tables from the cache, falling back to the provider.
///
/// Provider failures never reach the caller. They are logged and answered
/// with an identity table so prices render unconverted rather than not at
/// all. Identity tables are not cached, so the next request retries.
pub struct ExchangeRates {
    provider: Arc<dyn RateProvider>,
    cache: Arc<RateTableCache>,
    ttl: Duration,
}

impl ExchangeRates {
    pub fn new(provider: Arc<dyn RateProvider>, cache: Arc<RateTableCache>, ttl: Duration) -> Self {
        Self {
            provider,
            cache,
            ttl,
        }
    }

    pub fn cache_key(base: CurrencyCode) -> String {
        format!("exchange_rates_{}", base)
    }

    /// Rate table for `base`.
    #[instrument(skip(self), fields(base = %base))]
    pub async fn get_rates(&self, base: CurrencyCode) -> Arc<RateTable> {
        let provider = self.provider.clone();
        let result = self
            .cache
            .get_or_try_insert_with(Self::cache_key(base), self.ttl, || async move {
                let table = provider.fetch_rates(base).await?;
                info!(
                    provider = provider.name(),
                    rates = table.rates.len(),
                    "Cached fresh rate table"
                );
                Ok::<_, crate::error::FxError>(Arc::new(table))
            })
            .await;

        match result {
            Ok(table) => table,
            Err(e) => {
                error!(
                    provider = self.provider.name(),
                    error = %e,
                    "Rate fetch failed, using identity rates"
                );
                Arc::new(RateTable::identity(base))
            }
        }
    }

    /// Drop the cached table for `base` so the next read refetches.
    pub fn invalidate(&self, base: CurrencyCode) -> bool {
        self.cache.delete(&Self::cache_key(base))
    }

    pub fn cache(&self) -> &Arc<RateTableCache> {
        &self.cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
