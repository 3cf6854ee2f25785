//! Service wiring and lifecycle.

use std::sync::Arc;

use anyhow::Context;
use storefront_display::{CurrencyBus, CurrencyPreference, PreferenceStore, SessionRateCache};
use storefront_fx::{
    CacheConfig, ExchangeRateApiProvider, ExchangeRates, FxConfig, PriceConverter, RateProvider,
    RateTableCache, SweeperHandle, TtlCache,
};
use tracing::info;

/// Pricing services owned by the process.
///
/// Construction starts the rate-cache sweeper; [`PricingApp::shutdown`]
/// stops it.
pub struct PricingApp {
    pub converter: Arc<PriceConverter>,
    pub preference: CurrencyPreference,
    pub session: Arc<SessionRateCache>,
    sweeper: SweeperHandle,
}

impl PricingApp {
    /// Wire the services against the configured rate API.
    pub fn start(config: &FxConfig, store: Arc<dyn PreferenceStore>) -> anyhow::Result<Self> {
        let provider = ExchangeRateApiProvider::new(config.provider.clone())
            .context("failed to build rate API client")?;

        info!(
            authenticated = config.provider.api_key.is_some(),
            rate_ttl_secs = config.rate_ttl.as_secs(),
            "Using exchangerate-api provider"
        );

        Ok(Self::with_provider(Arc::new(provider), config, store))
    }

    pub fn with_provider(
        provider: Arc<dyn RateProvider>,
        config: &FxConfig,
        store: Arc<dyn PreferenceStore>,
    ) -> Self {
        let cache: Arc<RateTableCache> = Arc::new(TtlCache::with_config(CacheConfig {
            default_ttl: config.rate_ttl,
        }));
        let sweeper = cache.spawn_sweeper(config.sweep_interval);

        let rates = Arc::new(ExchangeRates::new(provider, cache, config.rate_ttl));

        Self {
            converter: Arc::new(PriceConverter::new(rates)),
            preference: CurrencyPreference::new(store, CurrencyBus::default()),
            session: Arc::new(SessionRateCache::new()),
            sweeper,
        }
    }

    pub fn rates(&self) -> &Arc<ExchangeRates> {
        self.converter.rates()
    }

    /// Stop background tasks.
    pub async fn shutdown(self) {
        self.sweeper.stop().await;
        info!("Pricing services stopped");
    }
}
