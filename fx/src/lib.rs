//! Storefront FX
//!
//! Exchange-rate caching, price conversion and price formatting for the
//! storefront.
//!
//! # Features
//!
//! - Generic TTL cache with a background sweeper
//! - Rate tables fetched from exchangerate-api.com, cached for an hour
//! - Identity-rate fallback when rates cannot be fetched
//! - Single and batch price conversion
//! - Locale-aware price formatting with a plain fallback
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_common::CurrencyCode;
//! use storefront_fx::{ExchangeRateApiProvider, ExchangeRates, FxConfig, PriceConverter, TtlCache};
//!
//! let config = FxConfig::from_env();
//! let cache = Arc::new(TtlCache::new());
//! let sweeper = cache.spawn_sweeper(config.sweep_interval);
//!
//! let provider = Arc::new(ExchangeRateApiProvider::new(config.provider.clone())?);
//! let rates = Arc::new(ExchangeRates::new(provider, cache, config.rate_ttl));
//! let converter = PriceConverter::new(rates);
//!
//! let eur = converter.convert(dec!(499), CurrencyCode::Usd, CurrencyCode::Eur).await;
//! println!("{}", format_price(eur, CurrencyCode::Eur, None));
//!
//! sweeper.stop().await;
//! ```

pub mod cache;
pub mod config;
pub mod converter;
pub mod error;
pub mod exchange;
pub mod format;
pub mod provider;
pub mod rate_table;

pub use cache::{CacheConfig, CacheStats, SweeperHandle, TtlCache};
pub use config::FxConfig;
pub use converter::{PriceConverter, RateQuote};
pub use error::{FxError, FxResult};
pub use exchange::{ExchangeRates, RateTableCache, DEFAULT_RATE_TTL};
pub use format::{convert_and_format, fallback_format, format_price, try_format_price};
pub use provider::{ApiProviderConfig, ExchangeRateApiProvider, RateProvider};
pub use rate_table::{RateSource, RateTable};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
