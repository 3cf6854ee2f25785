//! Storefront Display
//!
//! Shopper-facing price presentation: the persisted preferred currency, the
//! channel announcing changes to it, and price displays that follow those
//! changes.
//!
//! # Example
//!
//! ```rust,ignore
//! let preference = CurrencyPreference::new(Arc::new(MemoryPreferenceStore::new()), CurrencyBus::default());
//! let session = Arc::new(SessionRateCache::new());
//!
//! let price = Arc::new(PriceDisplay::new(
//!     Money::new(dec!(999), CurrencyCode::Usd),
//!     None,
//!     converter.clone(),
//!     session.clone(),
//! ));
//! price.mount(&preference).await;
//! let mounted = price.clone().attach(preference.subscribe());
//!
//! preference.set_preferred(CurrencyCode::Eur).await?;
//! // ... price.view() now follows EUR
//!
//! mounted.unmount().await;
//! ```

pub mod error;
pub mod events;
pub mod preference;
pub mod price;
pub mod session;

pub use error::{PreferenceError, PreferenceResult};
pub use events::{CurrencyBus, CurrencyChange, CurrencySubscription};
pub use preference::{CurrencyPreference, FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use price::{DisplayPhase, MountedPrice, PriceDisplay, PriceView};
pub use session::SessionRateCache;
