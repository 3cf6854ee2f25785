//! Persisted preferred display currency.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use storefront_common::CurrencyCode;
use tracing::{info, warn};

use crate::error::PreferenceResult;
use crate::events::{CurrencyBus, CurrencySubscription};

/// Storage for the shopper's preferred currency.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Stored preference, if any.
    async fn load(&self) -> Option<CurrencyCode>;

    async fn save(&self, currency: CurrencyCode) -> PreferenceResult<()>;
}

/// Preference held in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    current: RwLock<Option<CurrencyCode>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preference(currency: CurrencyCode) -> Self {
        Self {
            current: RwLock::new(Some(currency)),
        }
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn load(&self) -> Option<CurrencyCode> {
        *self.current.read()
    }

    async fn save(&self, currency: CurrencyCode) -> PreferenceResult<()> {
        *self.current.write() = Some(currency);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPreference {
    preferred_currency: CurrencyCode,
}

/// Preference stored as a small JSON document on disk.
///
/// File access goes through `tokio::fs`, so loads and saves never block a
/// runtime worker.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn load(&self) -> Option<CurrencyCode> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read currency preference");
                return None;
            }
        };

        match serde_json::from_slice::<StoredPreference>(&raw) {
            Ok(stored) => Some(stored.preferred_currency),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt currency preference");
                None
            }
        }
    }

    async fn save(&self, currency: CurrencyCode) -> PreferenceResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let raw = serde_json::to_vec(&StoredPreference {
            preferred_currency: currency,
        })?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

/// Preferred currency plus the channel announcing changes to it.
#[derive(Clone)]
pub struct CurrencyPreference {
    store: Arc<dyn PreferenceStore>,
    bus: CurrencyBus,
}

impl CurrencyPreference {
    pub fn new(store: Arc<dyn PreferenceStore>, bus: CurrencyBus) -> Self {
        Self { store, bus }
    }

    pub async fn preferred(&self) -> Option<CurrencyCode> {
        self.store.load().await
    }

    /// Persist `currency` and notify subscribers.
    ///
    /// Returns how many subscribers received the change.
    pub async fn set_preferred(&self, currency: CurrencyCode) -> PreferenceResult<usize> {
        self.store.save(currency).await?;
        let notified = self.bus.publish(currency);
        info!(currency = %currency, notified, "Preferred currency changed");
        Ok(notified)
    }

    pub fn subscribe(&self) -> CurrencySubscription {
        self.bus.subscribe()
    }

    pub fn bus(&self) -> &CurrencyBus {
        &self.bus
    }
}
