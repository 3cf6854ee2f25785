//! Pricing service configuration.

use std::time::Duration;

use crate::exchange::DEFAULT_RATE_TTL;
use crate::provider::ApiProviderConfig;

/// Upper bound accepted for the rate cache TTL.
pub const MAX_RATE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// Upper bound accepted for the sweep interval.
pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
/// Upper bound accepted for the request timeout.
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Configuration for the rate provider and caches.
#[derive(Debug, Clone)]
pub struct FxConfig {
    /// Rate API connection settings.
    pub provider: ApiProviderConfig,
    /// How long a fetched rate table stays cached.
    pub rate_ttl: Duration,
    /// Interval of the background cache sweep.
    pub sweep_interval: Duration,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            provider: ApiProviderConfig::default(),
            rate_ttl: DEFAULT_RATE_TTL,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl FxConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup("EXCHANGE_RATE_API_KEY") {
            if !key.trim().is_empty() {
                config.provider.api_key = Some(key.trim().to_string());
            }
        }

        if let Some(url) = lookup("EXCHANGE_RATE_API_URL") {
            config.provider.public_url = url;
        }

        if let Some(url) = lookup("EXCHANGE_RATE_API_V6_URL") {
            config.provider.authenticated_url = url;
        }

        if let Some(secs) = lookup("RATE_CACHE_TTL_SECS").and_then(|v| v.parse().ok()) {
            config.rate_ttl = Duration::from_secs(secs);
        }

        if let Some(secs) = lookup("CACHE_SWEEP_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            config.sweep_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = lookup("RATE_REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.provider.request_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.rate_ttl.is_zero() {
            return Err("Rate cache TTL cannot be zero".to_string());
        }

        if self.sweep_interval.is_zero() {
            return Err("Cache sweep interval cannot be zero".to_string());
        }

        if self.provider.request_timeout.is_zero() {
            return Err("Rate request timeout cannot be zero".to_string());
        }

        if self.rate_ttl > MAX_RATE_TTL {
            return Err(format!(
                "Rate cache TTL cannot exceed {} seconds",
                MAX_RATE_TTL.as_secs()
            ));
        }

        if self.sweep_interval > MAX_SWEEP_INTERVAL {
            return Err(format!(
                "Cache sweep interval cannot exceed {} seconds",
                MAX_SWEEP_INTERVAL.as_secs()
            ));
        }

        if self.provider.request_timeout > MAX_REQUEST_TIMEOUT {
            return Err(format!(
                "Rate request timeout cannot exceed {} seconds",
                MAX_REQUEST_TIMEOUT.as_secs()
            ));
        }

        if self.provider.public_url.trim().is_empty()
            || self.provider.authenticated_url.trim().is_empty()
        {
            return Err("Rate API URLs cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = FxConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_ttl, Duration::from_secs(3600));
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = FxConfig::from_lookup(lookup(&[
            ("EXCHANGE_RATE_API_KEY", "abc123"),
            ("RATE_CACHE_TTL_SECS", "120"),
            ("CACHE_SWEEP_INTERVAL_SECS", "not-a-number"),
            ("RATE_REQUEST_TIMEOUT_SECS", "3"),
        ]));

        assert_eq!(config.provider.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.rate_ttl, Duration::from_secs(120));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.provider.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let config = FxConfig::from_lookup(lookup(&[("EXCHANGE_RATE_API_KEY", "  ")]));
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = FxConfig::default();
        config.rate_ttl = Duration::ZERO;
        assert!(config.validate().is_err());

        let config = FxConfig::from_lookup(lookup(&[("EXCHANGE_RATE_API_URL", "")]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_durations_rejected() {
        let max = u64::MAX.to_string();
        for var in [
            "RATE_CACHE_TTL_SECS",
            "CACHE_SWEEP_INTERVAL_SECS",
            "RATE_REQUEST_TIMEOUT_SECS",
        ] {
            let config = FxConfig::from_lookup(lookup(&[(var, max.as_str())]));
            assert!(config.validate().is_err(), "{} accepted u64::MAX", var);
        }

        let config = FxConfig::from_lookup(lookup(&[("RATE_CACHE_TTL_SECS", "604800")]));
        assert!(config.validate().is_ok());
        let config = FxConfig::from_lookup(lookup(&[("RATE_CACHE_TTL_SECS", "604801")]));
        assert!(config.validate().is_err());
    }
}
