//! Rate provider trait and implementations.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use storefront_common::CurrencyCode;
use tracing::{debug, instrument};

use crate::error::{FxError, FxResult};
use crate::rate_table::RateTable;

/// Source of exchange rate tables.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch a fresh table of rates against `base`.
    async fn fetch_rates(&self, base: CurrencyCode) -> FxResult<RateTable>;
}

/// Connection settings for exchangerate-api.com.
#[derive(Debug, Clone)]
pub struct ApiProviderConfig {
    /// Host serving the keyless v4 endpoint.
    pub public_url: String,
    /// Host serving the keyed v6 endpoint.
    pub authenticated_url: String,
    /// API key; selects the v6 endpoint when set.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for ApiProviderConfig {
    fn default() -> Self {
        Self {
            public_url: "https://api.exchangerate-api.com".to_string(),
            authenticated_url: "https://v6.exchangerate-api.com".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Body returned by both API versions. v4 uses `rates`, v6 uses
/// `conversion_rates` and reports failures through `result`.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    rates: Option<HashMap<String, f64>>,
    #[serde(default)]
    conversion_rates: Option<HashMap<String, f64>>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
}

impl LatestRatesResponse {
    fn into_table(self, base: CurrencyCode) -> FxResult<RateTable> {
        if self.result.as_deref() == Some("error") {
            return Err(FxError::Api(
                self.error_type.unwrap_or_else(|| "unknown-error".to_string()),
            ));
        }

        let raw = self
            .conversion_rates
            .or(self.rates)
            .ok_or(FxError::EmptyRates(base))?;

        RateTable::from_api(base, &raw)
    }
}

/// Parse a latest-rates response body.
pub fn parse_latest_rates(base: CurrencyCode, body: &str) -> FxResult<RateTable> {
    let response: LatestRatesResponse = serde_json::from_str(body)?;
    response.into_table(base)
}

/// Provider backed by the exchangerate-api.com HTTP API.
pub struct ExchangeRateApiProvider {
    client: reqwest::Client,
    config: ApiProviderConfig,
}

impl ExchangeRateApiProvider {
    pub fn new(config: ApiProviderConfig) -> FxResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// URL of the latest-rates endpoint for `base`.
    pub fn endpoint(&self, base: CurrencyCode) -> String {
        match &self.config.api_key {
            Some(key) => format!(
                "{}/v6/{}/latest/{}",
                self.config.authenticated_url.trim_end_matches('/'),
                key,
                base
            ),
            None => format!(
                "{}/v4/latest/{}",
                self.config.public_url.trim_end_matches('/'),
                base
            ),
        }
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    fn name(&self) -> &str {
        "exchangerate-api"
    }

    #[instrument(skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: CurrencyCode) -> FxResult<RateTable> {
        let response = self.client.get(self.endpoint(base)).send().await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.text().await?;
                let table = parse_latest_rates(base, &body)?;
                debug!(rates = table.rates.len(), "Fetched rate table");
                Ok(table)
            }
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                Err(FxError::RateLimited(base))
            }
            status => Err(FxError::HttpStatus {
                status: status.as_u16(),
                base,
            }),
        }
    }
}

/// Mock rate provider for testing.
///
/// Holds one set of USD-based rates and derives consistent cross tables for
/// any other base.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    usd_rates: dashmap::DashMap<CurrencyCode, rust_decimal::Decimal>,
    failing: std::sync::atomic::AtomicBool,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Provider with a realistic USD-based rate set.
    pub fn new() -> Self {
        use rust_decimal::Decimal;

        let usd_rates = dashmap::DashMap::new();
        for (code, rate) in [
            (CurrencyCode::Usd, Decimal::ONE),
            (CurrencyCode::Eur, Decimal::new(92, 2)),
            (CurrencyCode::Gbp, Decimal::new(79, 2)),
            (CurrencyCode::Jpy, Decimal::new(1495, 1)),
            (CurrencyCode::Cad, Decimal::new(136, 2)),
            (CurrencyCode::Aud, Decimal::new(152, 2)),
            (CurrencyCode::Chf, Decimal::new(88, 2)),
            (CurrencyCode::Cny, Decimal::new(724, 2)),
            (CurrencyCode::Krw, Decimal::new(1350, 0)),
            (CurrencyCode::Sek, Decimal::new(1050, 2)),
        ] {
            usd_rates.insert(code, rate);
        }

        Self {
            usd_rates,
            failing: std::sync::atomic::AtomicBool::new(false),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Set how many units of `currency` one USD buys.
    pub fn set_usd_rate(&self, currency: CurrencyCode, rate: rust_decimal::Decimal) {
        self.usd_rates.insert(currency, rate);
    }

    /// Drop `currency` from every table this provider returns.
    pub fn remove_rate(&self, currency: CurrencyCode) {
        self.usd_rates.remove(&currency);
    }

    /// Make subsequent fetches fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of `fetch_rates` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Table for `base`, derived from the USD rates.
    pub fn table_for(&self, base: CurrencyCode) -> FxResult<RateTable> {
        let base_rate = self
            .usd_rates
            .get(&base)
            .map(|r| *r)
            .ok_or(FxError::EmptyRates(base))?;

        let cross = self
            .usd_rates
            .iter()
            .map(|entry| (*entry.key(), *entry.value() / base_rate))
            .collect();

        Ok(RateTable::new(base, cross))
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MockRateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_rates(&self, base: CurrencyCode) -> FxResult<RateTable> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(FxError::Api("simulated outage".to_string()));
        }

        self.table_for(base)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its base URL.
    pub(crate) async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn provider_for(url: String, api_key: Option<&str>) -> ExchangeRateApiProvider {
        ExchangeRateApiProvider::new(ApiProviderConfig {
            public_url: url.clone(),
            authenticated_url: url,
            api_key: api_key.map(str::to_string),
            request_timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_selection() {
        let keyless = ExchangeRateApiProvider::new(ApiProviderConfig::default()).unwrap();
        assert_eq!(
            keyless.endpoint(CurrencyCode::Usd),
            "https://api.exchangerate-api.com/v4/latest/USD"
        );

        let keyed = ExchangeRateApiProvider::new(ApiProviderConfig {
            api_key: Some("secret".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            keyed.endpoint(CurrencyCode::Eur),
            "https://v6.exchangerate-api.com/v6/secret/latest/EUR"
        );
    }

    #[test]
    fn test_parse_v4_and_v6_bodies() {
        let v4 = parse_latest_rates(
            CurrencyCode::Usd,
            r#"{"base":"USD","date":"2024-05-01","rates":{"USD":1,"EUR":0.93,"JPY":157.8}}"#,
        )
        .unwrap();
        assert_eq!(v4.rate(CurrencyCode::Eur), Some(dec!(0.93)));

        let v6 = parse_latest_rates(
            CurrencyCode::Usd,
            r#"{"result":"success","base_code":"USD","conversion_rates":{"USD":1,"GBP":0.8}}"#,
        )
        .unwrap();
        assert_eq!(v6.rate(CurrencyCode::Gbp), Some(dec!(0.8)));
    }

    #[test]
    fn test_parse_v6_error_body() {
        let result = parse_latest_rates(
            CurrencyCode::Usd,
            r#"{"result":"error","error-type":"invalid-key"}"#,
        );

        assert!(matches!(result, Err(FxError::Api(kind)) if kind == "invalid-key"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_latest_rates(CurrencyCode::Usd, "<html>"),
            Err(FxError::Decode(_))
        ));
        assert!(matches!(
            parse_latest_rates(CurrencyCode::Usd, "{}"),
            Err(FxError::EmptyRates(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_over_http() {
        let url = serve_once("200 OK", r#"{"rates":{"USD":1,"EUR":0.9,"SEK":10.4}}"#).await;
        let provider = provider_for(url, None);

        let table = provider.fetch_rates(CurrencyCode::Usd).await.unwrap();

        assert_eq!(table.base, CurrencyCode::Usd);
        assert_eq!(table.rate(CurrencyCode::Sek), Some(dec!(10.4)));
    }

    #[tokio::test]
    async fn test_fetch_rate_limited() {
        let url = serve_once("429 Too Many Requests", "{}").await;
        let provider = provider_for(url, Some("key"));

        let result = provider.fetch_rates(CurrencyCode::Usd).await;

        assert!(matches!(result, Err(FxError::RateLimited(CurrencyCode::Usd))));
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let url = serve_once("500 Internal Server Error", "{}").await;
        let provider = provider_for(url, None);

        let result = provider.fetch_rates(CurrencyCode::Gbp).await;

        assert!(matches!(result, Err(FxError::HttpStatus { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_mock_provider_cross_rates() {
        let provider = MockRateProvider::new();

        let eur = provider.fetch_rates(CurrencyCode::Eur).await.unwrap();

        assert_eq!(eur.rate(CurrencyCode::Eur), Some(dec!(1)));
        // 1 EUR = 1 / 0.92 USD
        let usd = eur.rate(CurrencyCode::Usd).unwrap();
        assert!((usd - dec!(1.0869565)).abs() < dec!(0.000001));
        assert_eq!(provider.calls(), 1);
    }
}
