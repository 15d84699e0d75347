//! External data sources: the country catalog and the USD exchange-rate table.
//!
//! Both are fetched over HTTP with a fixed per-request timeout. Any failure (transport
//! error, timeout, non-2xx status, undecodable body) becomes
//! [`CountryError::SourceUnavailable`]; there are no retries.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::CoreConfig;
use crate::{CountryError, CountryResult};

/// One country descriptor from the catalog payload.
///
/// Every field is optional on the wire; the reconciler decides what to do with gaps.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub currencies: Option<Vec<CatalogCurrency>>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CatalogCurrency {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl CatalogEntry {
    /// Code of the first listed currency, if any.
    pub fn first_currency_code(&self) -> Option<&str> {
        self.currencies
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.code.as_deref())
    }
}

/// Currency code → units per USD.
pub type RateTable = HashMap<String, f64>;

#[derive(Debug, Deserialize)]
struct RatesPayload {
    #[serde(default)]
    rates: RateTable,
}

/// The pair of upstream feeds a refresh reads from.
#[async_trait]
pub trait DataSources: Send + Sync {
    async fn fetch_catalog(&self) -> CountryResult<Vec<CatalogEntry>>;

    async fn fetch_rates(&self) -> CountryResult<RateTable>;
}

/// Live HTTP sources.
#[derive(Clone, Debug)]
pub struct HttpSources {
    client: reqwest::Client,
    countries_url: String,
    rates_url: String,
}

impl HttpSources {
    /// Build the client with the configured per-request timeout.
    pub fn new(cfg: &CoreConfig) -> CountryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.fetch_timeout())
            .build()
            .map_err(CountryError::HttpClient)?;

        Ok(Self {
            client,
            countries_url: cfg.countries_api_url().to_string(),
            rates_url: cfg.exchange_api_url().to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        source_name: &str,
        url: &str,
    ) -> CountryResult<T> {
        let unavailable = |e: reqwest::Error| CountryError::SourceUnavailable {
            source_name: source_name.to_string(),
            cause: e.to_string(),
        };

        tracing::debug!("fetching {} from {}", source_name, url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(unavailable)?;

        response.json::<T>().await.map_err(unavailable)
    }
}

#[async_trait]
impl DataSources for HttpSources {
    async fn fetch_catalog(&self) -> CountryResult<Vec<CatalogEntry>> {
        self.get_json("countries", &self.countries_url).await
    }

    async fn fetch_rates(&self) -> CountryResult<RateTable> {
        let payload: RatesPayload = self.get_json("exchange rates", &self.rates_url).await?;
        Ok(payload.rates)
    }
}
