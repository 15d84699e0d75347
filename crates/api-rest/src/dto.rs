//! Request and response bodies of the REST API.

use chrono::{DateTime, Utc};
use countries_core::{Country, RefreshOutcome, StoreStatus};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query string of `GET /countries`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCountriesParams {
    /// Exact region, ignoring case.
    pub region: Option<String>,
    /// Exact currency code, ignoring case.
    pub currency: Option<String>,
    /// `<field>_asc` or `<field>_desc`; unknown fields are ignored.
    pub sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CountryRes {
    pub id: i64,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: u64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
}

impl From<Country> for CountryRes {
    fn from(c: Country) -> Self {
        Self {
            id: c.id,
            name: c.name,
            capital: c.capital,
            region: c.region,
            population: c.population,
            currency_code: c.currency_code,
            exchange_rate: c.exchange_rate,
            estimated_gdp: c.estimated_gdp,
            flag_url: c.flag_url,
            last_refreshed_at: c.last_refreshed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeleteCountryRes {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RefreshRes {
    pub message: String,
    pub total_countries: usize,
    pub last_refreshed_at: DateTime<Utc>,
}

impl From<RefreshOutcome> for RefreshRes {
    fn from(outcome: RefreshOutcome) -> Self {
        Self {
            message: "Countries refreshed successfully".into(),
            total_countries: outcome.total_countries,
            last_refreshed_at: outcome.last_refreshed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusRes {
    pub total_countries: usize,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl From<StoreStatus> for StatusRes {
    fn from(status: StoreStatus) -> Self {
        Self {
            total_countries: status.total_countries,
            last_refreshed_at: status.last_refreshed_at,
        }
    }
}

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}
