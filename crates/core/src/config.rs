//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the core services.
//! Nothing in this crate reads process-wide environment variables during request handling;
//! binaries hand a lookup closure (usually `|key| std::env::var(key).ok()`) to
//! [`CoreConfig::from_lookup`].

use crate::constants::{
    DEFAULT_CACHE_DIR, DEFAULT_COUNTRIES_API_URL, DEFAULT_DB_NAME, DEFAULT_EXCHANGE_API_URL,
    DEFAULT_FETCH_TIMEOUT_SECS, SUMMARY_IMAGE_FILENAME,
};
use crate::{CountryError, CountryResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the record store lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    InMemory,
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database: DatabaseLocation,
    countries_api_url: String,
    exchange_api_url: String,
    fetch_timeout: Duration,
    cache_dir: PathBuf,
    multiplier_seed: Option<u64>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        database: DatabaseLocation,
        countries_api_url: String,
        exchange_api_url: String,
        fetch_timeout: Duration,
        cache_dir: PathBuf,
        multiplier_seed: Option<u64>,
    ) -> CountryResult<Self> {
        if countries_api_url.trim().is_empty() {
            return Err(CountryError::InvalidConfig(
                "countries API URL cannot be empty".into(),
            ));
        }
        if exchange_api_url.trim().is_empty() {
            return Err(CountryError::InvalidConfig(
                "exchange API URL cannot be empty".into(),
            ));
        }
        if fetch_timeout.is_zero() {
            return Err(CountryError::InvalidConfig(
                "fetch timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            database,
            countries_api_url,
            exchange_api_url,
            fetch_timeout,
            cache_dir,
            multiplier_seed,
        })
    }

    /// Resolve the configuration from a key lookup.
    ///
    /// Recognised keys: `DATABASE_URL`, `DB_DIR`, `DB_NAME`, `COUNTRIES_API_URL`,
    /// `EXCHANGE_API_URL`, `FETCH_TIMEOUT_SECS`, `CACHE_DIR`, `GDP_MULTIPLIER_SEED`.
    /// Missing or blank values fall back to the defaults in [`crate::constants`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CountryResult<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        for ignored in ["DB_HOST", "DB_PORT", "DB_USER", "DB_PASSWORD"] {
            if get(ignored).is_some() {
                tracing::warn!("{} is set but ignored: the record store is embedded", ignored);
            }
        }

        let database = database_location_from_env_values(
            get("DATABASE_URL"),
            get("DB_DIR"),
            get("DB_NAME"),
        )?;

        Self::new(
            database,
            get("COUNTRIES_API_URL").unwrap_or_else(|| DEFAULT_COUNTRIES_API_URL.into()),
            get("EXCHANGE_API_URL").unwrap_or_else(|| DEFAULT_EXCHANGE_API_URL.into()),
            fetch_timeout_from_env_value(get("FETCH_TIMEOUT_SECS"))?,
            get("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
            multiplier_seed_from_env_value(get("GDP_MULTIPLIER_SEED"))?,
        )
    }

    pub fn database(&self) -> &DatabaseLocation {
        &self.database
    }

    pub fn countries_api_url(&self) -> &str {
        &self.countries_api_url
    }

    pub fn exchange_api_url(&self) -> &str {
        &self.exchange_api_url
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Fixed path of the rendered summary image.
    pub fn summary_image_path(&self) -> PathBuf {
        self.cache_dir.join(SUMMARY_IMAGE_FILENAME)
    }

    pub fn multiplier_seed(&self) -> Option<u64> {
        self.multiplier_seed
    }
}

/// Resolve the database location.
///
/// `database_url` wins when present and accepts `sqlite::memory:`, `sqlite://<path>`,
/// `sqlite:<path>` or a bare path. Otherwise the store is `<db_dir>/<db_name>.db`.
pub fn database_location_from_env_values(
    database_url: Option<String>,
    db_dir: Option<String>,
    db_name: Option<String>,
) -> CountryResult<DatabaseLocation> {
    if let Some(url) = database_url {
        if url == "sqlite::memory:" || url == ":memory:" {
            return Ok(DatabaseLocation::InMemory);
        }
        if let Some((scheme, _)) = url.split_once("://") {
            if scheme != "sqlite" {
                return Err(CountryError::InvalidConfig(format!(
                    "unsupported DATABASE_URL scheme '{}' (expected sqlite)",
                    scheme
                )));
            }
        }
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(&url);
        if path.is_empty() {
            return Err(CountryError::InvalidConfig(
                "DATABASE_URL does not name a database file".into(),
            ));
        }
        return Ok(DatabaseLocation::File(PathBuf::from(path)));
    }

    let name = db_name.unwrap_or_else(|| DEFAULT_DB_NAME.into());
    if name.contains('/') || name.contains('\\') {
        return Err(CountryError::InvalidConfig(
            "DB_NAME must not contain path separators".into(),
        ));
    }
    let dir = db_dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    Ok(DatabaseLocation::File(dir.join(format!("{}.db", name))))
}

/// Parse the per-source fetch timeout; `None` yields the default.
pub fn fetch_timeout_from_env_value(value: Option<String>) -> CountryResult<Duration> {
    match value {
        None => Ok(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS)),
        Some(v) => v
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| CountryError::InvalidConfig(format!("invalid FETCH_TIMEOUT_SECS: {}", v))),
    }
}

pub fn multiplier_seed_from_env_value(value: Option<String>) -> CountryResult<Option<u64>> {
    value
        .map(|v| {
            v.parse::<u64>().map_err(|_| {
                CountryError::InvalidConfig(format!("invalid GDP_MULTIPLIER_SEED: {}", v))
            })
        })
        .transpose()
}
