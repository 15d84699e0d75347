//! Constants used throughout the countries core crate.
//!
//! Defaults for the external sources, the cache location of the summary image and the
//! bounds of the synthetic GDP multiplier live here so the config layer, the renderer and
//! the reconciler agree on them.

/// Default country catalog endpoint (restcountries v2, trimmed to the fields we store).
pub const DEFAULT_COUNTRIES_API_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";

/// Default exchange-rate endpoint; rates are relative to USD.
pub const DEFAULT_EXCHANGE_API_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Per-source fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// Default directory for the rendered summary image.
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Filename of the rendered summary image inside the cache directory.
pub const SUMMARY_IMAGE_FILENAME: &str = "summary.png";

/// Database name used when neither `DATABASE_URL` nor `DB_NAME` is set.
pub const DEFAULT_DB_NAME: &str = "countries";

/// Lower bound (inclusive) of the estimated GDP multiplier.
pub const GDP_MULTIPLIER_MIN: f64 = 1000.0;

/// Upper bound (inclusive) of the estimated GDP multiplier.
pub const GDP_MULTIPLIER_MAX: f64 = 2000.0;

/// Number of countries listed in the summary image.
pub const SUMMARY_TOP_N: usize = 5;
