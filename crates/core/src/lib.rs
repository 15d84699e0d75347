//! # Countries Core
//!
//! Core business logic for the country mirror service.
//!
//! This crate contains the data operations behind every endpoint:
//! - A SQLite record store keyed by case-insensitive country name
//! - HTTP adapters for the country catalog and the exchange-rate table
//! - The refresh routine that merges both feeds and derives an estimated GDP
//! - The cached summary image
//!
//! **No API concerns**: HTTP routing, JSON envelopes and status codes belong in `api-rest`.

pub mod config;
pub mod constants;
pub mod country;
pub mod error;
pub mod multiplier;
pub mod refresh;
pub mod report;
pub mod service;
pub mod sources;
pub mod store;

pub use config::{CoreConfig, DatabaseLocation};
pub use country::{Country, InvalidSort, ListOptions, NewCountry, Sort, SortField, SortOrder};
pub use error::{CountryError, CountryResult};
pub use refresh::RefreshOutcome;
pub use service::{CountryService, StoreStatus};
pub use sources::{CatalogCurrency, CatalogEntry, DataSources, HttpSources, RateTable};
pub use store::CountryStore;
