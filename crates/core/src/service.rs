//! `CountryService`: the single entry point the REST API and the CLI call into.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{CoreConfig, DatabaseLocation};
use crate::country::{Country, ListOptions};
use crate::multiplier::GdpMultiplier;
use crate::refresh::{self, RefreshOutcome};
use crate::report::SummaryRenderer;
use crate::sources::{DataSources, HttpSources};
use crate::store::CountryStore;
use crate::CountryResult;

/// Store-wide totals reported by `/status`.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreStatus {
    pub total_countries: usize,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// Country operations over one store, one pair of feeds and one summary image.
#[derive(Clone)]
pub struct CountryService {
    store: Arc<CountryStore>,
    sources: Arc<dyn DataSources>,
    renderer: SummaryRenderer,
    multiplier_seed: Option<u64>,
}

impl CountryService {
    /// Wire a service from already-built parts.
    pub fn new(
        store: Arc<CountryStore>,
        sources: Arc<dyn DataSources>,
        renderer: SummaryRenderer,
        multiplier_seed: Option<u64>,
    ) -> Self {
        Self {
            store,
            sources,
            renderer,
            multiplier_seed,
        }
    }

    /// Open the configured store and connect the live HTTP sources.
    pub fn from_config(cfg: &CoreConfig) -> CountryResult<Self> {
        let store = match cfg.database() {
            DatabaseLocation::File(path) => {
                tracing::info!("opening country store at {}", path.display());
                CountryStore::open(path)?
            }
            DatabaseLocation::InMemory => {
                tracing::info!("opening in-memory country store");
                CountryStore::open_in_memory()?
            }
        };

        Ok(Self::new(
            Arc::new(store),
            Arc::new(HttpSources::new(cfg)?),
            SummaryRenderer::new(cfg.summary_image_path()),
            cfg.multiplier_seed(),
        ))
    }

    pub fn store(&self) -> &CountryStore {
        &self.store
    }

    pub fn list_countries(&self, options: &ListOptions) -> CountryResult<Vec<Country>> {
        self.store.list(options)
    }

    pub fn get_country(&self, name: &str) -> CountryResult<Option<Country>> {
        self.store.get_by_name(name)
    }

    /// Returns whether a record was removed.
    pub fn delete_country(&self, name: &str) -> CountryResult<bool> {
        let removed = self.store.delete_by_name(name)?;
        if removed {
            tracing::info!("deleted country '{}'", name);
        }
        Ok(removed)
    }

    pub fn status(&self) -> CountryResult<StoreStatus> {
        Ok(StoreStatus {
            total_countries: self.store.count()?,
            last_refreshed_at: self.store.last_refreshed_at()?,
        })
    }

    /// Fetch both feeds, upsert every catalog entry and redraw the summary image.
    ///
    /// Each call draws a new multiplier sequence, seeded when a seed is configured.
    pub async fn refresh(&self) -> CountryResult<RefreshOutcome> {
        let mut multiplier = GdpMultiplier::from_seed_option(self.multiplier_seed);
        let outcome = refresh::refresh_countries(
            &self.store,
            self.sources.as_ref(),
            &self.renderer,
            &mut multiplier,
        )
        .await?;

        tracing::info!(
            "refresh complete: {} countries written, {} skipped",
            outcome.total_countries,
            outcome.skipped
        );
        Ok(outcome)
    }

    /// Cached summary image bytes, `None` before the first successful render.
    pub fn summary_image(&self) -> CountryResult<Option<Vec<u8>>> {
        self.renderer.read_cached()
    }
}
