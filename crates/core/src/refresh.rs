//! Refresh: fetch both feeds, merge each catalog entry with the rate table, upsert, then
//! redraw the summary image.
//!
//! Fetching is all-or-nothing: if either feed fails nothing is written. Upserts are not
//! batched; a store failure part-way through leaves the earlier entries committed and the
//! remaining ones unattempted. The summary image is best effort and never fails a refresh.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::constants::SUMMARY_TOP_N;
use crate::country::NewCountry;
use crate::multiplier::{estimate_gdp, GdpMultiplier};
use crate::report::SummaryRenderer;
use crate::sources::{CatalogEntry, DataSources, RateTable};
use crate::store::CountryStore;
use crate::CountryResult;

/// Result of a completed refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct RefreshOutcome {
    /// Catalog entries written to the store.
    pub total_countries: usize,
    /// Catalog entries dropped because they carried no usable name.
    pub skipped: usize,
    pub last_refreshed_at: DateTime<Utc>,
    /// Where the summary image was written, or `None` if rendering failed.
    pub summary_image: Option<PathBuf>,
}

/// Turn one catalog entry into the record to upsert.
///
/// Returns `None` for entries without a non-blank name; otherwise the name is kept as
/// received. Draws one multiplier per call, whether or not a rate is found.
pub fn reconcile_entry(
    entry: &CatalogEntry,
    rates: &RateTable,
    multiplier: &mut GdpMultiplier,
) -> Option<NewCountry> {
    let name = entry.name.as_deref().filter(|n| !n.trim().is_empty())?;
    let currency_code = entry.first_currency_code().map(str::to_string);
    let exchange_rate = currency_code
        .as_deref()
        .and_then(|code| rates.get(code).copied());
    let population = entry.population.unwrap_or(0);
    let factor = multiplier.next_multiplier();

    Some(NewCountry {
        name: name.to_string(),
        capital: entry.capital.clone(),
        region: entry.region.clone(),
        population,
        currency_code,
        exchange_rate,
        estimated_gdp: Some(estimate_gdp(population, exchange_rate, factor)),
        flag_url: entry.flag.clone(),
    })
}

/// Upsert every entry in payload order. Stops at the first store error.
///
/// Returns `(upserted, skipped)`.
pub fn apply_catalog(
    store: &CountryStore,
    entries: &[CatalogEntry],
    rates: &RateTable,
    multiplier: &mut GdpMultiplier,
) -> CountryResult<(usize, usize)> {
    let mut upserted = 0;
    let mut skipped = 0;

    for (index, entry) in entries.iter().enumerate() {
        let Some(record) = reconcile_entry(entry, rates, multiplier) else {
            tracing::warn!("skipping catalog entry {} without a name", index);
            skipped += 1;
            continue;
        };

        if let Err(e) = store.upsert(&record) {
            tracing::error!(
                "upsert of '{}' failed after {} countries were written: {}",
                record.name,
                upserted,
                e
            );
            return Err(e);
        }
        upserted += 1;
    }

    Ok((upserted, skipped))
}

/// Redraw the summary image from current store contents. Errors are logged, not returned.
pub fn render_summary_best_effort(
    store: &CountryStore,
    renderer: &SummaryRenderer,
) -> Option<PathBuf> {
    let result = store
        .summary(SUMMARY_TOP_N)
        .and_then(|snapshot| renderer.render_to_cache(&snapshot));

    match result {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("failed to generate summary image: {}", e);
            None
        }
    }
}

/// Run a full refresh against the given feeds.
pub async fn refresh_countries(
    store: &CountryStore,
    sources: &dyn DataSources,
    renderer: &SummaryRenderer,
    multiplier: &mut GdpMultiplier,
) -> CountryResult<RefreshOutcome> {
    let catalog = sources.fetch_catalog().await?;
    let rates = sources.fetch_rates().await?;
    let last_refreshed_at = Utc::now();

    tracing::info!(
        "refreshing {} catalog entries against {} exchange rates",
        catalog.len(),
        rates.len()
    );

    let (total_countries, skipped) = apply_catalog(store, &catalog, &rates, multiplier)?;
    let summary_image = render_summary_best_effort(store, renderer);

    Ok(RefreshOutcome {
        total_countries,
        skipped,
        last_refreshed_at,
        summary_image,
    })
}
