pub mod schema;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::country::{fold_case, Country, ListOptions, NewCountry};
use crate::{CountryError, CountryResult};

const COUNTRY_COLUMNS: &str = "id, name, capital, region, population, currency_code, \
     exchange_rate, estimated_gdp, flag_url, last_refreshed_at";

/// SQLite-backed store of country records, keyed by case-insensitive name.
///
/// All access goes through one connection behind a mutex. Callers must not hold the
/// store across an `.await`; every method takes and releases the lock itself.
pub struct CountryStore {
    conn: Mutex<Connection>,
}

/// Figures read for the summary image in a single locked pass.
#[derive(Clone, Debug, PartialEq)]
pub struct SummarySnapshot {
    pub total: usize,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub top_by_gdp: Vec<Country>,
}

impl CountryStore {
    /// Open or create a store at the given path with WAL mode.
    pub fn open(path: &Path) -> CountryResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(CountryError::StorageDirCreation)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for tests and throwaway runs).
    pub fn open_in_memory() -> CountryResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> CountryResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CountryError::StoreLockPoisoned)
    }

    /// Insert a new record or overwrite the one whose name matches ignoring case.
    ///
    /// Every field is replaced, `last_refreshed_at` is stamped with the current time and
    /// the existing `id` is kept. Runs as one statement so the uniqueness check and the
    /// write cannot interleave with another writer.
    pub fn upsert(&self, record: &NewCountry) -> CountryResult<Country> {
        let now = format_timestamp(Utc::now());
        let conn = self.lock()?;
        let country = conn.query_row(
            &format!(
                "INSERT INTO countries (name_key, name, capital, region, region_key, population,
                    currency_code, currency_key, exchange_rate, estimated_gdp, flag_url,
                    last_refreshed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(name_key) DO UPDATE SET
                    name = excluded.name,
                    capital = excluded.capital,
                    region = excluded.region,
                    region_key = excluded.region_key,
                    population = excluded.population,
                    currency_code = excluded.currency_code,
                    currency_key = excluded.currency_key,
                    exchange_rate = excluded.exchange_rate,
                    estimated_gdp = excluded.estimated_gdp,
                    flag_url = excluded.flag_url,
                    last_refreshed_at = excluded.last_refreshed_at
                 RETURNING {COUNTRY_COLUMNS}"
            ),
            params![
                fold_case(&record.name),
                record.name,
                record.capital,
                record.region,
                record.region.as_deref().map(fold_case),
                i64::try_from(record.population).unwrap_or(i64::MAX),
                record.currency_code,
                record.currency_code.as_deref().map(fold_case),
                record.exchange_rate,
                record.estimated_gdp,
                record.flag_url,
                now,
            ],
            row_to_country,
        )?;
        Ok(country)
    }

    /// Case-insensitive exact lookup. `Ok(None)` when no record matches.
    pub fn get_by_name(&self, name: &str) -> CountryResult<Option<Country>> {
        let conn = self.lock()?;
        let country = conn
            .query_row(
                &format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE name_key = ?1"),
                params![fold_case(name)],
                row_to_country,
            )
            .optional()?;
        Ok(country)
    }

    /// List records matching the filters, in the requested order.
    ///
    /// Without a sort, or with a sort naming no known column, rows come back in insertion
    /// order.
    pub fn list(&self, options: &ListOptions) -> CountryResult<Vec<Country>> {
        let mut clauses = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(region) = options.region.as_deref() {
            values.push(fold_case(region));
            clauses.push(format!("region_key = ?{}", values.len()));
        }
        if let Some(currency) = options.currency_code.as_deref() {
            values.push(fold_case(currency));
            clauses.push(format!("currency_key = ?{}", values.len()));
        }

        let mut sql = format!("SELECT {COUNTRY_COLUMNS} FROM countries");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        match options.sort.and_then(|s| s.field.map(|f| (f, s.order))) {
            Some((field, order)) => {
                sql.push_str(&format!(
                    " ORDER BY {} {}, id ASC",
                    field.column(),
                    order.keyword()
                ));
            }
            None => sql.push_str(" ORDER BY id ASC"),
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let countries = stmt
            .query_map(params_from_iter(values), row_to_country)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(countries)
    }

    /// Delete the record matching `name` ignoring case. Returns whether a row was removed.
    pub fn delete_by_name(&self, name: &str) -> CountryResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM countries WHERE name_key = ?1",
            params![fold_case(name)],
        )?;
        Ok(removed > 0)
    }

    pub fn count(&self) -> CountryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Most recent `last_refreshed_at` across all rows.
    pub fn last_refreshed_at(&self) -> CountryResult<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        last_refreshed_at_locked(&conn)
    }

    /// Records with a known estimated GDP, highest first.
    pub fn top_by_estimated_gdp(&self, limit: usize) -> CountryResult<Vec<Country>> {
        let conn = self.lock()?;
        top_by_estimated_gdp_locked(&conn, limit)
    }

    /// Total, last refresh and top-N read under one lock so the figures agree.
    pub fn summary(&self, top_n: usize) -> CountryResult<SummarySnapshot> {
        let conn = self.lock()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))?;
        Ok(SummarySnapshot {
            total: total as usize,
            last_refreshed_at: last_refreshed_at_locked(&conn)?,
            top_by_gdp: top_by_estimated_gdp_locked(&conn, top_n)?,
        })
    }
}

fn last_refreshed_at_locked(conn: &Connection) -> CountryResult<Option<DateTime<Utc>>> {
    let raw: Option<String> = conn.query_row(
        "SELECT MAX(last_refreshed_at) FROM countries",
        [],
        |row| row.get(0),
    )?;
    raw.map(|s| parse_timestamp(&s).ok_or(CountryError::InvalidTimestamp(s)))
        .transpose()
}

fn top_by_estimated_gdp_locked(conn: &Connection, limit: usize) -> CountryResult<Vec<Country>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COUNTRY_COLUMNS} FROM countries
         WHERE estimated_gdp IS NOT NULL
         ORDER BY estimated_gdp DESC, id ASC
         LIMIT ?1"
    ))?;
    let countries = stmt
        .query_map(params![limit as i64], row_to_country)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(countries)
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn row_to_country(row: &Row<'_>) -> rusqlite::Result<Country> {
    let raw_ts: String = row.get(9)?;
    let last_refreshed_at = parse_timestamp(&raw_ts).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            9,
            rusqlite::types::Type::Text,
            Box::new(CountryError::InvalidTimestamp(raw_ts.clone())),
        )
    })?;
    let population: i64 = row.get(4)?;

    Ok(Country {
        id: row.get(0)?,
        name: row.get(1)?,
        capital: row.get(2)?,
        region: row.get(3)?,
        population: u64::try_from(population).unwrap_or(0),
        currency_code: row.get(5)?,
        exchange_rate: row.get(6)?,
        estimated_gdp: row.get(7)?,
        flag_url: row.get(8)?,
        last_refreshed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::{Sort, SortField, SortOrder};

    fn make_country(name: &str, region: &str, currency: &str, population: u64) -> NewCountry {
        NewCountry {
            name: name.to_string(),
            capital: Some(format!("{} City", name)),
            region: Some(region.to_string()),
            population,
            currency_code: Some(currency.to_string()),
            exchange_rate: Some(2.0),
            estimated_gdp: Some(population as f64 * 750.0),
            flag_url: Some(format!("https://flags.example/{}.svg", name.to_lowercase())),
        }
    }

    fn seeded_store() -> CountryStore {
        let store = CountryStore::open_in_memory().unwrap();
        store.upsert(&make_country("Nigeria", "Africa", "NGN", 206_139_589)).unwrap();
        store.upsert(&make_country("Ghana", "Africa", "GHS", 31_072_940)).unwrap();
        store.upsert(&make_country("France", "Europe", "EUR", 67_391_582)).unwrap();
        store.upsert(&make_country("Germany", "Europe", "EUR", 83_240_525)).unwrap();
        store
    }

    fn sorted(field: SortField, order: SortOrder) -> ListOptions {
        ListOptions {
            sort: Some(Sort {
                field: Some(field),
                order,
            }),
            ..Default::default()
        }
    }

    // ── upsert ───────────────────────────────────────────────────────

    #[test]
    fn test_upsert_inserts_new_record() {
        let store = CountryStore::open_in_memory().unwrap();
        let country = store.upsert(&make_country("Kenya", "Africa", "KES", 53_771_300)).unwrap();

        assert!(country.id > 0);
        assert_eq!(country.name, "Kenya");
        assert_eq!(country.population, 53_771_300);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_upsert_case_insensitive_name_updates_existing() {
        let store = CountryStore::open_in_memory().unwrap();
        let first = store.upsert(&make_country("Nigeria", "Africa", "NGN", 100)).unwrap();

        let mut update = make_country("NIGERIA", "Africa", "NGN", 200);
        update.capital = None;
        let second = store.upsert(&update).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(second.id, first.id);
        assert_eq!(second.name, "NIGERIA");
        assert_eq!(second.population, 200);
        assert_eq!(second.capital, None);
        assert!(second.last_refreshed_at >= first.last_refreshed_at);
    }

    #[test]
    fn test_upsert_keeps_optional_fields_null() {
        let store = CountryStore::open_in_memory().unwrap();
        let country = store
            .upsert(&NewCountry {
                name: "Antarctica".into(),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(country.population, 0);
        assert_eq!(country.currency_code, None);
        assert_eq!(country.exchange_rate, None);
        assert_eq!(country.estimated_gdp, None);
    }

    // ── get_by_name ──────────────────────────────────────────────────

    #[test]
    fn test_get_by_name_ignores_case() {
        let store = seeded_store();
        let country = store.get_by_name("gHaNa").unwrap().unwrap();
        assert_eq!(country.name, "Ghana");
    }

    #[test]
    fn test_get_by_name_missing_is_none() {
        let store = seeded_store();
        assert!(store.get_by_name("Atlantis").unwrap().is_none());
    }

    // ── list ─────────────────────────────────────────────────────────

    #[test]
    fn test_list_unsorted_is_insertion_order() {
        let store = seeded_store();
        let names: Vec<String> = store
            .list(&ListOptions::default())
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Nigeria", "Ghana", "France", "Germany"]);
    }

    #[test]
    fn test_list_population_desc_is_non_increasing() {
        let store = seeded_store();
        let countries = store
            .list(&sorted(SortField::Population, SortOrder::Desc))
            .unwrap();

        assert_eq!(countries.len(), 4);
        assert!(countries
            .windows(2)
            .all(|w| w[0].population >= w[1].population));
    }

    #[test]
    fn test_list_name_asc() {
        let store = seeded_store();
        let names: Vec<String> = store
            .list(&sorted(SortField::Name, SortOrder::Asc))
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["France", "Germany", "Ghana", "Nigeria"]);
    }

    #[test]
    fn test_list_unknown_sort_field_falls_back_to_unsorted() {
        let store = seeded_store();
        let options = ListOptions {
            sort: Some("bogus_desc".parse().unwrap()),
            ..Default::default()
        };
        let names: Vec<String> = store
            .list(&options)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Nigeria", "Ghana", "France", "Germany"]);
    }

    #[test]
    fn test_list_filters_region_and_currency_ignoring_case() {
        let store = seeded_store();

        let africa = store
            .list(&ListOptions {
                region: Some("africa".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(africa.len(), 2);

        let euro = store
            .list(&ListOptions {
                region: Some("EUROPE".into()),
                currency_code: Some("eur".into()),
                sort: Some("population_asc".parse().unwrap()),
            })
            .unwrap();
        let names: Vec<&str> = euro.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["France", "Germany"]);

        let none = store
            .list(&ListOptions {
                region: Some("Africa".into()),
                currency_code: Some("EUR".into()),
                sort: None,
            })
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_list_filters_fold_non_ascii_case() {
        let store = CountryStore::open_in_memory().unwrap();
        store.upsert(&make_country("Åland Islands", "ÉUROPE", "EUR", 29_458)).unwrap();
        store.upsert(&make_country("Norway", "Europe", "NOK", 5_379_475)).unwrap();

        let found = store
            .list(&ListOptions {
                region: Some("éurope".into()),
                ..Default::default()
            })
            .unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Åland Islands"]);

        assert!(store.get_by_name("ÅLAND ISLANDS").unwrap().is_some());
    }

    #[test]
    fn test_surrounding_whitespace_is_part_of_the_name() {
        let store = CountryStore::open_in_memory().unwrap();
        for name in ["A", " a ", "B"] {
            store.upsert(&make_country(name, "X", "XXX", 1)).unwrap();
        }

        assert_eq!(store.count().unwrap(), 3);
        assert_eq!(store.get_by_name(" A ").unwrap().unwrap().name, " a ");
        assert!(store.get_by_name("  A ").unwrap().is_none());
    }

    // ── delete / count───────────────────────────────────────────────

    #[test]
    fn test_delete_unknown_returns_false() {
        let store = seeded_store();
        assert!(!store.delete_by_name("Atlantis").unwrap());
        assert_eq!(store.count().unwrap(), 4);
    }

    #[test]
    fn test_delete_known_removes_record() {
        let store = seeded_store();
        assert!(store.delete_by_name("france").unwrap());
        assert!(store.get_by_name("France").unwrap().is_none());
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_count_tracks_distinct_names_minus_deletions() {
        let store = CountryStore::open_in_memory().unwrap();
        for name in ["Chad", "CHAD", "chad", "Peru", "Fiji", "peru"] {
            store.upsert(&make_country(name, "X", "XXX", 1)).unwrap();
        }
        assert_eq!(store.count().unwrap(), 3);

        store.delete_by_name("fiji").unwrap();
        assert_eq!(store.count().unwrap(), 2);

        store.upsert(&make_country("Fiji", "X", "XXX", 1)).unwrap();
        assert_eq!(store.count().unwrap(), 3);
    }

    // ── summary queries ──────────────────────────────────────────────

    #[test]
    fn test_last_refreshed_at_empty_is_none() {
        let store = CountryStore::open_in_memory().unwrap();
        assert_eq!(store.last_refreshed_at().unwrap(), None);
    }

    #[test]
    fn test_last_refreshed_at_is_latest_write() {
        let store = seeded_store();
        let latest = store.upsert(&make_country("Ghana", "Africa", "GHS", 1)).unwrap();
        assert_eq!(
            store.last_refreshed_at().unwrap(),
            Some(latest.last_refreshed_at)
        );
    }

    #[test]
    fn test_top_by_estimated_gdp_excludes_nulls() {
        let store = seeded_store();
        store
            .upsert(&NewCountry {
                name: "Nowhere".into(),
                population: 1_000_000_000,
                ..Default::default()
            })
            .unwrap();

        let top = store.top_by_estimated_gdp(3).unwrap();
        let names: Vec<&str> = top.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Nigeria", "Germany", "France"]);
    }

    #[test]
    fn test_summary_snapshot() {
        let store = seeded_store();
        let snapshot = store.summary(5).unwrap();
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.top_by_gdp.len(), 4);
        assert!(snapshot.last_refreshed_at.is_some());
    }

    #[test]
    fn test_open_file_store_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/dir/countries.db");
        {
            let store = CountryStore::open(&path).unwrap();
            store.upsert(&make_country("Chile", "Americas", "CLP", 19_116_209)).unwrap();
        }
        let store = CountryStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.get_by_name("chile").unwrap().is_some());
    }
}
