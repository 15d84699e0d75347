use rusqlite::Connection;

use crate::CountryResult;

/// Create the countries table if it does not exist.
///
/// `name_key` holds the lower-cased name; its UNIQUE index is what makes name identity
/// case-insensitive. `region_key` and `currency_key` are folded the same way for filtering.
pub fn initialize(conn: &Connection) -> CountryResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS countries (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            name_key          TEXT NOT NULL UNIQUE,
            name              TEXT NOT NULL,
            capital           TEXT,
            region            TEXT,
            region_key        TEXT,
            population        INTEGER NOT NULL DEFAULT 0 CHECK (population >= 0),
            currency_code     TEXT,
            currency_key      TEXT,
            exchange_rate     REAL,
            estimated_gdp     REAL,
            flag_url          TEXT,
            last_refreshed_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_countries_region ON countries(region_key);
        CREATE INDEX IF NOT EXISTS idx_countries_currency ON countries(currency_key);
        CREATE INDEX IF NOT EXISTS idx_countries_gdp ON countries(estimated_gdp);
        ",
    )?;
    Ok(())
}
