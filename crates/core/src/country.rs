//! Country records and the listing options used to query them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A stored country record.
///
/// `name` is unique ignoring case; `id` is assigned on first insert and survives updates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Country {
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

/// Field values written by an upsert. The store assigns `id` and stamps `last_refreshed_at`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewCountry {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: u64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
}

/// Unicode lower-casing shared by name identity and the region and currency filters.
///
/// Only case is folded; surrounding whitespace is significant.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// Columns a listing may be ordered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
    Capital,
    Region,
    Population,
    CurrencyCode,
    ExchangeRate,
    EstimatedGdp,
    FlagUrl,
    LastRefreshedAt,
}

impl SortField {
    pub(crate) fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Capital => "capital",
            SortField::Region => "region",
            SortField::Population => "population",
            SortField::CurrencyCode => "currency_code",
            SortField::ExchangeRate => "exchange_rate",
            SortField::EstimatedGdp => "estimated_gdp",
            SortField::FlagUrl => "flag_url",
            SortField::LastRefreshedAt => "last_refreshed_at",
        }
    }
}

impl FromStr for SortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "id" => SortField::Id,
            "name" => SortField::Name,
            "capital" => SortField::Capital,
            "region" => SortField::Region,
            "population" => SortField::Population,
            "currency_code" => SortField::CurrencyCode,
            "exchange_rate" => SortField::ExchangeRate,
            "estimated_gdp" | "gdp" => SortField::EstimatedGdp,
            "flag_url" => SortField::FlagUrl,
            "last_refreshed_at" => SortField::LastRefreshedAt,
            _ => return Err(()),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A parsed `<field>_asc` / `<field>_desc` sort expression.
///
/// `field` is `None` when the expression is well-formed but names no known column;
/// such a sort is ignored rather than rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sort {
    pub field: Option<SortField>,
    pub order: SortOrder,
}

/// The sort expression lacks an `_asc` / `_desc` suffix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("must end with _asc or _desc")]
pub struct InvalidSort;

impl FromStr for Sort {
    type Err = InvalidSort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, order) = if let Some(field) = s.strip_suffix("_desc") {
            (field, SortOrder::Desc)
        } else if let Some(field) = s.strip_suffix("_asc") {
            (field, SortOrder::Asc)
        } else {
            return Err(InvalidSort);
        };

        Ok(Sort {
            field: field.parse().ok(),
            order,
        })
    }
}

/// Filters and ordering for [`crate::store::CountryStore::list`].
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    pub region: Option<String>,
    pub currency_code: Option<String>,
    pub sort: Option<Sort>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parses_known_fields() {
        assert_eq!(
            "population_desc".parse::<Sort>().unwrap(),
            Sort {
                field: Some(SortField::Population),
                order: SortOrder::Desc
            }
        );
        assert_eq!(
            "currency_code_asc".parse::<Sort>().unwrap(),
            Sort {
                field: Some(SortField::CurrencyCode),
                order: SortOrder::Asc
            }
        );
    }

    #[test]
    fn test_sort_gdp_alias() {
        let sort: Sort = "gdp_desc".parse().unwrap();
        assert_eq!(sort.field, Some(SortField::EstimatedGdp));
    }

    #[test]
    fn test_sort_unknown_field_is_ignored_not_rejected() {
        let sort: Sort = "bogus_desc".parse().unwrap();
        assert_eq!(sort.field, None);
        assert_eq!(sort.order, SortOrder::Desc);
    }

    #[test]
    fn test_sort_requires_direction_suffix() {
        assert_eq!("population".parse::<Sort>(), Err(InvalidSort));
        assert_eq!("population_up".parse::<Sort>(), Err(InvalidSort));
    }

    #[test]
    fn test_fold_case_is_unicode_aware_and_keeps_whitespace() {
        assert_eq!(fold_case("CÔTE D'IVOIRE"), "côte d'ivoire");
        assert_eq!(fold_case("ÅLAND"), fold_case("åland"));
        assert_eq!(fold_case(" A "), " a ");
        assert_ne!(fold_case(" a "), fold_case("a"));
    }
}
