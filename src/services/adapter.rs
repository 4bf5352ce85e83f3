use crate::models::{Characteristic, City, Environment, UnknownVariant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Errors raised while converting backend rows into `City` values
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("City row has an empty id")]
    MissingId,

    #[error("City {id}: {source}")]
    UnknownValue {
        id: String,
        #[source]
        source: UnknownVariant,
    },

    #[error("City {id}: {field} out of range ({value})")]
    OutOfRange {
        id: String,
        field: &'static str,
        value: String,
    },

    #[error("Duplicate city id: {0}")]
    DuplicateId(String),
}

/// City row in backend shape (snake_case, string enums, nullable counters)
///
/// Produced by the database query (cities joined with city_stats) and by the
/// embedded fallback data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityRow {
    pub id: String,
    pub name: String,
    pub region: String,
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    pub average_rating: f64,
    pub review_count: i64,
    #[serde(default)]
    pub likes_count: Option<i64>,
    #[serde(default)]
    pub dislikes_count: Option<i64>,
    pub average_rent: i64,
    pub average_living_cost: i64,
    pub budget: String,
    pub cafe_count: i64,
    pub cafe_density: String,
    pub internet_score: i64,
    pub transport_score: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub characteristics: Vec<String>,
    #[serde(default)]
    pub environments: Vec<String>,
    pub best_season: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CityRow> for City {
    type Error = AdapterError;

    fn try_from(row: CityRow) -> Result<Self, Self::Error> {
        if row.id.trim().is_empty() {
            return Err(AdapterError::MissingId);
        }
        let id = row.id;

        if !(0.0..=5.0).contains(&row.average_rating) {
            return Err(out_of_range(&id, "average_rating", row.average_rating));
        }

        let characteristics: BTreeSet<Characteristic> = row
            .characteristics
            .iter()
            .map(|value| value.parse())
            .collect::<Result<_, _>>()
            .map_err(|source| unknown(&id, source))?;

        let environments: BTreeSet<Environment> = row
            .environments
            .iter()
            .map(|value| value.parse())
            .collect::<Result<_, _>>()
            .map_err(|source| unknown(&id, source))?;

        Ok(City {
            region: row.region.parse().map_err(|source| unknown(&id, source))?,
            budget: row.budget.parse().map_err(|source| unknown(&id, source))?,
            cafe_density: row.cafe_density.parse().map_err(|source| unknown(&id, source))?,
            best_season: row.best_season.parse().map_err(|source| unknown(&id, source))?,

            review_count: non_negative(&id, "review_count", row.review_count)?,
            likes_count: non_negative(&id, "likes_count", row.likes_count.unwrap_or(0))?,
            dislikes_count: non_negative(&id, "dislikes_count", row.dislikes_count.unwrap_or(0))?,
            average_rent: positive(&id, "average_rent", row.average_rent)?,
            average_living_cost: positive(&id, "average_living_cost", row.average_living_cost)?,
            cafe_count: non_negative(&id, "cafe_count", row.cafe_count)?,
            internet_score: score(&id, "internet_score", row.internet_score)?,
            transport_score: score(&id, "transport_score", row.transport_score)?,

            tags: dedup_preserving_order(row.tags),
            characteristics,
            environments,

            name: row.name,
            description: row.description,
            image_url: row.image_url,
            average_rating: row.average_rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
            id,
        })
    }
}

/// Convert a batch of rows
///
/// Debug builds fail on the first malformed row so bad upstream data is
/// noticed; release builds log and skip it.
pub fn adapt_cities(rows: Vec<CityRow>) -> Result<Vec<City>, AdapterError> {
    adapt_cities_with(rows, cfg!(debug_assertions))
}

/// Convert a batch of rows, failing on the first bad row when `strict`
pub fn adapt_cities_with(rows: Vec<CityRow>, strict: bool) -> Result<Vec<City>, AdapterError> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut cities = Vec::with_capacity(rows.len());

    for row in rows {
        let result = City::try_from(row).and_then(|city| {
            if seen.insert(city.id.clone()) {
                Ok(city)
            } else {
                Err(AdapterError::DuplicateId(city.id))
            }
        });

        match result {
            Ok(city) => cities.push(city),
            Err(e) if strict => return Err(e),
            Err(e) => tracing::warn!("Skipping malformed city row: {}", e),
        }
    }

    Ok(cities)
}

fn unknown(id: &str, source: UnknownVariant) -> AdapterError {
    AdapterError::UnknownValue {
        id: id.to_string(),
        source,
    }
}

fn out_of_range(id: &str, field: &'static str, value: impl ToString) -> AdapterError {
    AdapterError::OutOfRange {
        id: id.to_string(),
        field,
        value: value.to_string(),
    }
}

fn non_negative(id: &str, field: &'static str, value: i64) -> Result<u32, AdapterError> {
    u32::try_from(value).map_err(|_| out_of_range(id, field, value))
}

fn positive(id: &str, field: &'static str, value: i64) -> Result<u32, AdapterError> {
    match non_negative(id, field, value)? {
        0 => Err(out_of_range(id, field, value)),
        v => Ok(v),
    }
}

fn score(id: &str, field: &'static str, value: i64) -> Result<u8, AdapterError> {
    match u8::try_from(value) {
        Ok(v @ 1..=5) => Ok(v),
        _ => Err(out_of_range(id, field, value)),
    }
}

fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Budget, CafeDensity, Region, Season};

    fn create_test_row() -> CityRow {
        CityRow {
            id: "test-city-1".to_string(),
            name: "Test City".to_string(),
            region: "수도권".to_string(),
            description: "A test city".to_string(),
            image_url: "https://example.com/test-city.jpg".to_string(),
            average_rating: 4.5,
            review_count: 100,
            likes_count: Some(50),
            dislikes_count: Some(5),
            average_rent: 500_000,
            average_living_cost: 1_000_000,
            budget: "100~200만원".to_string(),
            cafe_count: 120,
            cafe_density: "high".to_string(),
            internet_score: 4,
            transport_score: 5,
            tags: vec!["cafe".to_string(), "nature".to_string(), "cafe".to_string()],
            characteristics: vec!["coastal".to_string(), "cultural".to_string()],
            environments: vec!["자연친화".to_string(), "카페작업".to_string()],
            best_season: "봄".to_string(),
            created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
            updated_at: "2025-01-21T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_row_converts_to_city() {
        let city = City::try_from(create_test_row()).unwrap();

        assert_eq!(city.id, "test-city-1");
        assert_eq!(city.region, Region::Capital);
        assert_eq!(city.budget, Budget::From1MTo2M);
        assert_eq!(city.cafe_density, CafeDensity::High);
        assert_eq!(city.best_season, Season::Spring);
        assert_eq!(city.likes_count, 50);
        assert_eq!(city.dislikes_count, 5);
        assert_eq!(city.image_url, "https://example.com/test-city.jpg");
        assert!(city.characteristics.contains(&Characteristic::Coastal));
        assert!(city.environments.contains(&Environment::CafeWork));
    }

    #[test]
    fn test_missing_counters_default_to_zero() {
        let mut row = create_test_row();
        row.likes_count = None;
        row.dislikes_count = None;

        let city = City::try_from(row).unwrap();
        assert_eq!(city.likes_count, 0);
        assert_eq!(city.dislikes_count, 0);
    }

    #[test]
    fn test_tags_are_deduplicated_in_order() {
        let city = City::try_from(create_test_row()).unwrap();
        assert_eq!(city.tags, vec!["cafe", "nature"]);
    }

    #[test]
    fn test_unknown_enum_value_is_rejected() {
        let mut row = create_test_row();
        row.environments.push("underwater".to_string());

        let err = City::try_from(row).unwrap_err();
        assert!(matches!(err, AdapterError::UnknownValue { ref id, .. } if id == "test-city-1"));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let mut row = create_test_row();
        row.internet_score = 6;
        assert!(matches!(
            City::try_from(row).unwrap_err(),
            AdapterError::OutOfRange { field: "internet_score", .. }
        ));

        let mut row = create_test_row();
        row.likes_count = Some(-1);
        assert!(matches!(
            City::try_from(row).unwrap_err(),
            AdapterError::OutOfRange { field: "likes_count", .. }
        ));

        let mut row = create_test_row();
        row.average_rent = 0;
        assert!(City::try_from(row).is_err());

        let mut row = create_test_row();
        row.average_rating = 5.5;
        assert!(City::try_from(row).is_err());
    }

    #[test]
    fn test_strict_batch_fails_on_bad_row() {
        let mut bad = create_test_row();
        bad.id = "bad".to_string();
        bad.region = "nowhere".to_string();

        let rows = vec![create_test_row(), bad];
        assert!(adapt_cities_with(rows, true).is_err());
    }

    #[test]
    fn test_lenient_batch_skips_bad_and_duplicate_rows() {
        let mut bad = create_test_row();
        bad.id = "bad".to_string();
        bad.budget = "free".to_string();

        let mut second = create_test_row();
        second.id = "test-city-2".to_string();

        let rows = vec![create_test_row(), bad, create_test_row(), second];
        let cities = adapt_cities_with(rows, false).unwrap();

        let ids: Vec<&str> = cities.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["test-city-1", "test-city-2"]);
    }
}
