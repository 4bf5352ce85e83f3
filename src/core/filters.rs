use crate::models::{Budget, City, CityListQuery, Environment, Region, Season, UnknownVariant};
use std::cmp::Ordering;

/// Sort orders offered by the city catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most liked first
    #[default]
    Likes,
    /// Highest average rating first
    Rating,
    /// Alphabetical by name
    Name,
}

impl std::str::FromStr for SortOrder {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "likes" => Ok(SortOrder::Likes),
            "rating" => Ok(SortOrder::Rating),
            "name" => Ok(SortOrder::Name),
            _ => Err(UnknownVariant {
                kind: "SortOrder",
                value: value.to_string(),
            }),
        }
    }
}

/// Catalogue filter. `None` on a field means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityFilter {
    pub budget: Option<Budget>,
    pub region: Option<Region>,
    pub environment: Option<Environment>,
    pub season: Option<Season>,
    pub sort_by: SortOrder,
}

impl CityFilter {
    /// Build a filter from raw query parameters
    ///
    /// Unknown values are rejected rather than ignored so that a typo does
    /// not silently return the full catalogue.
    pub fn from_query(query: &CityListQuery) -> Result<Self, UnknownVariant> {
        Ok(Self {
            budget: parse_optional(query.budget.as_deref())?,
            region: parse_optional(query.region.as_deref())?,
            environment: parse_optional(query.environment.as_deref())?,
            season: parse_optional(query.season.as_deref())?,
            sort_by: parse_optional(query.sort_by.as_deref())?.unwrap_or_default(),
        })
    }

    /// Number of active (non-"any") filters, excluding the sort order
    pub fn active_count(&self) -> usize {
        [
            self.budget.is_some(),
            self.region.is_some(),
            self.environment.is_some(),
            self.season.is_some(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// Check if a city passes every active filter
    #[inline]
    pub fn matches(&self, city: &City) -> bool {
        if let Some(budget) = self.budget {
            if city.budget != budget {
                return false;
            }
        }

        if let Some(region) = self.region {
            if city.region != region {
                return false;
            }
        }

        if let Some(environment) = self.environment {
            if !city.environments.contains(&environment) {
                return false;
            }
        }

        if let Some(season) = self.season {
            if city.best_season != season {
                return false;
            }
        }

        true
    }

    /// Filter and sort a city collection
    pub fn apply(&self, cities: Vec<City>) -> Vec<City> {
        let mut filtered: Vec<City> = cities.into_iter().filter(|city| self.matches(city)).collect();
        sort_cities(&mut filtered, self.sort_by);
        filtered
    }
}

/// Sort cities in place according to `order`
pub fn sort_cities(cities: &mut [City], order: SortOrder) {
    match order {
        SortOrder::Likes => cities.sort_by(|a, b| b.likes_count.cmp(&a.likes_count)),
        SortOrder::Rating => cities.sort_by(|a, b| {
            b.average_rating
                .partial_cmp(&a.average_rating)
                .unwrap_or(Ordering::Equal)
        }),
        SortOrder::Name => cities.sort_by(|a, b| a.name.cmp(&b.name)),
    }
}

/// Treat empty, `all` and `전체` ("all") as no filter
fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, UnknownVariant>
where
    T: std::str::FromStr<Err = UnknownVariant>,
{
    match value.map(str::trim) {
        None | Some("") | Some("전체") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CafeDensity, Characteristic};
    use chrono::Utc;

    fn create_test_city(
        id: &str,
        name: &str,
        region: Region,
        budget: Budget,
        season: Season,
        likes: u32,
        rating: f64,
    ) -> City {
        City {
            id: id.to_string(),
            name: name.to_string(),
            region,
            description: String::new(),
            image_url: String::new(),
            average_rating: rating,
            review_count: 0,
            likes_count: likes,
            dislikes_count: 0,
            average_rent: 400_000,
            average_living_cost: 1_000_000,
            budget,
            cafe_count: 10,
            cafe_density: CafeDensity::Low,
            internet_score: 3,
            transport_score: 3,
            tags: vec![],
            characteristics: [Characteristic::Coastal].into_iter().collect(),
            environments: [Environment::CafeWork].into_iter().collect(),
            best_season: season,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn create_cities() -> Vec<City> {
        vec![
            create_test_city("1", "Jeju", Region::Jeju, Budget::From1MTo2M, Season::Spring, 95, 4.5),
            create_test_city("2", "Gangneung", Region::Gangwon, Budget::Under1M, Season::Summer, 78, 4.3),
            create_test_city("3", "Busan", Region::Gyeongsang, Budget::From1MTo2M, Season::Autumn, 165, 4.6),
        ]
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = CityFilter::default();
        let result = filter.apply(create_cities());

        assert_eq!(result.len(), 3);
        assert_eq!(filter.active_count(), 0);
        // Default sort is by likes, descending
        assert_eq!(result[0].id, "3");
        assert_eq!(result[2].id, "2");
    }

    #[test]
    fn test_budget_and_region_filters() {
        let filter = CityFilter {
            budget: Some(Budget::From1MTo2M),
            region: Some(Region::Jeju),
            ..CityFilter::default()
        };

        let result = filter.apply(create_cities());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "1");
        assert_eq!(filter.active_count(), 2);
    }

    #[test]
    fn test_environment_filter_checks_membership() {
        let filter = CityFilter {
            environment: Some(Environment::CoworkingRequired),
            ..CityFilter::default()
        };
        assert!(filter.apply(create_cities()).is_empty());
    }

    #[test]
    fn test_from_query_accepts_labels_and_all() {
        let query = CityListQuery {
            budget: Some("전체".to_string()),
            region: Some("강원도".to_string()),
            environment: Some("all".to_string()),
            season: Some("summer".to_string()),
            sort_by: Some("name".to_string()),
        };

        let filter = CityFilter::from_query(&query).unwrap();
        assert_eq!(filter.budget, None);
        assert_eq!(filter.region, Some(Region::Gangwon));
        assert_eq!(filter.environment, None);
        assert_eq!(filter.season, Some(Season::Summer));
        assert_eq!(filter.sort_by, SortOrder::Name);
    }

    #[test]
    fn test_from_query_rejects_unknown_values() {
        let query = CityListQuery {
            region: Some("mars".to_string()),
            ..CityListQuery::default()
        };
        assert!(CityFilter::from_query(&query).is_err());
    }

    #[test]
    fn test_sort_orders() {
        let mut cities = create_cities();

        sort_cities(&mut cities, SortOrder::Rating);
        assert_eq!(cities[0].id, "3");

        sort_cities(&mut cities, SortOrder::Name);
        let names: Vec<&str> = cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Busan", "Gangneung", "Jeju"]);
    }
}
