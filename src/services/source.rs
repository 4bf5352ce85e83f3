use crate::core::CityFilter;
use crate::models::{City, CityCounts, CityStats};
use crate::services::memory::MemoryPreferenceStore;
use crate::services::postgres::PostgresError;
use crate::services::static_data::StaticCities;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] PostgresError),
}

impl SourceError {
    /// The backing store is down, as opposed to answering with bad data
    pub fn is_unavailable(&self) -> bool {
        match self {
            SourceError::Database(err) => err.is_unavailable(),
        }
    }
}

/// Read access to the city catalogue
#[async_trait]
pub trait CityDataSource: Send + Sync {
    async fn list_all_cities(&self) -> Result<Vec<City>, SourceError>;

    async fn get_city_by_id(&self, id: &str) -> Result<Option<City>, SourceError>;

    /// Like/dislike counters for one city
    async fn city_stats(&self, id: &str) -> Result<Option<CityStats>, SourceError> {
        Ok(self.get_city_by_id(id).await?.map(|city| CityStats {
            city_id: city.id,
            counts: CityCounts {
                likes_count: city.likes_count,
                dislikes_count: city.dislikes_count,
            },
        }))
    }

    /// Filtered and sorted catalogue
    async fn list_cities(&self, filter: &CityFilter) -> Result<Vec<City>, SourceError> {
        let cities = self.list_all_cities().await?;
        Ok(filter.apply(cities))
    }

    /// Short label reported by the health endpoint
    fn mode(&self) -> &'static str;
}

#[async_trait]
impl CityDataSource for StaticCities {
    async fn list_all_cities(&self) -> Result<Vec<City>, SourceError> {
        Ok(self.all().to_vec())
    }

    async fn get_city_by_id(&self, id: &str) -> Result<Option<City>, SourceError> {
        Ok(self.get(id).cloned())
    }

    fn mode(&self) -> &'static str {
        "static"
    }
}

/// Database-backed source that falls back to the static catalogue
///
/// With no primary configured every call is served from the static set.
/// When the primary is unreachable the call is logged and answered from the
/// static set. Any other primary error is returned as is, so malformed
/// upstream rows surface instead of being swapped for different data.
pub struct FallbackCitySource {
    primary: Option<Arc<dyn CityDataSource>>,
    fallback: StaticCities,
}

impl FallbackCitySource {
    pub fn new(primary: Option<Arc<dyn CityDataSource>>, fallback: StaticCities) -> Self {
        Self { primary, fallback }
    }

    pub fn static_only(fallback: StaticCities) -> Self {
        Self::new(None, fallback)
    }
}

fn fall_back_on(err: SourceError, what: &str) -> Result<(), SourceError> {
    if err.is_unavailable() {
        tracing::warn!("{} from database failed, using static data: {}", what, err);
        Ok(())
    } else {
        Err(err)
    }
}

#[async_trait]
impl CityDataSource for FallbackCitySource {
    async fn list_all_cities(&self) -> Result<Vec<City>, SourceError> {
        if let Some(primary) = &self.primary {
            match primary.list_all_cities().await {
                Ok(cities) => return Ok(cities),
                Err(e) => fall_back_on(e, "Listing cities")?,
            }
        }
        self.fallback.list_all_cities().await
    }

    async fn get_city_by_id(&self, id: &str) -> Result<Option<City>, SourceError> {
        if let Some(primary) = &self.primary {
            match primary.get_city_by_id(id).await {
                Ok(city) => return Ok(city),
                Err(e) => fall_back_on(e, &format!("Loading city {}", id))?,
            }
        }
        self.fallback.get_city_by_id(id).await
    }

    async fn city_stats(&self, id: &str) -> Result<Option<CityStats>, SourceError> {
        if let Some(primary) = &self.primary {
            match primary.city_stats(id).await {
                Ok(stats) => return Ok(stats),
                Err(e) => fall_back_on(e, &format!("Loading stats for city {}", id))?,
            }
        }
        self.fallback.city_stats(id).await
    }

    fn mode(&self) -> &'static str {
        match &self.primary {
            Some(primary) => primary.mode(),
            None => self.fallback.mode(),
        }
    }
}

/// Adds reactions held in memory to the counters of another source
///
/// Used when there is no database: the catalogue's counters are a fixed
/// baseline and every toggle since startup lives in the memory store.
pub struct TalliedCitySource {
    inner: Arc<dyn CityDataSource>,
    reactions: Arc<MemoryPreferenceStore>,
}

impl TalliedCitySource {
    pub fn new(inner: Arc<dyn CityDataSource>, reactions: Arc<MemoryPreferenceStore>) -> Self {
        Self { inner, reactions }
    }
}

fn with_tally(mut city: City, tally: CityCounts) -> City {
    city.likes_count = city.likes_count.saturating_add(tally.likes_count);
    city.dislikes_count = city.dislikes_count.saturating_add(tally.dislikes_count);
    city
}

#[async_trait]
impl CityDataSource for TalliedCitySource {
    async fn list_all_cities(&self) -> Result<Vec<City>, SourceError> {
        let cities = self.inner.list_all_cities().await?;
        let tallies = self.reactions.tallies().await;

        Ok(cities
            .into_iter()
            .map(|city| match tallies.get(&city.id) {
                Some(tally) => with_tally(city, *tally),
                None => city,
            })
            .collect())
    }

    async fn get_city_by_id(&self, id: &str) -> Result<Option<City>, SourceError> {
        match self.inner.get_city_by_id(id).await? {
            Some(city) => Ok(Some(with_tally(city, self.reactions.counts_for(id).await))),
            None => Ok(None),
        }
    }

    async fn city_stats(&self, id: &str) -> Result<Option<CityStats>, SourceError> {
        match self.inner.city_stats(id).await? {
            Some(mut stats) => {
                stats.counts = stats.counts.saturating_add(self.reactions.counts_for(id).await);
                Ok(Some(stats))
            }
            None => Ok(None),
        }
    }

    fn mode(&self) -> &'static str {
        self.inner.mode()
    }
}
