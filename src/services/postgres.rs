use crate::config::DatabaseSettings;
use crate::core::{PreferenceStore, StoreError};
use crate::models::{City, CityCounts, CityStats, PreferenceKind, PreferenceRecord, UserId};
use crate::services::adapter::{adapt_cities, AdapterError, CityRow};
use crate::services::source::{CityDataSource, SourceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid city row: {0}")]
    AdapterError(#[from] AdapterError),
}

impl PostgresError {
    /// True when the database could not be reached at all
    ///
    /// Query, decode and row-shape failures are not outages: the server
    /// answered, and what it answered was wrong.
    pub fn is_unavailable(&self) -> bool {
        match self {
            PostgresError::SqlxError(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            PostgresError::MigrateError(_) | PostgresError::AdapterError(_) => false,
        }
    }
}

impl From<PostgresError> for StoreError {
    fn from(value: PostgresError) -> Self {
        StoreError::Backend(Box::new(value))
    }
}

/// Reaction column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "like_type", rename_all = "lowercase")]
pub enum LikeType {
    Like,
    Dislike,
}

impl From<PreferenceKind> for LikeType {
    fn from(value: PreferenceKind) -> Self {
        match value {
            PreferenceKind::Like => LikeType::Like,
            PreferenceKind::Dislike => LikeType::Dislike,
        }
    }
}

impl From<LikeType> for PreferenceKind {
    fn from(value: LikeType) -> Self {
        match value {
            LikeType::Like => PreferenceKind::Like,
            LikeType::Dislike => PreferenceKind::Dislike,
        }
    }
}

const CITY_COLUMNS: &str = r#"
    SELECT
        c.id, c.name, c.region, c.description, c.image_url,
        c.average_rating, c.review_count,
        s.likes_count, s.dislikes_count,
        c.average_rent, c.average_living_cost, c.budget,
        c.cafe_count, c.cafe_density, c.internet_score, c.transport_score,
        c.tags, c.characteristics, c.environments, c.best_season,
        c.created_at, c.updated_at
    FROM cities c
    LEFT JOIN city_stats s ON s.city_id = c.id
"#;

/// PostgreSQL client
///
/// Serves the city catalogue (cities joined with the `city_stats` view) and
/// stores per-user reactions in `city_likes`, unique per (user, city).
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings, running migrations when enabled
    pub async fn from_settings(url: &str, settings: &DatabaseSettings) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        let client = Self::new(
            url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await?;

        if settings.run_migrations {
            client.migrate().await?;
        }

        Ok(client)
    }

    pub async fn migrate(&self) -> Result<(), PostgresError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// All cities with their like/dislike counters
    pub async fn fetch_cities(&self) -> Result<Vec<City>, PostgresError> {
        let query = format!("{} ORDER BY c.id", CITY_COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let rows = rows.iter().map(city_row).collect::<Result<Vec<_>, _>>()?;
        let cities = adapt_cities(rows)?;

        tracing::debug!("Loaded {} cities from database", cities.len());

        Ok(cities)
    }

    pub async fn fetch_city(&self, id: &str) -> Result<Option<City>, PostgresError> {
        let query = format!("{} WHERE c.id = $1", CITY_COLUMNS);
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;

        match row {
            Some(row) => Ok(Some(City::try_from(city_row(&row)?)?)),
            None => Ok(None),
        }
    }

    pub async fn fetch_city_stats(&self, id: &str) -> Result<Option<CityStats>, PostgresError> {
        let query = r#"
            SELECT city_id, likes_count, dislikes_count
            FROM city_stats
            WHERE city_id = $1
        "#;

        let row = sqlx::query(query).bind(id).fetch_optional(&self.pool).await?;

        Ok(row.map(|row| CityStats {
            city_id: row.get("city_id"),
            counts: CityCounts {
                likes_count: count(row.get("likes_count")),
                dislikes_count: count(row.get("dislikes_count")),
            },
        }))
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl CityDataSource for PostgresClient {
    async fn list_all_cities(&self) -> Result<Vec<City>, SourceError> {
        Ok(self.fetch_cities().await?)
    }

    async fn get_city_by_id(&self, id: &str) -> Result<Option<City>, SourceError> {
        Ok(self.fetch_city(id).await?)
    }

    async fn city_stats(&self, id: &str) -> Result<Option<CityStats>, SourceError> {
        Ok(self.fetch_city_stats(id).await?)
    }

    fn mode(&self) -> &'static str {
        "database"
    }
}

#[async_trait]
impl PreferenceStore for PostgresClient {
    async fn find(&self, user: &UserId, city_id: &str) -> Result<Option<PreferenceRecord>, StoreError> {
        let query = r#"
            SELECT id, user_id, city_id, like_type, created_at
            FROM city_likes
            WHERE user_id = $1 AND city_id = $2
        "#;

        let row = sqlx::query(query)
            .bind(user.as_str())
            .bind(city_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        Ok(row.as_ref().map(preference_record))
    }

    async fn insert(
        &self,
        user: &UserId,
        city_id: &str,
        kind: PreferenceKind,
    ) -> Result<PreferenceRecord, StoreError> {
        let query = r#"
            INSERT INTO city_likes (id, user_id, city_id, like_type, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, user_id, city_id, like_type, created_at
        "#;

        let result = sqlx::query(query)
            .bind(uuid::Uuid::new_v4())
            .bind(user.as_str())
            .bind(city_id)
            .bind(LikeType::from(kind))
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(preference_record(&row)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::Conflict {
                user_id: user.to_string(),
                city_id: city_id.to_string(),
            }),
            Err(e) => Err(PostgresError::from(e).into()),
        }
    }

    async fn update(&self, user: &UserId, city_id: &str, kind: PreferenceKind) -> Result<(), StoreError> {
        let query = r#"
            UPDATE city_likes
            SET like_type = $3
            WHERE user_id = $1 AND city_id = $2
        "#;

        let result = sqlx::query(query)
            .bind(user.as_str())
            .bind(city_id)
            .bind(LikeType::from(kind))
            .execute(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                user_id: user.to_string(),
                city_id: city_id.to_string(),
            });
        }

        Ok(())
    }

    async fn delete(&self, user: &UserId, city_id: &str) -> Result<(), StoreError> {
        let query = r#"
            DELETE FROM city_likes
            WHERE user_id = $1 AND city_id = $2
        "#;

        let result = sqlx::query(query)
            .bind(user.as_str())
            .bind(city_id)
            .execute(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                user_id: user.to_string(),
                city_id: city_id.to_string(),
            });
        }

        Ok(())
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<PreferenceRecord>, StoreError> {
        let query = r#"
            SELECT id, user_id, city_id, like_type, created_at
            FROM city_likes
            WHERE user_id = $1
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query)
            .bind(user.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        tracing::debug!("User {} has {} reactions", user, rows.len());

        Ok(rows.iter().map(preference_record).collect())
    }
}

fn city_row(row: &PgRow) -> Result<CityRow, sqlx::Error> {
    Ok(CityRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        region: row.try_get("region")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        average_rating: row.try_get("average_rating")?,
        review_count: i64::from(row.try_get::<i32, _>("review_count")?),
        likes_count: row.try_get("likes_count")?,
        dislikes_count: row.try_get("dislikes_count")?,
        average_rent: i64::from(row.try_get::<i32, _>("average_rent")?),
        average_living_cost: i64::from(row.try_get::<i32, _>("average_living_cost")?),
        budget: row.try_get("budget")?,
        cafe_count: i64::from(row.try_get::<i32, _>("cafe_count")?),
        cafe_density: row.try_get("cafe_density")?,
        internet_score: i64::from(row.try_get::<i32, _>("internet_score")?),
        transport_score: i64::from(row.try_get::<i32, _>("transport_score")?),
        tags: row.try_get("tags")?,
        characteristics: row.try_get("characteristics")?,
        environments: row.try_get("environments")?,
        best_season: row.try_get("best_season")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn preference_record(row: &PgRow) -> PreferenceRecord {
    PreferenceRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        city_id: row.get("city_id"),
        kind: row.get::<LikeType, _>("like_type").into(),
        created_at: row.get("created_at"),
    }
}

/// COUNT(*) columns are BIGINT
fn count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
