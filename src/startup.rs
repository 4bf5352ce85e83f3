use crate::config::{AuthMode, AuthSettings, Settings};
use crate::core::{PreferenceStore, PreferenceToggle, RelatedCitiesRanker};
use crate::routes::AppState;
use crate::services::{
    AuthError, CityDataSource, FallbackCitySource, JwtVerifier, MemoryPreferenceStore, PostgresClient,
    StaticCities, StaticDataError, SupabaseAuthClient, TalliedCitySource, TokenResolver,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to load static city data: {0}")]
    StaticData(#[from] StaticDataError),

    #[error("Failed to set up authentication: {0}")]
    Auth(#[from] AuthError),

    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),
}

/// Build the shared handler state from settings
///
/// A configured but unreachable database is logged and replaced by the
/// static catalogue with an in-memory reaction store.
pub async fn build_state(settings: &Settings) -> Result<AppState, StartupError> {
    let fallback = match &settings.data.static_path {
        Some(path) => StaticCities::load_from(path)?,
        None => StaticCities::embedded()?,
    };

    tracing::info!("Static catalogue loaded ({} cities)", fallback.len());

    let database = match &settings.database.url {
        Some(url) => match PostgresClient::from_settings(url, &settings.database).await {
            Ok(client) => {
                tracing::info!(
                    "PostgreSQL client initialized (max: {} connections)",
                    settings.database.max_connections.unwrap_or(10)
                );
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::error!("Failed to connect to PostgreSQL ({}), serving static data", e);
                None
            }
        },
        None => {
            tracing::warn!("No database configured, serving static data");
            None
        }
    };

    let cities: Arc<dyn CityDataSource>;
    let store: Arc<dyn PreferenceStore>;
    match &database {
        Some(db) => {
            let primary: Arc<dyn CityDataSource> = db.clone();
            cities = Arc::new(FallbackCitySource::new(Some(primary), fallback));
            store = db.clone();
        }
        None => {
            // Counters move with the reactions recorded since startup
            let reactions = Arc::new(MemoryPreferenceStore::new());
            let catalogue = Arc::new(FallbackCitySource::static_only(fallback));
            cities = Arc::new(TalliedCitySource::new(catalogue, reactions.clone()));
            store = reactions;
        }
    }

    let auth = build_resolver(&settings.auth)?;

    let weights = settings.ranking.similarity_weights();
    tracing::info!("Ranker initialized with weights: {:?}", weights);

    Ok(AppState {
        cities,
        database,
        preferences: PreferenceToggle::new(store),
        auth,
        ranker: RelatedCitiesRanker::new(weights),
        default_related_limit: settings.ranking.default_limit,
        max_related_limit: settings.ranking.max_limit,
    })
}

/// Pick the token resolver for the configured auth mode
pub fn build_resolver(settings: &AuthSettings) -> Result<Arc<dyn TokenResolver>, StartupError> {
    match settings.mode {
        AuthMode::Jwt => {
            let secret = settings
                .jwt_secret
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or(StartupError::MissingSetting("auth.jwt_secret"))?;

            tracing::info!("Verifying access tokens locally");
            Ok(Arc::new(JwtVerifier::new(secret)))
        }
        AuthMode::Remote => {
            let url = settings.url.clone().ok_or(StartupError::MissingSetting("auth.url"))?;
            let anon_key = settings
                .anon_key
                .clone()
                .ok_or(StartupError::MissingSetting("auth.anon_key"))?;
            let timeout = Duration::from_secs(settings.timeout_secs.unwrap_or(30));

            tracing::info!("Resolving access tokens via {}", url);
            Ok(Arc::new(SupabaseAuthClient::new(url, anon_key, timeout)?))
        }
    }
}
