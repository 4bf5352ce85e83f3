use actix_web::{web, HttpRequest, HttpResponse, Responder};
use validator::Validate;
use crate::core::{CityFilter, IdentityProvider, PreferenceToggle, RelatedCitiesRanker};
use crate::models::{
    CityDetailResponse, CityListQuery, CityListResponse, HealthResponse, PreferenceKind, PreferenceState,
    ReactionsResponse, RelatedCitiesQuery, RelatedCitiesResponse, ToggleReactionRequest, ToggleReactionResponse,
};
use crate::routes::errors::ApiError;
use crate::services::{CityDataSource, PostgresClient, RequestIdentity, TokenResolver};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub cities: Arc<dyn CityDataSource>,
    pub database: Option<Arc<PostgresClient>>,
    pub preferences: PreferenceToggle,
    pub auth: Arc<dyn TokenResolver>,
    pub ranker: RelatedCitiesRanker,
    pub default_related_limit: u16,
    pub max_related_limit: u16,
}

impl AppState {
    fn identity(&self, req: &HttpRequest) -> RequestIdentity {
        RequestIdentity::from_request(req, self.auth.clone())
    }
}

/// Configure all city-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/cities", web::get().to(list_cities))
        .route("/cities/{id}", web::get().to(get_city))
        .route("/cities/{id}/related", web::get().to(related_cities))
        .route("/cities/{id}/stats", web::get().to(city_stats))
        .route("/cities/{id}/reaction", web::post().to(toggle_reaction))
        .route("/me/reactions", web::get().to(my_reactions));
}

type HandlerResult = Result<HttpResponse, ApiError>;

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match &state.database {
        Some(db) => db.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_source: state.cities.mode().to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// List cities endpoint
///
/// GET /api/v1/cities?budget=&region=&environment=&season=&sortBy=likes|rating|name
async fn list_cities(state: web::Data<AppState>, query: web::Query<CityListQuery>) -> HandlerResult {
    let filter = CityFilter::from_query(&query).map_err(|e| ApiError::InvalidFilter(e.to_string()))?;
    let cities = state.cities.list_cities(&filter).await?;

    tracing::debug!("Returning {} cities ({} active filters)", cities.len(), filter.active_count());

    Ok(HttpResponse::Ok().json(CityListResponse {
        total_results: cities.len(),
        cities,
    }))
}

/// City detail endpoint
///
/// GET /api/v1/cities/{id}
///
/// `myReaction` is `none` for anonymous callers and when the reaction cannot
/// be read.
async fn get_city(state: web::Data<AppState>, path: web::Path<String>, req: HttpRequest) -> HandlerResult {
    let city_id = path.into_inner();

    let city = state
        .cities
        .get_city_by_id(&city_id)
        .await?
        .ok_or_else(|| ApiError::CityNotFound(city_id.clone()))?;

    let my_reaction = match state.identity(&req).current_user().await {
        Some(user) => state
            .preferences
            .state_for(&user, &city_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to read reaction of {} on {}: {}", user, city_id, e);
                PreferenceState::None
            }),
        None => PreferenceState::None,
    };

    Ok(HttpResponse::Ok().json(CityDetailResponse { city, my_reaction }))
}

/// Related cities endpoint
///
/// GET /api/v1/cities/{id}/related?limit=4
async fn related_cities(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RelatedCitiesQuery>,
) -> HandlerResult {
    query.validate().map_err(|e| ApiError::Validation(e.to_string()))?;

    let city_id = path.into_inner();
    let limit = query
        .limit
        .unwrap_or(state.default_related_limit)
        .min(state.max_related_limit) as usize;

    let candidates = state.cities.list_all_cities().await?;

    if !candidates.iter().any(|city| city.id == city_id) {
        return Err(ApiError::CityNotFound(city_id));
    }

    let related = state.ranker.rank_scored(Some(&city_id), &candidates, limit);

    tracing::debug!(
        "Returning {} related cities for {} (from {} candidates)",
        related.len(),
        city_id,
        candidates.len()
    );

    Ok(HttpResponse::Ok().json(RelatedCitiesResponse { city_id, related }))
}

/// City stats endpoint
///
/// GET /api/v1/cities/{id}/stats
async fn city_stats(state: web::Data<AppState>, path: web::Path<String>) -> HandlerResult {
    let city_id = path.into_inner();

    match state.cities.city_stats(&city_id).await? {
        Some(stats) => Ok(HttpResponse::Ok().json(stats)),
        None => Err(ApiError::CityNotFound(city_id)),
    }
}

/// Toggle reaction endpoint
///
/// POST /api/v1/cities/{id}/reaction
///
/// Request body:
/// ```json
/// { "kind": "like|dislike" }
/// ```
async fn toggle_reaction(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ToggleReactionRequest>,
    req: HttpRequest,
) -> HandlerResult {
    body.validate().map_err(|e| ApiError::Validation(e.to_string()))?;

    let requested: PreferenceKind = body
        .kind
        .parse()
        .map_err(|e| ApiError::InvalidKind(format!("{}", e)))?;

    let city_id = path.into_inner();

    if state.cities.get_city_by_id(&city_id).await?.is_none() {
        return Err(ApiError::CityNotFound(city_id));
    }

    let identity = state.identity(&req);
    let new_state = state.preferences.toggle(&identity, &city_id, requested).await?;

    tracing::info!("Reaction on city {} is now {:?}", city_id, new_state);

    Ok(HttpResponse::Ok().json(ToggleReactionResponse {
        success: true,
        city_id,
        state: new_state,
    }))
}

/// Caller's reactions endpoint
///
/// GET /api/v1/me/reactions
///
/// Anonymous callers get an empty list.
async fn my_reactions(state: web::Data<AppState>, req: HttpRequest) -> HandlerResult {
    let reactions = match state.identity(&req).current_user().await {
        Some(user) => state.preferences.fetch_all(&user).await?,
        None => Vec::new(),
    };

    Ok(HttpResponse::Ok().json(ReactionsResponse {
        count: reactions.len(),
        reactions,
    }))
}
