use serde::{Deserialize, Serialize};
use crate::models::domain::{City, PreferenceRecord, PreferenceState, ScoredCity};

/// Response for the city list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityListResponse {
    pub cities: Vec<City>,
    #[serde(rename = "totalResults")]
    pub total_results: usize,
}

/// Response for the city detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityDetailResponse {
    pub city: City,
    /// Caller's current reaction; `none` for anonymous callers
    #[serde(rename = "myReaction")]
    pub my_reaction: PreferenceState,
}

/// Response for the related cities endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedCitiesResponse {
    #[serde(rename = "cityId")]
    pub city_id: String,
    pub related: Vec<ScoredCity>,
}

/// Response for the reaction toggle endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleReactionResponse {
    pub success: bool,
    #[serde(rename = "cityId")]
    pub city_id: String,
    pub state: PreferenceState,
}

/// Response listing the caller's reactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionsResponse {
    pub reactions: Vec<PreferenceRecord>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(rename = "dataSource")]
    pub data_source: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response; `error` is a snake_case code
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
