use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query string accepted by the city list endpoint
///
/// Every filter accepts either the slug (`jeju`) or the Korean label
/// (`제주도`). `all`, `전체` or an empty value disable the filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CityListQuery {
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default, alias = "sort_by", rename = "sortBy")]
    pub sort_by: Option<String>,
}

/// Query string accepted by the related cities endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RelatedCitiesQuery {
    #[validate(range(max = 100))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Request to toggle the caller's reaction to a city
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ToggleReactionRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "likeType", alias = "like_type")]
    pub kind: String,
}
