// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Budget, CafeDensity, Characteristic, City, CityCounts, CityStats, Environment, PreferenceKind,
    PreferenceRecord, PreferenceState, Region, ScoredCity, Season, SimilarityWeights, UnknownVariant,
    UserId,
};
pub use requests::{CityListQuery, RelatedCitiesQuery, ToggleReactionRequest};
pub use responses::{
    CityDetailResponse, CityListResponse, ErrorResponse, HealthResponse,
    ReactionsResponse, RelatedCitiesResponse, ToggleReactionResponse,
};
