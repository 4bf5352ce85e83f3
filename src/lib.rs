//! Nomad Cities - city directory service for digital nomads in Korea
//!
//! Serves a catalogue of Korean cities, ranks related cities by attribute
//! similarity and records per-user like/dislike reactions.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;
pub mod startup;

// Re-export commonly used types
pub use core::{calculate_similarity_score, CityFilter, PreferenceToggle, RelatedCitiesRanker, ToggleError};
pub use models::{City, PreferenceKind, PreferenceState, ScoredCity, SimilarityWeights, UserId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let ranker = RelatedCitiesRanker::default();
        assert_eq!(ranker.weights(), &SimilarityWeights::default());
        assert!(ranker.rank(None, &[], 4).is_empty());
    }
}
