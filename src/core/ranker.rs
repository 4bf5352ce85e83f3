use crate::core::similarity::calculate_similarity_score;
use crate::models::{City, ScoredCity, SimilarityWeights};
use std::cmp::Ordering;

/// Related-cities ranker
///
/// Scores every candidate against a reference city and returns the best
/// `limit` of them, highest score first. Equal scores are ordered by
/// average rating (descending); anything still tied keeps its input order.
///
/// Ranking is a pure function of its inputs. Invalid input (unknown or empty
/// reference id, zero limit) yields an empty result rather than an error.
#[derive(Debug, Clone, Default)]
pub struct RelatedCitiesRanker {
    weights: SimilarityWeights,
}

impl RelatedCitiesRanker {
    pub fn new(weights: SimilarityWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &SimilarityWeights {
        &self.weights
    }

    /// Rank `candidates` against the city identified by `reference_id`
    ///
    /// The reference city itself is never part of the result.
    pub fn rank(&self, reference_id: Option<&str>, candidates: &[City], limit: usize) -> Vec<City> {
        self.rank_scored(reference_id, candidates, limit)
            .into_iter()
            .map(|scored| scored.city)
            .collect()
    }

    /// Same as [`rank`](Self::rank) but keeps the computed score
    pub fn rank_scored(
        &self,
        reference_id: Option<&str>,
        candidates: &[City],
        limit: usize,
    ) -> Vec<ScoredCity> {
        let Some(reference_id) = reference_id.filter(|id| !id.is_empty()) else {
            return Vec::new();
        };
        if limit == 0 {
            return Vec::new();
        }

        let Some(reference) = candidates.iter().find(|city| city.id == reference_id) else {
            tracing::debug!("Reference city {} not found among {} candidates", reference_id, candidates.len());
            return Vec::new();
        };

        let mut scored: Vec<ScoredCity> = candidates
            .iter()
            .filter(|city| city.id != reference.id)
            .map(|city| ScoredCity {
                score: calculate_similarity_score(city, reference, &self.weights),
                city: city.clone(),
            })
            .collect();

        // Stable sort: score (descending), then rating (descending)
        scored.sort_by(|a, b| {
            b.score.cmp(&a.score).then_with(|| {
                b.city
                    .average_rating
                    .partial_cmp(&a.city.average_rating)
                    .unwrap_or(Ordering::Equal)
            })
        });

        scored.truncate(limit);
        scored
    }
}
