use crate::models::{City, SimilarityWeights};

/// Calculate the similarity score of `candidate` against `reference`
///
/// Scoring formula (default weights):
/// score = (
///     10 * same_region +               # Same administrative region
///     5 * shared_characteristics +     # Each shared trait (coastal, urban, ...)
///     3 * shared_environments +        # Each shared working environment
///     2 * similar_living_cost          # |Δ living cost| <= 200,000 KRW
/// )
///
/// The living-cost bonus compares raw monthly living costs, not budget bands:
/// two cities either side of a band edge still count as similar, and two
/// cities at opposite ends of one band do not.
pub fn calculate_similarity_score(
    candidate: &City,
    reference: &City,
    weights: &SimilarityWeights,
) -> u32 {
    let region_score = if candidate.region == reference.region {
        weights.region
    } else {
        0
    };

    let characteristic_score =
        shared_characteristics(candidate, reference).saturating_mul(weights.characteristic);
    let environment_score =
        shared_environments(candidate, reference).saturating_mul(weights.environment);

    let living_cost_score = if has_similar_living_cost(candidate, reference, weights) {
        weights.living_cost
    } else {
        0
    };

    // Weights come from configuration; clamp instead of wrapping
    region_score
        .saturating_add(characteristic_score)
        .saturating_add(environment_score)
        .saturating_add(living_cost_score)
}

#[inline]
fn shared_characteristics(candidate: &City, reference: &City) -> u32 {
    count_to_u32(
        candidate
            .characteristics
            .intersection(&reference.characteristics)
            .count(),
    )
}

#[inline]
fn shared_environments(candidate: &City, reference: &City) -> u32 {
    count_to_u32(
        candidate
            .environments
            .intersection(&reference.environments)
            .count(),
    )
}

#[inline]
fn has_similar_living_cost(candidate: &City, reference: &City, weights: &SimilarityWeights) -> bool {
    candidate
        .average_living_cost
        .abs_diff(reference.average_living_cost)
        <= weights.living_cost_tolerance
}

// Set sizes are bounded by the enum cardinality.
#[inline]
fn count_to_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Budget, CafeDensity, Characteristic, Environment, Region, Season};
    use chrono::Utc;

    fn create_test_city(
        id: &str,
        region: Region,
        characteristics: &[Characteristic],
        environments: &[Environment],
        living_cost: u32,
    ) -> City {
        City {
            id: id.to_string(),
            name: format!("City {}", id),
            region,
            description: String::new(),
            image_url: String::new(),
            average_rating: 4.0,
            review_count: 10,
            likes_count: 0,
            dislikes_count: 0,
            average_rent: 500_000,
            average_living_cost: living_cost,
            budget: Budget::From1MTo2M,
            cafe_count: 100,
            cafe_density: CafeDensity::Medium,
            internet_score: 4,
            transport_score: 3,
            tags: vec![],
            characteristics: characteristics.iter().copied().collect(),
            environments: environments.iter().copied().collect(),
            best_season: Season::Spring,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_identical_attributes_score_everything() {
        let reference = create_test_city(
            "ref",
            Region::Jeju,
            &[Characteristic::Coastal, Characteristic::Nature],
            &[Environment::NatureFriendly],
            1_200_000,
        );
        let candidate = reference.clone();

        let score = calculate_similarity_score(&candidate, &reference, &SimilarityWeights::default());
        assert_eq!(score, 10 + 5 * 2 + 3 + 2);
    }

    #[test]
    fn test_nothing_in_common_scores_zero() {
        let reference = create_test_city("ref", Region::Jeju, &[Characteristic::Coastal], &[], 1_000_000);
        let candidate = create_test_city("c", Region::Capital, &[Characteristic::Urban], &[], 2_500_000);

        let score = calculate_similarity_score(&candidate, &reference, &SimilarityWeights::default());
        assert_eq!(score, 0);
    }

    #[test]
    fn test_living_cost_tolerance_is_inclusive() {
        let reference = create_test_city("ref", Region::Jeju, &[], &[], 1_000_000);
        let at_edge = create_test_city("edge", Region::Capital, &[], &[], 1_200_000);
        let below_edge = create_test_city("below", Region::Capital, &[], &[], 800_000);
        let past_edge = create_test_city("past", Region::Capital, &[], &[], 1_200_001);

        let weights = SimilarityWeights::default();
        assert_eq!(calculate_similarity_score(&at_edge, &reference, &weights), 2);
        assert_eq!(calculate_similarity_score(&below_edge, &reference, &weights), 2);
        assert_eq!(calculate_similarity_score(&past_edge, &reference, &weights), 0);
    }

    #[test]
    fn test_budget_band_does_not_affect_score() {
        // Same band, far apart in living cost: no bonus
        let mut reference = create_test_city("ref", Region::Jeju, &[], &[], 1_000_000);
        let mut same_band = create_test_city("same", Region::Capital, &[], &[], 1_900_000);
        reference.budget = Budget::From1MTo2M;
        same_band.budget = Budget::From1MTo2M;

        // Different band, close in living cost: bonus
        let mut other_band = create_test_city("other", Region::Capital, &[], &[], 950_000);
        other_band.budget = Budget::Under1M;

        let weights = SimilarityWeights::default();
        assert_eq!(calculate_similarity_score(&same_band, &reference, &weights), 0);
        assert_eq!(calculate_similarity_score(&other_band, &reference, &weights), 2);
    }

    #[test]
    fn test_custom_weights() {
        let reference = create_test_city("ref", Region::Jeju, &[Characteristic::Coastal], &[], 1_000_000);
        let candidate = create_test_city("c", Region::Jeju, &[Characteristic::Coastal], &[], 5_000_000);

        let weights = SimilarityWeights {
            region: 1,
            characteristic: 100,
            ..SimilarityWeights::default()
        };
        assert_eq!(calculate_similarity_score(&candidate, &reference, &weights), 101);
    }

    #[test]
    fn test_oversized_weights_saturate() {
        let reference = create_test_city(
            "ref",
            Region::Jeju,
            &[Characteristic::Coastal, Characteristic::Nature],
            &[Environment::NatureFriendly],
            1_200_000,
        );
        let candidate = reference.clone();

        let weights = SimilarityWeights {
            region: u32::MAX,
            characteristic: u32::MAX,
            ..SimilarityWeights::default()
        };
        assert_eq!(calculate_similarity_score(&candidate, &reference, &weights), u32::MAX);

        // Nothing shared still scores zero
        let unrelated = create_test_city("u", Region::Capital, &[Characteristic::Urban], &[], 3_000_000);
        assert_eq!(calculate_similarity_score(&unrelated, &reference, &weights), 0);
    }
}
