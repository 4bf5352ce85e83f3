// Core algorithm exports
pub mod filters;
pub mod optimistic;
pub mod ranker;
pub mod similarity;
pub mod toggle;

pub use filters::{sort_cities, CityFilter, SortOrder};
pub use optimistic::{AttemptOutcome, OptimisticError, OptimisticReactions, PendingReaction, ReactionView, Settlement};
pub use ranker::RelatedCitiesRanker;
pub use similarity::calculate_similarity_score;
pub use toggle::{
    transition, IdentityProvider, Mutation, PreferenceStore, PreferenceToggle, StoreError, ToggleError,
    ToggleErrorKind,
};
