use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Raised when a string does not name any variant of a catalogue enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a catalogue enum with a stable slug (used on the wire) and the
/// Korean label stored by the backend. Parsing accepts either form.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => ($slug:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $slug)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn slug(self) -> &'static str {
                match self {
                    $($name::$variant => $slug,)+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let value = value.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.slug().eq_ignore_ascii_case(value) || v.label() == value)
                    .ok_or_else(|| UnknownVariant {
                        kind: stringify!($name),
                        value: value.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.slug())
            }
        }
    };
}

labelled_enum! {
    /// Administrative region a city belongs to
    Region {
        Capital => ("capital", "수도권"),
        Gangwon => ("gangwon", "강원도"),
        Chungcheong => ("chungcheong", "충청도"),
        Jeolla => ("jeolla", "전라도"),
        Gyeongsang => ("gyeongsang", "경상도"),
        Jeju => ("jeju", "제주도"),
    }
}

labelled_enum! {
    /// Monthly budget band
    Budget {
        Under1M => ("under-1m", "100만원 미만"),
        From1MTo2M => ("1m-2m", "100~200만원"),
        Over2M => ("over-2m", "200만원 이상"),
    }
}

labelled_enum! {
    CafeDensity {
        Low => ("low", "낮음"),
        Medium => ("medium", "보통"),
        High => ("high", "높음"),
    }
}

labelled_enum! {
    /// Geographic or cultural trait of a city
    Characteristic {
        Coastal => ("coastal", "해안"),
        Mountain => ("mountain", "산악"),
        Urban => ("urban", "대도시"),
        Cultural => ("cultural", "문화"),
        Nature => ("nature", "자연"),
    }
}

labelled_enum! {
    /// Working environment a city suits
    Environment {
        NatureFriendly => ("nature-friendly", "자연친화"),
        UrbanPreferred => ("urban-preferred", "도심선호"),
        CafeWork => ("cafe-work", "카페작업"),
        CoworkingRequired => ("coworking-required", "코워킹 필수"),
    }
}

labelled_enum! {
    Season {
        Spring => ("spring", "봄"),
        Summer => ("summer", "여름"),
        Autumn => ("autumn", "가을"),
        Winter => ("winter", "겨울"),
    }
}

/// A reviewable city in the catalogue
///
/// Values are produced by the adapter (backend rows or the embedded data set)
/// and are never mutated afterwards. Like/dislike counts change only in the
/// backing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: String,
    pub name: String,
    pub region: Region,
    pub description: String,
    pub image_url: String,

    pub average_rating: f64,
    pub review_count: u32,
    pub likes_count: u32,
    pub dislikes_count: u32,

    pub average_rent: u32,
    pub average_living_cost: u32,
    pub budget: Budget,

    pub cafe_count: u32,
    pub cafe_density: CafeDensity,
    pub internet_score: u8,
    pub transport_score: u8,

    pub tags: Vec<String>,
    pub characteristics: BTreeSet<Characteristic>,
    pub environments: BTreeSet<Environment>,
    pub best_season: Season,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A city together with its similarity score against a reference city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCity {
    #[serde(flatten)]
    pub city: City,
    #[serde(rename = "similarityScore")]
    pub score: u32,
}

/// Aggregated reaction counts for a single city
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityCounts {
    pub likes_count: u32,
    pub dislikes_count: u32,
}

impl CityCounts {
    pub fn saturating_add(self, other: CityCounts) -> CityCounts {
        CityCounts {
            likes_count: self.likes_count.saturating_add(other.likes_count),
            dislikes_count: self.dislikes_count.saturating_add(other.dislikes_count),
        }
    }

    /// Record one reaction of `kind`
    pub fn record(&mut self, kind: PreferenceKind) {
        match kind {
            PreferenceKind::Like => self.likes_count = self.likes_count.saturating_add(1),
            PreferenceKind::Dislike => self.dislikes_count = self.dislikes_count.saturating_add(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityStats {
    pub city_id: String,
    #[serde(flatten)]
    pub counts: CityCounts,
}

/// Authenticated user identity. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UserId(String);

impl UserId {
    /// Returns `None` for empty or whitespace-only identities
    pub fn parse(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The reaction a user can register for a city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceKind {
    Like,
    Dislike,
}

impl PreferenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKind::Like => "like",
            PreferenceKind::Dislike => "dislike",
        }
    }
}

impl std::str::FromStr for PreferenceKind {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "like" => Ok(PreferenceKind::Like),
            "dislike" => Ok(PreferenceKind::Dislike),
            _ => Err(UnknownVariant {
                kind: "PreferenceKind",
                value: value.to_string(),
            }),
        }
    }
}

/// Per-(user, city) preference state. `None` means no record exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceState {
    #[default]
    None,
    Liked,
    Disliked,
}

impl PreferenceState {
    pub fn kind(self) -> Option<PreferenceKind> {
        match self {
            PreferenceState::None => None,
            PreferenceState::Liked => Some(PreferenceKind::Like),
            PreferenceState::Disliked => Some(PreferenceKind::Dislike),
        }
    }
}

impl From<Option<PreferenceKind>> for PreferenceState {
    fn from(kind: Option<PreferenceKind>) -> Self {
        match kind {
            None => PreferenceState::None,
            Some(PreferenceKind::Like) => PreferenceState::Liked,
            Some(PreferenceKind::Dislike) => PreferenceState::Disliked,
        }
    }
}

/// One user's stance on one city, as persisted by the preference store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceRecord {
    pub id: uuid::Uuid,
    pub user_id: String,
    pub city_id: String,
    pub kind: PreferenceKind,
    pub created_at: DateTime<Utc>,
}

/// Similarity weights used by the related-cities ranker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarityWeights {
    pub region: u32,
    pub characteristic: u32,
    pub environment: u32,
    pub living_cost: u32,
    /// Maximum living-cost difference (KRW) that still earns the bonus
    pub living_cost_tolerance: u32,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            region: 10,
            characteristic: 5,
            environment: 3,
            living_cost: 2,
            living_cost_tolerance: 200_000,
        }
    }
}
