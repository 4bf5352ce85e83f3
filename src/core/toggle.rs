use crate::models::{PreferenceKind, PreferenceRecord, PreferenceState, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a preference store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Preference already exists for user {user_id} and city {city_id}")]
    Conflict { user_id: String, city_id: String },

    #[error("No preference for user {user_id} and city {city_id}")]
    NotFound { user_id: String, city_id: String },

    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Row-level persistence of preference records, unique per (user, city)
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn find(&self, user: &UserId, city_id: &str) -> Result<Option<PreferenceRecord>, StoreError>;

    async fn insert(
        &self,
        user: &UserId,
        city_id: &str,
        kind: PreferenceKind,
    ) -> Result<PreferenceRecord, StoreError>;

    async fn update(&self, user: &UserId, city_id: &str, kind: PreferenceKind) -> Result<(), StoreError>;

    async fn delete(&self, user: &UserId, city_id: &str) -> Result<(), StoreError>;

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<PreferenceRecord>, StoreError>;
}

/// Resolves the identity of the caller, if any
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Option<UserId>;
}

/// Store operation required to move between two preference states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Insert(PreferenceKind),
    Update(PreferenceKind),
    Delete,
}

/// Apply a requested reaction to the current state
///
/// | from \ request | like            | dislike            |
/// |----------------|-----------------|--------------------|
/// | None           | Liked (insert)  | Disliked (insert)  |
/// | Liked          | None (delete)   | Disliked (update)  |
/// | Disliked       | Liked (update)  | None (delete)      |
pub fn transition(current: PreferenceState, requested: PreferenceKind) -> (PreferenceState, Mutation) {
    match current.kind() {
        None => (PreferenceState::from(Some(requested)), Mutation::Insert(requested)),
        Some(existing) if existing == requested => (PreferenceState::None, Mutation::Delete),
        Some(_) => (PreferenceState::from(Some(requested)), Mutation::Update(requested)),
    }
}

/// Coarse error category, cheap to copy into client-side state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleErrorKind {
    Unauthenticated,
    ReadFailed,
    InsertFailed,
    UpdateFailed,
    DeleteFailed,
}

/// Errors from a toggle attempt. Each step that can fail has its own variant.
#[derive(Debug, Error)]
pub enum ToggleError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Failed to read preference: {0}")]
    ReadFailed(#[source] StoreError),

    #[error("Failed to insert preference: {0}")]
    InsertFailed(#[source] StoreError),

    #[error("Failed to update preference: {0}")]
    UpdateFailed(#[source] StoreError),

    #[error("Failed to delete preference: {0}")]
    DeleteFailed(#[source] StoreError),
}

impl ToggleError {
    pub fn kind(&self) -> ToggleErrorKind {
        match self {
            ToggleError::Unauthenticated => ToggleErrorKind::Unauthenticated,
            ToggleError::ReadFailed(_) => ToggleErrorKind::ReadFailed,
            ToggleError::InsertFailed(_) => ToggleErrorKind::InsertFailed,
            ToggleError::UpdateFailed(_) => ToggleErrorKind::UpdateFailed,
            ToggleError::DeleteFailed(_) => ToggleErrorKind::DeleteFailed,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ToggleErrorKind::Unauthenticated => "unauthenticated",
            ToggleErrorKind::ReadFailed => "read_failed",
            ToggleErrorKind::InsertFailed => "insert_failed",
            ToggleErrorKind::UpdateFailed => "update_failed",
            ToggleErrorKind::DeleteFailed => "delete_failed",
        }
    }

    /// Message suitable for showing to the end user
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ToggleErrorKind::Unauthenticated => "Please log in to react to cities.",
            ToggleErrorKind::ReadFailed => "Could not check your current reaction.",
            ToggleErrorKind::InsertFailed => "Could not save your reaction.",
            ToggleErrorKind::UpdateFailed => "Could not change your reaction.",
            ToggleErrorKind::DeleteFailed => "Could not remove your reaction.",
        }
    }
}

/// Like/dislike toggle over a preference store
///
/// Aggregate counts are not touched here; the store owns them (the database
/// derives them from the preference rows).
#[derive(Clone)]
pub struct PreferenceToggle {
    store: Arc<dyn PreferenceStore>,
}

impl PreferenceToggle {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Toggle the caller's reaction to `city_id`, returning the new state
    pub async fn toggle(
        &self,
        identity: &dyn IdentityProvider,
        city_id: &str,
        requested: PreferenceKind,
    ) -> Result<PreferenceState, ToggleError> {
        let user = identity
            .current_user()
            .await
            .ok_or(ToggleError::Unauthenticated)?;

        let existing = self
            .store
            .find(&user, city_id)
            .await
            .map_err(ToggleError::ReadFailed)?;

        let current = PreferenceState::from(existing.map(|record| record.kind));
        let (next, mutation) = transition(current, requested);

        match mutation {
            Mutation::Insert(kind) => {
                self.store
                    .insert(&user, city_id, kind)
                    .await
                    .map_err(ToggleError::InsertFailed)?;
            }
            Mutation::Update(kind) => {
                self.store
                    .update(&user, city_id, kind)
                    .await
                    .map_err(ToggleError::UpdateFailed)?;
            }
            Mutation::Delete => {
                self.store
                    .delete(&user, city_id)
                    .await
                    .map_err(ToggleError::DeleteFailed)?;
            }
        }

        tracing::debug!(
            "Toggled {} on city {} for user {}: {:?} -> {:?}",
            requested.as_str(),
            city_id,
            user,
            current,
            next
        );

        Ok(next)
    }

    /// Current state for one (user, city) pair
    pub async fn state_for(&self, user: &UserId, city_id: &str) -> Result<PreferenceState, ToggleError> {
        let existing = self
            .store
            .find(user, city_id)
            .await
            .map_err(ToggleError::ReadFailed)?;

        Ok(PreferenceState::from(existing.map(|record| record.kind)))
    }

    /// All preference records held by `user`
    pub async fn fetch_all(&self, user: &UserId) -> Result<Vec<PreferenceRecord>, ToggleError> {
        self.store
            .list_for_user(user)
            .await
            .map_err(ToggleError::ReadFailed)
    }
}
