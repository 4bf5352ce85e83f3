use crate::core::{PreferenceStore, StoreError};
use crate::models::{CityCounts, PreferenceKind, PreferenceRecord, UserId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

type Key = (String, String);

/// In-process preference store keyed by (user, city)
///
/// Used when no database is configured, and by tests.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    records: RwLock<HashMap<Key, PreferenceRecord>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Reactions recorded for one city, across all users
    pub async fn counts_for(&self, city_id: &str) -> CityCounts {
        let records = self.records.read().await;
        let mut counts = CityCounts::default();
        for record in records.values().filter(|record| record.city_id == city_id) {
            counts.record(record.kind);
        }
        counts
    }

    /// Reactions recorded per city, across all users
    pub async fn tallies(&self) -> HashMap<String, CityCounts> {
        let records = self.records.read().await;
        let mut tallies: HashMap<String, CityCounts> = HashMap::new();
        for record in records.values() {
            tallies.entry(record.city_id.clone()).or_default().record(record.kind);
        }
        tallies
    }
}

fn key(user: &UserId, city_id: &str) -> Key {
    (user.as_str().to_string(), city_id.to_string())
}

fn not_found(user: &UserId, city_id: &str) -> StoreError {
    StoreError::NotFound {
        user_id: user.to_string(),
        city_id: city_id.to_string(),
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn find(&self, user: &UserId, city_id: &str) -> Result<Option<PreferenceRecord>, StoreError> {
        Ok(self.records.read().await.get(&key(user, city_id)).cloned())
    }

    async fn insert(
        &self,
        user: &UserId,
        city_id: &str,
        kind: PreferenceKind,
    ) -> Result<PreferenceRecord, StoreError> {
        let mut records = self.records.write().await;
        let key = key(user, city_id);

        if records.contains_key(&key) {
            return Err(StoreError::Conflict {
                user_id: user.to_string(),
                city_id: city_id.to_string(),
            });
        }

        let record = PreferenceRecord {
            id: uuid::Uuid::new_v4(),
            user_id: user.to_string(),
            city_id: city_id.to_string(),
            kind,
            created_at: Utc::now(),
        };
        records.insert(key, record.clone());

        Ok(record)
    }

    async fn update(&self, user: &UserId, city_id: &str, kind: PreferenceKind) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&key(user, city_id))
            .ok_or_else(|| not_found(user, city_id))?;
        record.kind = kind;
        Ok(())
    }

    async fn delete(&self, user: &UserId, city_id: &str) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .remove(&key(user, city_id))
            .map(|_| ())
            .ok_or_else(|| not_found(user, city_id))
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<PreferenceRecord>, StoreError> {
        let records = self.records.read().await;
        let mut mine: Vec<PreferenceRecord> = records
            .values()
            .filter(|record| record.user_id == user.as_str())
            .cloned()
            .collect();
        // Newest first, matching the database ordering
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_find() {
        let store = MemoryPreferenceStore::new();
        let alice = user("alice");

        let record = store.insert(&alice, "1", PreferenceKind::Like).await.unwrap();
        assert_eq!(record.user_id, "alice");
        assert_eq!(record.city_id, "1");

        let found = store.find(&alice, "1").await.unwrap().unwrap();
        assert_eq!(found.id, record.id);
        assert_eq!(found.kind, PreferenceKind::Like);
        assert!(store.find(&alice, "2").await.unwrap().is_none());
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = MemoryPreferenceStore::new();
        let records = tokio_test::block_on(store.list_for_user(&user("alice"))).unwrap();

        assert!(records.is_empty());
        assert!(tokio_test::block_on(store.is_empty()));
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = MemoryPreferenceStore::new();
        let alice = user("alice");

        store.insert(&alice, "1", PreferenceKind::Like).await.unwrap();
        let err = store.insert(&alice, "1", PreferenceKind::Dislike).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_rows() {
        let store = MemoryPreferenceStore::new();
        let bob = user("bob");

        assert!(matches!(
            store.update(&bob, "3", PreferenceKind::Like).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(store.delete(&bob, "3").await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_changes_kind_in_place() {
        let store = MemoryPreferenceStore::new();
        let bob = user("bob");

        let inserted = store.insert(&bob, "3", PreferenceKind::Like).await.unwrap();
        store.update(&bob, "3", PreferenceKind::Dislike).await.unwrap();

        let found = store.find(&bob, "3").await.unwrap().unwrap();
        assert_eq!(found.id, inserted.id);
        assert_eq!(found.kind, PreferenceKind::Dislike);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_user() {
        let store = MemoryPreferenceStore::new();
        let alice = user("alice");
        let bob = user("bob");

        store.insert(&alice, "1", PreferenceKind::Like).await.unwrap();
        store.insert(&alice, "2", PreferenceKind::Dislike).await.unwrap();
        store.insert(&bob, "1", PreferenceKind::Dislike).await.unwrap();

        let records = store.list_for_user(&alice).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.user_id == "alice"));

        store.delete(&alice, "1").await.unwrap();
        assert_eq!(store.list_for_user(&alice).await.unwrap().len(), 1);
        assert!(!store.is_empty().await);
    }

    #[tokio::test]
    async fn test_counts_follow_every_mutation() {
        let store = MemoryPreferenceStore::new();
        let alice = user("alice");
        let bob = user("bob");

        assert_eq!(store.counts_for("1").await, CityCounts::default());

        store.insert(&alice, "1", PreferenceKind::Like).await.unwrap();
        store.insert(&bob, "1", PreferenceKind::Like).await.unwrap();
        store.insert(&bob, "2", PreferenceKind::Dislike).await.unwrap();
        assert_eq!(
            store.counts_for("1").await,
            CityCounts {
                likes_count: 2,
                dislikes_count: 0
            }
        );

        store.update(&alice, "1", PreferenceKind::Dislike).await.unwrap();
        store.delete(&bob, "1").await.unwrap();
        assert_eq!(
            store.counts_for("1").await,
            CityCounts {
                likes_count: 0,
                dislikes_count: 1
            }
        );

        let tallies = store.tallies().await;
        assert_eq!(tallies.len(), 2);
        assert_eq!(tallies["2"].dislikes_count, 1);
    }
}
