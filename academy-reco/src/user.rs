//! User interaction history and declared preferences.
//!
//! The engine reads users through the [`UserStore`] trait so the backing
//! state can live anywhere. [`InMemoryUserStore`] keeps it in process.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::content::Modality;
use crate::error::Result;

/// Declared learning preferences of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default, alias = "domaines_interets")]
    pub areas_of_interest: BTreeSet<String>,
    #[serde(default, alias = "types_contenus")]
    pub preferred_content_types: BTreeSet<Modality>,
    #[serde(default, alias = "objectifs_apprentissage")]
    pub learning_objectives: BTreeSet<String>,
}

impl UserPreferences {
    /// True when neither interests nor content types are declared.
    pub fn has_no_signal(&self) -> bool {
        self.areas_of_interest.is_empty() && self.preferred_content_types.is_empty()
    }

    pub fn prefers(&self, modality: Modality) -> bool {
        self.preferred_content_types.contains(&modality)
    }

    pub fn is_interested_in(&self, category: Option<&str>) -> bool {
        category.is_some_and(|category| self.areas_of_interest.contains(category))
    }
}

/// Everything the engine knows about a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub interaction_history: BTreeSet<String>,
    pub preferences: UserPreferences,
}

/// Storage for per-user interaction history and preferences.
///
/// Implementations must keep each user's record consistent under concurrent
/// access. Operations on different users need no coordination.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Add `point_id` to the user's history. Returns `true` once recorded;
    /// recording an already-known point is not an error.
    async fn record_interaction(&self, user_id: &str, point_id: &str) -> Result<bool>;

    /// The set of point ids the user interacted with.
    async fn interactions(&self, user_id: &str) -> Result<BTreeSet<String>>;

    /// Replace the user's preferences.
    async fn save_preferences(&self, user_id: &str, preferences: UserPreferences) -> Result<bool>;

    /// The user's preferences, or empty preferences for unknown users.
    async fn preferences(&self, user_id: &str) -> Result<UserPreferences>;

    /// History and preferences together.
    async fn profile(&self, user_id: &str) -> Result<UserProfile> {
        let interaction_history = self.interactions(user_id).await?;
        let preferences = self.preferences(user_id).await?;
        Ok(UserProfile { user_id: user_id.to_string(), interaction_history, preferences })
    }
}

#[derive(Debug, Default)]
struct UserRecord {
    interactions: BTreeSet<String>,
    preferences: Option<UserPreferences>,
}

/// A process-local [`UserStore`].
///
/// Each user has its own lock; the outer map lock is held only long enough to
/// find or create that entry.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, Arc<RwLock<UserRecord>>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn existing(&self, user_id: &str) -> Option<Arc<RwLock<UserRecord>>> {
        self.users.read().await.get(user_id).cloned()
    }

    async fn entry(&self, user_id: &str) -> Arc<RwLock<UserRecord>> {
        if let Some(record) = self.existing(user_id).await {
            return record;
        }
        let mut users = self.users.write().await;
        Arc::clone(users.entry(user_id.to_string()).or_default())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn record_interaction(&self, user_id: &str, point_id: &str) -> Result<bool> {
        info!(user_id, point_id, "recording interaction");
        let record = self.entry(user_id).await;
        record.write().await.interactions.insert(point_id.to_string());
        Ok(true)
    }

    async fn interactions(&self, user_id: &str) -> Result<BTreeSet<String>> {
        let interactions = match self.existing(user_id).await {
            Some(record) => record.read().await.interactions.clone(),
            None => BTreeSet::new(),
        };
        info!(user_id, count = interactions.len(), "retrieved interactions");
        Ok(interactions)
    }

    async fn save_preferences(&self, user_id: &str, preferences: UserPreferences) -> Result<bool> {
        info!(user_id, "saving preferences");
        let record = self.entry(user_id).await;
        record.write().await.preferences = Some(preferences);
        Ok(true)
    }

    async fn preferences(&self, user_id: &str) -> Result<UserPreferences> {
        let preferences = match self.existing(user_id).await {
            Some(record) => record.read().await.preferences.clone().unwrap_or_default(),
            None => UserPreferences::default(),
        };
        Ok(preferences)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn interactions_collapse_duplicates() {
        let store = InMemoryUserStore::new();
        assert!(store.record_interaction("u1", "p1").await.unwrap());
        assert!(store.record_interaction("u1", "p1").await.unwrap());
        store.record_interaction("u1", "p2").await.unwrap();

        let history = store.interactions("u1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(store.interactions("unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn preferences_default_to_empty_and_are_overwritten() {
        let store = InMemoryUserStore::new();
        assert!(store.preferences("u1").await.unwrap().has_no_signal());

        let prefs = UserPreferences {
            areas_of_interest: BTreeSet::from(["AI".to_string()]),
            ..UserPreferences::default()
        };
        store.save_preferences("u1", prefs.clone()).await.unwrap();
        assert_eq!(store.preferences("u1").await.unwrap(), prefs);

        store.save_preferences("u1", UserPreferences::default()).await.unwrap();
        assert!(store.preferences("u1").await.unwrap().has_no_signal());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_do_not_lose_interactions() {
        let store = Arc::new(InMemoryUserStore::new());
        let mut tasks = Vec::new();
        for user in 0..4 {
            for point in 0..50 {
                let store = Arc::clone(&store);
                tasks.push(tokio::spawn(async move {
                    store.record_interaction(&format!("u{user}"), &format!("p{point}")).await
                }));
            }
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        for user in 0..4 {
            assert_eq!(store.interactions(&format!("u{user}")).await.unwrap().len(), 50);
        }
    }

    #[test]
    fn legacy_field_names_deserialize() {
        let prefs: UserPreferences = serde_json::from_value(json!({
            "domaines_interets": ["AI"],
            "types_contenus": ["Video"],
            "objectifs_apprentissage": ["certification"]
        }))
        .unwrap();
        assert!(prefs.is_interested_in(Some("AI")));
        assert!(prefs.prefers(Modality::Video));
        assert!(!prefs.prefers(Modality::Document));
        assert_eq!(prefs.learning_objectives.len(), 1);
    }
}
