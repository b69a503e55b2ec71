use async_trait::async_trait;
use aura_core::{Feedback, ProfileStore, UserProfile};
use dashmap::DashMap;
use errors::StoreError;
use tracing::debug;

/// Process-local profile store.
///
/// Profiles are keyed by `aura_id`; feedback accumulates per profile in
/// arrival order.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: DashMap<String, UserProfile>,
    feedback: DashMap<String, Vec<Feedback>>
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feedback_for(&self, aura_id: &str) -> Vec<Feedback> {
        self.feedback
            .get(aura_id)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn save(&self, profile: &UserProfile) -> Result<(), StoreError> {
        debug!(aura_id = %profile.aura_id, "Saving profile in memory");
        self.profiles
            .insert(profile.aura_id.clone(), profile.clone());
        Ok(())
    }

    async fn load(&self, aura_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.profiles.get(aura_id).map(|p| p.clone()))
    }

    async fn record_feedback(&self, feedback: &Feedback) -> Result<(), StoreError> {
        self.feedback
            .entry(feedback.aura_id.clone())
            .or_default()
            .push(feedback.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::SupportLevel;

    #[tokio::test]
    async fn test_save_then_load_returns_latest() {
        let store = InMemoryProfileStore::new();
        let mut profile = UserProfile::new("mem-1");
        store.save(&profile).await.unwrap();

        profile.cognitive.support_level = SupportLevel::High;
        store.save(&profile).await.unwrap();

        let loaded = store.load("mem-1").await.unwrap().unwrap();
        assert_eq!(loaded.cognitive.support_level, SupportLevel::High);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_profile_is_none() {
        let store = InMemoryProfileStore::new();
        assert!(store.load("nobody").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_feedback_accumulates_in_order() {
        let store = InMemoryProfileStore::new();
        for (url, helpful) in [("https://a.test", true), ("https://b.test", false)] {
            store
                .record_feedback(&Feedback {
                    aura_id: "mem-2".to_string(),
                    url: url.to_string(),
                    helpful,
                    comment: None
                })
                .await
                .unwrap();
        }

        let entries = store.feedback_for("mem-2");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://a.test");
        assert!(!entries[1].helpful);
        assert!(store.feedback_for("other").is_empty());
    }
}
