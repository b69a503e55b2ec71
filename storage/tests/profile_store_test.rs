use aura_core::{Feedback, ProfileStore, SupportLevel, UserProfile};
use errors::StoreError;
use std::sync::Arc;
use storage::{InMemoryProfileStore, SqliteProfileStore};
use testing::{cognitive_profile, unique_aura_id};

async fn memory_db() -> SqliteProfileStore {
    SqliteProfileStore::connect("sqlite::memory:").await.unwrap()
}

#[tokio::test]
async fn sqlite_round_trips_nested_profile() {
    let store = memory_db().await;
    let profile = cognitive_profile();

    store.save(&profile).await.unwrap();
    let loaded = store.load(&profile.aura_id).await.unwrap();

    assert_eq!(loaded, Some(profile.clone()));
    assert!(store.last_updated(&profile.aura_id).await.unwrap().is_some());
}

#[tokio::test]
async fn sqlite_save_replaces_existing_profile() {
    let store = memory_db().await;
    let mut profile = UserProfile::new(unique_aura_id());
    store.save(&profile).await.unwrap();

    profile.cognitive.support_level = SupportLevel::Medium;
    profile.sensory.high_contrast = true;
    store.save(&profile).await.unwrap();

    let loaded = store.load(&profile.aura_id).await.unwrap().unwrap();
    assert_eq!(loaded.cognitive.support_level, SupportLevel::Medium);
    assert!(loaded.sensory.high_contrast);
}

#[tokio::test]
async fn sqlite_missing_profile_is_none() {
    let store = memory_db().await;
    assert!(store.load("never-saved").await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_records_feedback_per_profile() {
    let store = memory_db().await;
    let aura_id = unique_aura_id();

    store
        .record_feedback(&Feedback {
            aura_id: aura_id.clone(),
            url: "https://courier.test/storm".to_string(),
            helpful: true,
            comment: Some("Much easier to read".to_string())
        })
        .await
        .unwrap();
    store
        .record_feedback(&Feedback {
            aura_id: aura_id.clone(),
            url: "https://quiet.test/about".to_string(),
            helpful: false,
            comment: None
        })
        .await
        .unwrap();

    let entries = store.feedback_for(&aura_id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].comment.as_deref(), Some("Much easier to read"));
    assert!(!entries[1].helpful);
    assert!(store.feedback_for("someone-else").await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_file_database_survives_reconnect() {
    let fixture = testing::sqlite().unwrap();
    let profile = cognitive_profile();

    {
        let store = SqliteProfileStore::connect(fixture.url()).await.unwrap();
        store.save(&profile).await.unwrap();
    }

    let reopened = SqliteProfileStore::connect(fixture.url()).await.unwrap();
    assert_eq!(reopened.load(&profile.aura_id).await.unwrap(), Some(profile));
}

#[tokio::test]
async fn sqlite_connect_reports_bad_location() {
    let result = SqliteProfileStore::connect("sqlite:///nonexistent-dir/aura/identity.db").await;
    assert!(matches!(result, Err(StoreError::Connection { .. })));
}

#[tokio::test]
async fn backends_are_interchangeable_behind_the_trait() {
    let stores: Vec<Arc<dyn ProfileStore>> = vec![
        Arc::new(InMemoryProfileStore::new()),
        Arc::new(memory_db().await),
    ];

    for store in stores {
        let profile = cognitive_profile();
        store.save(&profile).await.unwrap();
        assert_eq!(store.load(&profile.aura_id).await.unwrap(), Some(profile));
    }
}
