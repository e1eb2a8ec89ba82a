//! Publishing history snapshots

mod common;

use confvault_common::ConfVaultError;
use confvault_config::{ConfigurationEditor, ContentChange, LockManager, PublishTracker};
use confvault_persistence::{Conds, ConfigurationStore, LockState, PageRequest};
use sea_orm::ConnectionTrait;

use common::{create_config, setup_db};

/// Lock `id` for `principal` and record one edit, returning the history id
async fn edit(db: &sea_orm::DatabaseConnection, id: i64, principal: i64, content: &str) -> i64 {
    LockManager::new(db.clone()).acquire(id, principal).await.unwrap();
    ConfigurationEditor::new(db.clone())
        .update_content(id, principal, ContentChange::new(content, "v1"))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_publish_records_and_clears_lock() {
    let db = setup_db().await;
    let id = create_config(&db, "app", "a:1").await;
    let history_id = edit(&db, id, 1, "a:2").await;

    let tracker = PublishTracker::new(db.clone());
    let record = tracker.publish(id, history_id, 1).await.unwrap();
    assert_eq!(record.configuration_id, id);
    assert_eq!(record.configuration_history_id, history_id);
    assert_eq!(record.uid, 1);
    assert!(record.id > 0);

    let config = ConfigurationStore::new(db.clone()).get_by_id(id).await.unwrap().unwrap();
    assert!(config.is_published());
    assert!(config.publish_time > 0);
    assert_eq!(config.lock_state(), LockState::Unlocked);
    assert_eq!(config.lock_at, 0);

    assert_eq!(tracker.get_by_id(record.id).await.unwrap(), Some(record));
}

#[tokio::test]
async fn test_publish_unlocked_configuration() {
    let db = setup_db().await;
    let id = create_config(&db, "app", "a:1").await;
    let history_id = edit(&db, id, 1, "a:2").await;
    LockManager::new(db.clone()).release(id, 1).await.unwrap();

    let record = PublishTracker::new(db.clone())
        .publish(id, history_id, 2)
        .await
        .unwrap();
    assert_eq!(record.uid, 2);
}

#[tokio::test]
async fn test_publish_foreign_history_is_rejected() {
    let db = setup_db().await;
    let app = create_config(&db, "app", "a:1").await;
    let other = create_config(&db, "other", "b:1").await;
    let other_history = edit(&db, other, 1, "b:2").await;

    let tracker = PublishTracker::new(db.clone());
    let err = tracker.publish(app, other_history, 1).await.unwrap_err();
    match err {
        ConfVaultError::ReferentialMismatch {
            config_id,
            history_id,
            owner_id,
        } => {
            assert_eq!(config_id, app);
            assert_eq!(history_id, other_history);
            assert_eq!(owner_id, Some(other));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let page = tracker
        .list_page(&Conds::new(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 0);
    let config = ConfigurationStore::new(db).get_by_id(app).await.unwrap().unwrap();
    assert!(!config.is_published());
}

#[tokio::test]
async fn test_publish_missing_history_is_rejected() {
    let db = setup_db().await;
    let id = create_config(&db, "app", "a:1").await;

    let err = PublishTracker::new(db).publish(id, 99, 1).await.unwrap_err();
    assert!(matches!(
        err,
        ConfVaultError::ReferentialMismatch { owner_id: None, .. }
    ));
}

#[tokio::test]
async fn test_publish_while_locked_by_other_is_rejected() {
    let db = setup_db().await;
    let id = create_config(&db, "app", "a:1").await;
    let history_id = edit(&db, id, 1, "a:2").await;

    let tracker = PublishTracker::new(db.clone());
    let err = tracker.publish(id, history_id, 2).await.unwrap_err();
    assert_eq!(err.current_holder(), Some(1));

    // Nothing was written and the lock is untouched
    assert!(tracker.current(id).await.unwrap().is_none());
    let config = ConfigurationStore::new(db).get_by_id(id).await.unwrap().unwrap();
    assert_eq!(config.lock_uid, 1);
    assert_eq!(config.publish_time, 0);
}

#[tokio::test]
async fn test_current_returns_latest_snapshot() {
    let db = setup_db().await;
    let id = create_config(&db, "app", "a:1").await;
    let tracker = PublishTracker::new(db.clone());

    let first = edit(&db, id, 1, "a:2").await;
    tracker.publish(id, first, 1).await.unwrap();
    let second = edit(&db, id, 2, "a:3").await;
    let latest = tracker.publish(id, second, 2).await.unwrap();

    let snapshot = tracker.current(id).await.unwrap().unwrap();
    assert_eq!(snapshot.publish, latest);
    let history = snapshot.history.unwrap();
    assert_eq!(history.id, second);
    assert_eq!(history.content, "a:3");

    let page = tracker
        .list_page(&Conds::new().with("configuration_id", id), PageRequest::new(1, 1))
        .await
        .unwrap();
    assert_eq!(page.total_count, 2);
    assert_eq!(page.pages_available, 2);
    assert_eq!(page.page_items[0].id, latest.id);
}

#[tokio::test]
async fn test_failed_publish_record_rolls_back_configuration() {
    let db = setup_db().await;
    let id = create_config(&db, "app", "a:1").await;
    let history_id = edit(&db, id, 1, "a:2").await;
    db.execute_unprepared("DROP TABLE configuration_publish")
        .await
        .unwrap();

    let err = PublishTracker::new(db.clone())
        .publish(id, history_id, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, ConfVaultError::Persistence { .. }));

    let config = ConfigurationStore::new(db).get_by_id(id).await.unwrap().unwrap();
    assert_eq!(config.lock_uid, 1);
    assert!(config.lock_at > 0);
    assert_eq!(config.publish_time, 0);
    assert!(!config.is_published());
}
