//! Full edit session: lock, edit, publish, hand over

mod common;

use confvault_common::ConfVaultError;
use confvault_config::{ConfigurationEditor, ContentChange, LockManager, PublishTracker};
use confvault_persistence::{
    Conds, ConfigurationStore, HistoryLog, LockState, NewConfiguration, PageRequest,
};

use common::setup_db;

#[tokio::test]
async fn test_edit_publish_handover() {
    let db = setup_db().await;
    let store = ConfigurationStore::new(db.clone());
    let log = HistoryLog::new(db.clone());
    let locks = LockManager::new(db.clone());
    let editor = ConfigurationEditor::new(db.clone());
    let tracker = PublishTracker::new(db.clone());

    let id = store
        .create(NewConfiguration {
            name: "app".to_string(),
            format: "yaml".to_string(),
            content: "a:1".to_string(),
            uid: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    let by_config = Conds::new().with("configuration_id", id);

    // Principal 1 takes the lock and edits
    locks.acquire(id, 1).await.unwrap();
    let first = editor
        .update_content(id, 1, ContentChange::new("a:2", "v1"))
        .await
        .unwrap();
    assert_eq!(log.list(&by_config).await.unwrap().len(), 1);

    // Principal 2 is locked out
    match locks.acquire(id, 2).await {
        Err(ConfVaultError::LockConflict { current_holder, .. }) => assert_eq!(current_holder, 1),
        other => panic!("unexpected result: {other:?}"),
    }

    // Publishing ends principal 1's session
    tracker.publish(id, first, 1).await.unwrap();
    let config = store.get_by_id(id).await.unwrap().unwrap();
    assert!(config.publish_time > 0);
    assert_eq!(config.lock_state(), LockState::Unlocked);
    assert_eq!(tracker.records().list(&by_config).await.unwrap().len(), 1);

    // Principal 2 picks it up
    locks.acquire(id, 2).await.unwrap();
    let second = editor
        .update_content(id, 2, ContentChange::new("a:3", "v2"))
        .await
        .unwrap();

    let page = log
        .list_page(&by_config, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 2);
    let ids: Vec<i64> = page.page_items.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![second, first]);
    assert_eq!(page.page_items[0].content, "a:3");
    assert_eq!(page.page_items[0].uid, 2);

    let live = tracker.current(id).await.unwrap().unwrap();
    assert_eq!(live.history.unwrap().content, "a:2");
}
