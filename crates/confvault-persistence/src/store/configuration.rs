//! Configuration store
//!
//! Owns the live configuration row. Lock ownership is not checked here: this
//! is the persistence primitive the lock-aware services in `confvault-config`
//! build their conditional updates on.

use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set, prelude::Expr,
};

use confvault_common::{
    ENTITY_CONFIGURATION, PersistenceContext, Result, UNLOCKED_UID, UNSET_TIMESTAMP,
};

use crate::entity::configuration;
use crate::model::{ConfigurationPatch, NewConfiguration, Page, PageRequest};
use crate::now_unix;
use crate::query::{self, Conds};

/// Insert a new configuration row and return its id
pub async fn insert<C: ConnectionTrait>(db: &C, new: NewConfiguration) -> Result<i64> {
    let now = now_unix();
    let name = new.name.clone();
    let entity = configuration::ActiveModel {
        id: NotSet,
        external_resource_id: Set(new.external_resource_id),
        name: Set(new.name),
        content: Set(new.content),
        format: Set(new.format),
        version: Set(new.version),
        uid: Set(new.uid),
        publish_time: Set(UNSET_TIMESTAMP),
        lock_uid: Set(UNLOCKED_UID),
        lock_at: Set(UNSET_TIMESTAMP),
        ctime: Set(now),
        utime: Set(now),
    };

    let id = configuration::Entity::insert(entity)
        .exec(db)
        .await
        .persistence("insert", ENTITY_CONFIGURATION, None)?
        .last_insert_id;

    tracing::info!(id, name = %name, "Configuration created");
    Ok(id)
}

/// Apply `patch` to row `id`, optionally only where `guard` also holds.
///
/// Returns the number of rows changed; 0 means the row is missing or the
/// guard did not match. `utime` is always refreshed.
pub async fn update_where<C: ConnectionTrait>(
    db: &C,
    id: i64,
    patch: ConfigurationPatch,
    guard: Option<Condition>,
) -> Result<u64> {
    let mut query = configuration::Entity::update_many()
        .col_expr(configuration::Column::Utime, Expr::value(now_unix()));

    if let Some(v) = patch.external_resource_id {
        query = query.col_expr(configuration::Column::ExternalResourceId, Expr::value(v));
    }
    if let Some(v) = patch.name {
        query = query.col_expr(configuration::Column::Name, Expr::value(v));
    }
    if let Some(v) = patch.content {
        query = query.col_expr(configuration::Column::Content, Expr::value(v));
    }
    if let Some(v) = patch.format {
        query = query.col_expr(configuration::Column::Format, Expr::value(v));
    }
    if let Some(v) = patch.version {
        query = query.col_expr(configuration::Column::Version, Expr::value(v));
    }
    if let Some(v) = patch.publish_time {
        query = query.col_expr(configuration::Column::PublishTime, Expr::value(v));
    }
    if let Some(lock) = patch.lock {
        query = query
            .col_expr(configuration::Column::LockUid, Expr::value(lock.uid()))
            .col_expr(configuration::Column::LockAt, Expr::value(lock.at()));
    }

    query = query.filter(configuration::Column::Id.eq(id));
    if let Some(guard) = guard {
        query = query.filter(guard);
    }

    let result = query
        .exec(db)
        .await
        .persistence("update", ENTITY_CONFIGURATION, Some(id))?;

    Ok(result.rows_affected)
}

/// Apply `patch` to row `id` unconditionally
pub async fn update<C: ConnectionTrait>(
    db: &C,
    id: i64,
    patch: ConfigurationPatch,
) -> Result<u64> {
    update_where(db, id, patch, None).await
}

/// Hard delete; history and publish rows are kept
pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64> {
    let result = configuration::Entity::delete_by_id(id)
        .exec(db)
        .await
        .persistence("delete", ENTITY_CONFIGURATION, Some(id))?;

    if result.rows_affected > 0 {
        tracing::info!(id, "Configuration deleted");
    }
    Ok(result.rows_affected)
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<configuration::Model>> {
    configuration::Entity::find_by_id(id)
        .one(db)
        .await
        .persistence("find_by_id", ENTITY_CONFIGURATION, Some(id))
}

/// Handle owning the connection the configuration table is reached through
#[derive(Clone, Debug)]
pub struct ConfigurationStore {
    db: DatabaseConnection,
}

impl ConfigurationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn create(&self, new: NewConfiguration) -> Result<i64> {
        insert(&self.db, new).await
    }

    pub async fn update(&self, id: i64, patch: ConfigurationPatch) -> Result<u64> {
        update(&self.db, id, patch).await
    }

    pub async fn delete(&self, id: i64) -> Result<u64> {
        delete(&self.db, id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<configuration::Model>> {
        find_by_id(&self.db, id).await
    }

    pub async fn get_by_condition(&self, conds: &Conds) -> Result<Option<configuration::Model>> {
        query::find_one::<configuration::Entity, _>(&self.db, conds).await
    }

    pub async fn list(&self, conds: &Conds) -> Result<Vec<configuration::Model>> {
        query::find_all::<configuration::Entity, _>(&self.db, conds).await
    }

    pub async fn list_page(
        &self,
        conds: &Conds,
        page: PageRequest,
    ) -> Result<Page<configuration::Model>> {
        query::find_page::<configuration::Entity, _>(&self.db, conds, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LockPair, LockState};
    use crate::test_support::setup_db;
    use confvault_common::ConfVaultError;

    async fn create_test_store() -> ConfigurationStore {
        ConfigurationStore::new(setup_db().await)
    }

    fn new_config(name: &str) -> NewConfiguration {
        NewConfiguration {
            external_resource_id: 0,
            name: name.to_string(),
            content: "a:1".to_string(),
            format: "yaml".to_string(),
            version: String::new(),
            uid: 1,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = create_test_store().await;
        let id = store.create(new_config("app")).await.unwrap();

        let found = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.name, "app");
        assert_eq!(found.content, "a:1");
        assert_eq!(found.file_name(), "app.yaml");
        assert_eq!(found.lock_state(), LockState::Unlocked);
        assert_eq!((found.lock_uid, found.lock_at), (0, 0));
        assert!(!found.is_published());
        assert!(found.ctime > 0);

        let by_name = store
            .get_by_condition(&Conds::new().with("name", "app"))
            .await
            .unwrap();
        assert_eq!(by_name.map(|m| m.id), Some(id));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = create_test_store().await;
        assert!(store.get_by_id(404).await.unwrap().is_none());
        assert!(
            store
                .get_by_condition(&Conds::new().with("name", "nope"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_name_in_scope_fails() {
        let store = create_test_store().await;
        store.create(new_config("app")).await.unwrap();

        let err = store.create(new_config("app")).await.unwrap_err();
        assert!(matches!(
            err,
            ConfVaultError::Persistence {
                operation: "insert",
                ..
            }
        ));

        // Same name under another external resource is a different scope
        let mut other = new_config("app");
        other.external_resource_id = 9;
        assert!(store.create(other).await.is_ok());
    }

    #[tokio::test]
    async fn test_partial_update() {
        let store = create_test_store().await;
        let id = store.create(new_config("app")).await.unwrap();

        let changed = store
            .update(
                id,
                ConfigurationPatch::new()
                    .content("a:2")
                    .version("v2")
                    .lock(LockPair::held(7, 1_700_000_000).unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let found = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.content, "a:2");
        assert_eq!(found.version, "v2");
        assert_eq!(found.format, "yaml");
        assert_eq!(
            found.lock_state(),
            LockState::Locked {
                holder: 7,
                since: 1_700_000_000
            }
        );
        assert!(found.is_locked_by(7));

        assert_eq!(
            store
                .update(404, ConfigurationPatch::new().content("x"))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_update_where_guard() {
        let store = create_test_store().await;
        let id = store.create(new_config("app")).await.unwrap();

        let guard = Condition::all().add(configuration::Column::LockUid.eq(5));
        let changed = update_where(
            store.db(),
            id,
            ConfigurationPatch::new().content("blocked"),
            Some(guard),
        )
        .await
        .unwrap();
        assert_eq!(changed, 0);
        assert_eq!(store.get_by_id(id).await.unwrap().unwrap().content, "a:1");
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let store = create_test_store().await;
        let a = store.create(new_config("a")).await.unwrap();
        let b = store.create(new_config("b")).await.unwrap();
        let c = store.create(new_config("c")).await.unwrap();

        assert_eq!(store.delete(b).await.unwrap(), 1);
        assert_eq!(store.delete(b).await.unwrap(), 0);

        let ids: Vec<i64> = store
            .list(&Conds::new().with("uid", 1i64).order_desc("id"))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![c, a]);

        let page = store
            .list_page(&Conds::new(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.page_items[0].id, c);
    }
}
