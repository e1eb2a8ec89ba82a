//! Publish tracking
//!
//! Publishing marks a history snapshot as the live content of its
//! configuration and ends the edit session. The referential check, the
//! publish-time stamp, the lock release and the publish record share one
//! transaction.

use sea_orm::{ColumnTrait, Condition, DatabaseConnection, TransactionTrait};

use confvault_common::{
    ConfVaultError, ENTITY_CONFIGURATION_PUBLISH, PersistenceContext, Result, UNLOCKED_UID,
};
use confvault_persistence::entity::{configuration, configuration_publish};
use confvault_persistence::store::{
    PublishStore, configuration as configuration_store, history, publish,
};
use confvault_persistence::{
    Conds, ConfigurationPatch, LockPair, NewPublish, Page, PageRequest, now_unix,
};

use crate::model::PublishedSnapshot;

use super::{ensure_principal, guard_failure};

#[derive(Clone, Debug)]
pub struct PublishTracker {
    db: DatabaseConnection,
    records: PublishStore,
}

impl PublishTracker {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            records: PublishStore::new(db.clone()),
            db,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Read access to publish records
    pub fn records(&self) -> &PublishStore {
        &self.records
    }

    /// Publish history `history_id` as the live content of `config_id`.
    ///
    /// The history row must belong to `config_id`. The configuration must be
    /// unlocked or locked by `principal`; on success its lock is cleared.
    pub async fn publish(
        &self,
        config_id: i64,
        history_id: i64,
        principal: i64,
    ) -> Result<configuration_publish::Model> {
        ensure_principal(principal)?;

        let tx = self
            .db
            .begin()
            .await
            .persistence("begin", ENTITY_CONFIGURATION_PUBLISH, Some(config_id))?;

        let owner_id = history::find_by_id(&tx, history_id)
            .await?
            .map(|h| h.configuration_id);
        if owner_id != Some(config_id) {
            tx.rollback()
                .await
                .persistence("rollback", ENTITY_CONFIGURATION_PUBLISH, Some(config_id))?;
            tracing::info!(config_id, history_id, ?owner_id, "Publish rejected");
            return Err(ConfVaultError::ReferentialMismatch {
                config_id,
                history_id,
                owner_id,
            });
        }

        let claimable = Condition::any()
            .add(configuration::Column::LockUid.eq(UNLOCKED_UID))
            .add(configuration::Column::LockUid.eq(principal));
        let changed = configuration_store::update_where(
            &tx,
            config_id,
            ConfigurationPatch::new()
                .publish_time(now_unix())
                .lock(LockPair::free()),
            Some(claimable),
        )
        .await?;
        if changed == 0 {
            let err = guard_failure(&tx, config_id).await?;
            tx.rollback()
                .await
                .persistence("rollback", ENTITY_CONFIGURATION_PUBLISH, Some(config_id))?;
            tracing::info!(config_id, history_id, principal, error = %err, "Publish rejected");
            return Err(err);
        }

        let inserted = publish::insert(
            &tx,
            NewPublish {
                uid: principal,
                configuration_id: config_id,
                configuration_history_id: history_id,
            },
        )
        .await;
        let record = match inserted {
            Ok(record) => record,
            Err(err) => {
                tx.rollback()
                    .await
                    .persistence("rollback", ENTITY_CONFIGURATION_PUBLISH, Some(config_id))?;
                return Err(err);
            }
        };

        tx.commit()
            .await
            .persistence("commit", ENTITY_CONFIGURATION_PUBLISH, Some(config_id))?;

        tracing::info!(
            config_id,
            history_id,
            principal,
            publish_id = record.id,
            "Configuration published"
        );
        Ok(record)
    }

    /// The most recently published snapshot of `config_id`
    pub async fn current(&self, config_id: i64) -> Result<Option<PublishedSnapshot>> {
        let Some(record) = publish::find_latest(&self.db, config_id).await? else {
            return Ok(None);
        };
        let history = history::find_by_id(&self.db, record.configuration_history_id).await?;

        Ok(Some(PublishedSnapshot {
            publish: record,
            history,
        }))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<configuration_publish::Model>> {
        self.records.get_by_id(id).await
    }

    pub async fn list_page(
        &self,
        conds: &Conds,
        page: PageRequest,
    ) -> Result<Page<configuration_publish::Model>> {
        self.records.list_page(conds, page).await
    }
}
