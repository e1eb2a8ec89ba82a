//! Lock-checked content edits
//!
//! The content update and its history snapshot commit together or not at all.

use sea_orm::{ColumnTrait, Condition, DatabaseConnection, TransactionTrait};

use confvault_common::{ENTITY_CONFIGURATION, PersistenceContext, Result};
use confvault_persistence::entity::configuration;
use confvault_persistence::store::{configuration as configuration_store, history};
use confvault_persistence::{ConfigurationPatch, NewHistory};

use crate::model::ContentChange;

use super::{ensure_principal, guard_failure};

#[derive(Clone, Debug)]
pub struct ConfigurationEditor {
    db: DatabaseConnection,
}

impl ConfigurationEditor {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Replace the content of `config_id` and append the new snapshot.
    ///
    /// `principal` must hold the edit lock at write time. Returns the id of the
    /// history row recording the change.
    pub async fn update_content(
        &self,
        config_id: i64,
        principal: i64,
        change: ContentChange,
    ) -> Result<i64> {
        ensure_principal(principal)?;

        let tx = self
            .db
            .begin()
            .await
            .persistence("begin", ENTITY_CONFIGURATION, Some(config_id))?;

        let mut patch = ConfigurationPatch::new()
            .content(change.content.clone())
            .version(change.version.clone());
        if let Some(format) = change.format {
            patch = patch.format(format);
        }

        let held_by_caller = Condition::all().add(configuration::Column::LockUid.eq(principal));
        let changed =
            configuration_store::update_where(&tx, config_id, patch, Some(held_by_caller)).await?;
        if changed == 0 {
            let err = guard_failure(&tx, config_id).await?;
            tx.rollback()
                .await
                .persistence("rollback", ENTITY_CONFIGURATION, Some(config_id))?;
            tracing::info!(config_id, principal, error = %err, "Content update rejected");
            return Err(err);
        }

        let version = change.version.clone();
        let appended = history::append(
            &tx,
            NewHistory {
                uid: principal,
                configuration_id: config_id,
                change_log: change.change_log,
                content: change.content,
                version: change.version,
            },
        )
        .await;
        let history_id = match appended {
            Ok(id) => id,
            Err(err) => {
                tx.rollback()
                    .await
                    .persistence("rollback", ENTITY_CONFIGURATION, Some(config_id))?;
                return Err(err);
            }
        };

        tx.commit()
            .await
            .persistence("commit", ENTITY_CONFIGURATION, Some(config_id))?;

        tracing::info!(
            config_id,
            principal,
            history_id,
            version = %version,
            "Configuration content updated"
        );
        Ok(history_id)
    }
}
