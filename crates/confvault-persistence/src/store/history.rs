//! Configuration history log
//!
//! Append-only: there is no update or delete path for history rows.
//! `append` is generic over the connection so callers can run it inside the
//! same transaction as the content update it records.

use sea_orm::{ActiveValue::NotSet, ConnectionTrait, DatabaseConnection, EntityTrait, Set};
use serde::{Deserialize, Serialize};

use confvault_common::{ENTITY_CONFIGURATION_HISTORY, PersistenceContext, Result};

use crate::entity::{configuration, configuration_history};
use crate::model::{NewHistory, Page, PageRequest};
use crate::now_unix;
use crate::query::{self, Conds};
use crate::store::configuration as configuration_store;

/// Append a snapshot and return its id
pub async fn append<C: ConnectionTrait>(db: &C, new: NewHistory) -> Result<i64> {
    let configuration_id = new.configuration_id;
    let entity = configuration_history::ActiveModel {
        id: NotSet,
        uid: Set(new.uid),
        configuration_id: Set(new.configuration_id),
        change_log: Set(new.change_log),
        content: Set(new.content),
        version: Set(new.version),
        ctime: Set(now_unix()),
    };

    let id = configuration_history::Entity::insert(entity)
        .exec(db)
        .await
        .persistence(
            "append",
            ENTITY_CONFIGURATION_HISTORY,
            Some(configuration_id),
        )?
        .last_insert_id;

    tracing::debug!(id, configuration_id, "History appended");
    Ok(id)
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<configuration_history::Model>> {
    configuration_history::Entity::find_by_id(id)
        .one(db)
        .await
        .persistence("find_by_id", ENTITY_CONFIGURATION_HISTORY, Some(id))
}

/// A snapshot together with the configuration it belongs to.
///
/// The configuration is fetched with a second lookup and is `None` when it
/// has since been deleted; history outlives its configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryWithConfiguration {
    pub history: configuration_history::Model,
    pub configuration: Option<configuration::Model>,
}

/// Handle owning the connection the history table is reached through
#[derive(Clone, Debug)]
pub struct HistoryLog {
    db: DatabaseConnection,
}

impl HistoryLog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn append(&self, new: NewHistory) -> Result<i64> {
        append(&self.db, new).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<configuration_history::Model>> {
        find_by_id(&self.db, id).await
    }

    pub async fn get_by_condition(
        &self,
        conds: &Conds,
    ) -> Result<Option<configuration_history::Model>> {
        query::find_one::<configuration_history::Entity, _>(&self.db, conds).await
    }

    pub async fn list(&self, conds: &Conds) -> Result<Vec<configuration_history::Model>> {
        query::find_all::<configuration_history::Entity, _>(&self.db, conds).await
    }

    /// Most recent snapshots first; page 0 / size 0 mean page 1 / size 10
    pub async fn list_page(
        &self,
        conds: &Conds,
        page: PageRequest,
    ) -> Result<Page<configuration_history::Model>> {
        query::find_page::<configuration_history::Entity, _>(&self.db, conds, page).await
    }

    pub async fn get_with_configuration(&self, id: i64) -> Result<Option<HistoryWithConfiguration>> {
        let Some(history) = find_by_id(&self.db, id).await? else {
            return Ok(None);
        };
        let configuration = configuration_store::find_by_id(&self.db, history.configuration_id).await?;

        Ok(Some(HistoryWithConfiguration {
            history,
            configuration,
        }))
    }
}
