//! Configuration publish records
//!
//! Append-only audit of which history snapshot became active. The
//! referential check and the accompanying configuration update live in the
//! publish service; this module only stores and reads rows.

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set,
};

use confvault_common::{ENTITY_CONFIGURATION_PUBLISH, PersistenceContext, Result};

use crate::entity::configuration_publish;
use crate::model::{NewPublish, Page, PageRequest};
use crate::now_unix;
use crate::query::{self, Conds};

/// Insert a publish record and return it
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    new: NewPublish,
) -> Result<configuration_publish::Model> {
    configuration_publish::ActiveModel {
        id: NotSet,
        uid: Set(new.uid),
        configuration_id: Set(new.configuration_id),
        configuration_history_id: Set(new.configuration_history_id),
        ctime: Set(now_unix()),
    }
    .insert(db)
    .await
    .persistence(
        "insert",
        ENTITY_CONFIGURATION_PUBLISH,
        Some(new.configuration_id),
    )
}

/// Most recent publish record of a configuration
pub async fn find_latest<C: ConnectionTrait>(
    db: &C,
    configuration_id: i64,
) -> Result<Option<configuration_publish::Model>> {
    configuration_publish::Entity::find()
        .filter(configuration_publish::Column::ConfigurationId.eq(configuration_id))
        .order_by_desc(configuration_publish::Column::Id)
        .one(db)
        .await
        .persistence(
            "find_latest",
            ENTITY_CONFIGURATION_PUBLISH,
            Some(configuration_id),
        )
}

/// Handle owning the connection the publish table is reached through
#[derive(Clone, Debug)]
pub struct PublishStore {
    db: DatabaseConnection,
}

impl PublishStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<configuration_publish::Model>> {
        configuration_publish::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .persistence("find_by_id", ENTITY_CONFIGURATION_PUBLISH, Some(id))
    }

    pub async fn get_by_condition(
        &self,
        conds: &Conds,
    ) -> Result<Option<configuration_publish::Model>> {
        query::find_one::<configuration_publish::Entity, _>(&self.db, conds).await
    }

    pub async fn list(&self, conds: &Conds) -> Result<Vec<configuration_publish::Model>> {
        query::find_all::<configuration_publish::Entity, _>(&self.db, conds).await
    }

    pub async fn list_page(
        &self,
        conds: &Conds,
        page: PageRequest,
    ) -> Result<Page<configuration_publish::Model>> {
        query::find_page::<configuration_publish::Entity, _>(&self.db, conds, page).await
    }

    pub async fn latest(&self, configuration_id: i64) -> Result<Option<configuration_publish::Model>> {
        find_latest(&self.db, configuration_id).await
    }
}
