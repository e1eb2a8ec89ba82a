//! Configuration entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use confvault_common::{UNLOCKED_UID, UNSET_TIMESTAMP};

use crate::model::LockState;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "configuration")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub external_resource_id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub format: String,
    pub version: String,
    pub uid: i64,
    pub publish_time: i64,
    pub lock_uid: i64,
    pub lock_at: i64,
    pub ctime: i64,
    pub utime: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// File name the content is projected under, e.g. `app.yaml`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.format)
    }

    pub fn lock_state(&self) -> LockState {
        if self.lock_uid == UNLOCKED_UID {
            LockState::Unlocked
        } else {
            LockState::Locked {
                holder: self.lock_uid,
                since: self.lock_at,
            }
        }
    }

    pub fn is_locked_by(&self, uid: i64) -> bool {
        uid != UNLOCKED_UID && self.lock_uid == uid
    }

    pub fn is_published(&self) -> bool {
        self.publish_time != UNSET_TIMESTAMP
    }
}
