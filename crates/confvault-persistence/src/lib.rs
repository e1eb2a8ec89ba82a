//! Confvault Persistence - Database entities, query engine, and stores
//!
//! This crate provides:
//! - SeaORM entity definitions for configurations, history, and publish records
//! - The condition-mapping query engine shared by every lookup
//! - `ConfigurationStore`, `HistoryLog`, and `PublishStore` persistence primitives

pub mod entity;
pub mod model;
pub mod query;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export sea-orm for convenience
pub use sea_orm;

// Re-export entity prelude
pub use entity::prelude::*;

// Re-export model types
pub use model::{
    ConfigurationPatch, LockPair, LockState, NewConfiguration, NewHistory, NewPublish, Page,
    PageRequest,
};

// Re-export query engine
pub use query::{CompiledQuery, Conds};

// Re-export stores
pub use store::{ConfigurationStore, HistoryLog, PublishStore};

/// Current wall-clock time as epoch seconds, the unit of every timestamp column
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
