//! Shared fixtures for the service tests

#![allow(dead_code)]

use confvault_migration::{Migrator, MigratorTrait};
use confvault_persistence::{ConfigurationStore, NewConfiguration};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Fresh in-memory database with the schema applied.
///
/// One pooled connection: each SQLite in-memory connection is its own database.
pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opt).await.expect("sqlite connection failed");
    Migrator::up(&db, None).await.expect("migration failed");
    db
}

/// Create a yaml configuration owned by user 1 and return its id
pub async fn create_config(db: &DatabaseConnection, name: &str, content: &str) -> i64 {
    ConfigurationStore::new(db.clone())
        .create(NewConfiguration {
            external_resource_id: 0,
            name: name.to_string(),
            content: content.to_string(),
            format: "yaml".to_string(),
            version: String::new(),
            uid: 1,
        })
        .await
        .expect("create configuration failed")
}
