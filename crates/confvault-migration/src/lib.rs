//! Confvault Migration - schema for the configuration tables
//!
//! Run with `Migrator::up(&db, None)`; the `confvault migrate` command and the
//! test suites both go through here.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_configuration;
mod m20260301_000002_create_configuration_history;
mod m20260301_000003_create_configuration_publish;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_configuration::Migration),
            Box::new(m20260301_000002_create_configuration_history::Migration),
            Box::new(m20260301_000003_create_configuration_publish::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_orm::{ConnectOptions, Database};

    #[tokio::test]
    async fn test_migrations_up_and_down() {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1);
        let db = Database::connect(opt).await.unwrap();

        Migrator::up(&db, None).await.unwrap();
        let manager = SchemaManager::new(&db);
        assert!(manager.has_table("configuration").await.unwrap());
        assert!(manager.has_table("configuration_history").await.unwrap());
        assert!(manager.has_table("configuration_publish").await.unwrap());

        Migrator::down(&db, None).await.unwrap();
        assert!(!manager.has_table("configuration").await.unwrap());
        assert!(!manager.has_table("configuration_publish").await.unwrap());
    }
}
