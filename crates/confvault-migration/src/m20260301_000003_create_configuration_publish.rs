use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConfigurationPublish::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConfigurationPublish::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ConfigurationPublish::Uid)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ConfigurationPublish::ConfigurationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConfigurationPublish::ConfigurationHistoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConfigurationPublish::Ctime)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_configuration_publish_configuration_id")
                    .table(ConfigurationPublish::Table)
                    .col(ConfigurationPublish::ConfigurationId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConfigurationPublish::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ConfigurationPublish {
    Table,
    Id,
    Uid,
    ConfigurationId,
    ConfigurationHistoryId,
    Ctime,
}
