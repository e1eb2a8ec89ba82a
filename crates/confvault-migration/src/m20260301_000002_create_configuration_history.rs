use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConfigurationHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConfigurationHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ConfigurationHistory::Uid)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ConfigurationHistory::ConfigurationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConfigurationHistory::ChangeLog)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConfigurationHistory::Content)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConfigurationHistory::Version)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ConfigurationHistory::Ctime)
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
                    .name("idx_configuration_history_configuration_id")
                    .table(ConfigurationHistory::Table)
                    .col(ConfigurationHistory::ConfigurationId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConfigurationHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ConfigurationHistory {
    Table,
    Id,
    Uid,
    ConfigurationId,
    ChangeLog,
    Content,
    Version,
    Ctime,
}
