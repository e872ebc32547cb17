use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::Expr;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Directory of submitted mini-apps
        manager
            .create_table(
                Table::create()
                    .table(MiniApps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MiniApps::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MiniApps::AppId)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(MiniApps::Name).string_len(128).not_null())
                    .col(ColumnDef::new(MiniApps::Description).string_len(512))
                    // Uniqueness on the canonical URL makes duplicate submission
                    // a constraint violation rather than a check-then-insert.
                    .col(
                        ColumnDef::new(MiniApps::MiniAppUrl)
                            .string_len(256)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(MiniApps::Creator).string_len(64))
                    .col(ColumnDef::new(MiniApps::Category).string_len(32))
                    .col(
                        ColumnDef::new(MiniApps::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MiniApps::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index for category browsing
        manager
            .create_index(
                Index::create()
                    .name("idx_mini_apps_category")
                    .table(MiniApps::Table)
                    .col(MiniApps::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MiniApps::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MiniApps {
    Table,
    Id,
    AppId,
    Name,
    Description,
    MiniAppUrl,
    Creator,
    Category,
    AddedAt,
    UpdatedAt,
}
