use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::Expr;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Winning spins awaiting (or past) token disbursement
        manager
            .create_table(
                Table::create()
                    .table(AirdropWinners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AirdropWinners::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AirdropWinners::Fid)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AirdropWinners::WalletAddress)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AirdropWinners::AppDiscovered)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AirdropWinners::TokenAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AirdropWinners::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AirdropWinners::TransactionHash).string_len(128))
                    .col(
                        ColumnDef::new(AirdropWinners::WonAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AirdropWinners::WonOn).date().not_null())
                    .to_owned(),
            )
            .await?;

        // One win per FID per calendar day
        manager
            .create_index(
                Index::create()
                    .name("idx_airdrop_winners_fid_day")
                    .table(AirdropWinners::Table)
                    .col(AirdropWinners::Fid)
                    .col(AirdropWinners::WonOn)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index for the disbursement worker's pending scan
        manager
            .create_index(
                Index::create()
                    .name("idx_airdrop_winners_status_time")
                    .table(AirdropWinners::Table)
                    .col(AirdropWinners::Status)
                    .col(AirdropWinners::WonAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AirdropWinners::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AirdropWinners {
    Table,
    Id,
    Fid,
    WalletAddress,
    AppDiscovered,
    TokenAmount,
    Status,
    TransactionHash,
    WonAt,
    WonOn,
}
