use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::Expr;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Per-user eligibility flags, one row per FID
        manager
            .create_table(
                Table::create()
                    .table(UserEligibility::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserEligibility::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserEligibility::FarcasterId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(UserEligibility::HasSpun)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(UserEligibility::HasShared)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(UserEligibility::IsEligible)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(UserEligibility::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(UserEligibility::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Token claims, at most one per FID for the lifetime of the airdrop.
        // The unique key is the claim-once guarantee.
        manager
            .create_table(
                Table::create()
                    .table(TokenClaims::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TokenClaims::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TokenClaims::FarcasterId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(TokenClaims::WalletAddress)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TokenClaims::TokensClaimed)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TokenClaims::TransactionHash).string_len(128))
                    .col(
                        ColumnDef::new(TokenClaims::ClaimedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_token_claims_wallet")
                    .table(TokenClaims::Table)
                    .col(TokenClaims::WalletAddress)
                    .to_owned(),
            )
            .await?;

        // Login audit trail
        manager
            .create_table(
                Table::create()
                    .table(UserLogins::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserLogins::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserLogins::FarcasterId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserLogins::WalletAddress).string_len(64))
                    .col(
                        ColumnDef::new(UserLogins::LoginMethod)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserLogins::LoginTimestamp)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_logins_fid_time")
                    .table(UserLogins::Table)
                    .col(UserLogins::FarcasterId)
                    .col(UserLogins::LoginTimestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserLogins::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TokenClaims::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserEligibility::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserEligibility {
    Table,
    Id,
    FarcasterId,
    HasSpun,
    HasShared,
    IsEligible,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TokenClaims {
    Table,
    Id,
    FarcasterId,
    WalletAddress,
    TokensClaimed,
    TransactionHash,
    ClaimedAt,
}

#[derive(DeriveIden)]
enum UserLogins {
    Table,
    Id,
    FarcasterId,
    WalletAddress,
    LoginMethod,
    LoginTimestamp,
}
