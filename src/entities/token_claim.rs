//! Token claim entity. The unique FID column enforces claim-once.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "token_claims")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Farcaster user identifier (unique)
    pub farcaster_id: i64,
    #[sea_orm(column_type = "String(StringLen::N(64))")]
    pub wallet_address: String,
    /// Whole tokens credited by this claim
    pub tokens_claimed: i64,
    /// Set once the transfer confirms; absent while the transfer is pending
    #[sea_orm(column_type = "String(StringLen::N(128))", nullable)]
    pub transaction_hash: Option<String>,
    pub claimed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
