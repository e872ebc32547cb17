//! Winning spins, created on a server-side win draw.
//!
//! `(fid, won_on)` is unique: at most one win per user per calendar day.
//! Status moves `pending` -> `sent` when the disbursement worker confirms
//! the token transfer.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "airdrop_winners")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub fid: i64,
    #[sea_orm(column_type = "String(StringLen::N(64))")]
    pub wallet_address: String,
    /// Name of the app discovered on the winning spin
    #[sea_orm(column_type = "String(StringLen::N(128))")]
    pub app_discovered: String,
    pub token_amount: i64,
    /// "pending" or "sent"
    #[sea_orm(column_type = "String(StringLen::N(16))")]
    pub status: String,
    #[sea_orm(column_type = "String(StringLen::N(128))", nullable)]
    pub transaction_hash: Option<String>,
    pub won_at: DateTimeWithTimeZone,
    pub won_on: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_SENT: &str = "sent";
