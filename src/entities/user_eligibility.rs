//! Per-user airdrop eligibility flags. One row per FID.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_eligibility")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Farcaster user identifier (unique)
    pub farcaster_id: i64,
    pub has_spun: bool,
    pub has_shared: bool,
    /// Derived: has_spun AND has_shared
    pub is_eligible: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
