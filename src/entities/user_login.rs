use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_logins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub farcaster_id: i64,
    #[sea_orm(column_type = "String(StringLen::N(64))", nullable)]
    pub wallet_address: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(32))")]
    pub login_method: String,
    pub login_timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
