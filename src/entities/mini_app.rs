//! Mini-app directory entity. One row per submitted app, unique on URL.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mini_apps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Slug extracted from the mini-app URL
    #[sea_orm(column_type = "String(StringLen::N(64))")]
    pub app_id: String,
    #[sea_orm(column_type = "String(StringLen::N(128))")]
    pub name: String,
    #[sea_orm(column_type = "String(StringLen::N(512))", nullable)]
    pub description: Option<String>,
    /// Canonical launch URL (unique)
    #[sea_orm(column_type = "String(StringLen::N(256))")]
    pub mini_app_url: String,
    #[sea_orm(column_type = "String(StringLen::N(64))", nullable)]
    pub creator: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(32))", nullable)]
    pub category: Option<String>,
    pub added_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
