use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::mini_app;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiniAppView {
    pub id: i64,
    pub app_id: String,
    pub name: String,
    pub description: Option<String>,
    pub mini_app_url: String,
    pub creator: Option<String>,
    pub category: Option<String>,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&mini_app::Model> for MiniAppView {
    fn from(model: &mini_app::Model) -> Self {
        Self {
            id: model.id,
            app_id: model.app_id.clone(),
            name: model.name.clone(),
            description: model.description.clone(),
            mini_app_url: model.mini_app_url.clone(),
            creator: model.creator.clone(),
            category: model.category.clone(),
            added_at: model.added_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
