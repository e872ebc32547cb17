//! Directory HTTP handlers: listing, random pick, and submission.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder, SqlErr};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::directory::{
    MAX_EXCLUDE_IDS, app_slug_from_url, canonicalize_app_name, canonicalize_description,
    display_name_from_slug, pick_index,
};
use crate::entities::mini_app;
use crate::models::directory::MiniAppView;
use crate::state::{AppState, DIRECTORY_CACHE_KEY};

use super::HttpError;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_apps).post(pick_app).put(submit_app))
}

#[derive(Debug, Serialize)]
struct DirectoryResponse {
    apps: Vec<MiniAppView>,
    total: u64,
}

#[derive(Debug, Deserialize, Default)]
struct PickRequest {
    #[serde(default, alias = "excludeIds")]
    exclude_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct PickResponse {
    app: MiniAppView,
    total_apps: u64,
    /// Signals the caller to clear its shown-app history
    reset: bool,
}

#[derive(Debug, Deserialize)]
struct SubmitAppRequest {
    url: String,
    name: Option<String>,
    description: Option<String>,
    creator: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitAppResponse {
    success: bool,
    app: MiniAppView,
    total_apps: u64,
}

/// List the full directory
async fn list_apps(State(state): State<AppState>) -> Result<Json<DirectoryResponse>, HttpError> {
    let apps = load_directory(&state).await?;
    let total = apps.len() as u64;
    Ok(Json(DirectoryResponse {
        apps: (*apps).clone(),
        total,
    }))
}

/// Pick a random app outside the caller's exclusion set
async fn pick_app(
    State(state): State<AppState>,
    Json(request): Json<PickRequest>,
) -> Result<Json<PickResponse>, HttpError> {
    if request.exclude_ids.len() > MAX_EXCLUDE_IDS {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            format!("Exclusion set exceeds {MAX_EXCLUDE_IDS} entries"),
        ));
    }

    let apps = load_directory(&state).await?;
    if apps.is_empty() {
        return Err(HttpError::new(
            StatusCode::NOT_FOUND,
            "No apps available".to_string(),
        ));
    }

    let ids: Vec<i64> = apps.iter().map(|app| app.id).collect();
    let exclude: HashSet<i64> = request.exclude_ids.into_iter().collect();
    let mut rng = rand::rng();
    // Directory is non-empty here, so the pick cannot fail
    let pick = pick_index(&ids, &exclude, &mut rng).ok_or_else(|| {
        HttpError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Pick over non-empty directory failed".to_string(),
        )
    })?;

    Ok(Json(PickResponse {
        app: apps[pick.index].clone(),
        total_apps: apps.len() as u64,
        reset: pick.reset,
    }))
}

/// Submit a new app to the directory
async fn submit_app(
    State(state): State<AppState>,
    Json(request): Json<SubmitAppRequest>,
) -> Result<Json<SubmitAppResponse>, HttpError> {
    let slug = app_slug_from_url(&request.url)
        .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;

    let name = match &request.name {
        Some(provided) => canonicalize_app_name(provided)
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?,
        None => None,
    };
    let name = name.unwrap_or_else(|| display_name_from_slug(&slug));

    let description = match &request.description {
        Some(provided) => canonicalize_description(provided)
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?,
        None => None,
    };

    let now_fixed = Utc::now().fixed_offset();
    let new_app = mini_app::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        app_id: sea_orm::ActiveValue::Set(slug.clone()),
        name: sea_orm::ActiveValue::Set(name),
        description: sea_orm::ActiveValue::Set(description),
        mini_app_url: sea_orm::ActiveValue::Set(request.url.trim().to_string()),
        creator: sea_orm::ActiveValue::Set(
            request.creator.as_deref().map(|c| c.trim().to_string()),
        ),
        category: sea_orm::ActiveValue::Set(
            request.category.as_deref().map(|c| c.trim().to_string()),
        ),
        added_at: sea_orm::ActiveValue::Set(now_fixed),
        updated_at: sea_orm::ActiveValue::Set(now_fixed),
    };

    // Unique constraints on URL and slug make duplicate submission a
    // constraint violation instead of a lookup race
    let inserted = mini_app::Entity::insert(new_app)
        .exec_with_returning(&state.database)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => HttpError::new(
                StatusCode::CONFLICT,
                "This app is already in the directory".to_string(),
            ),
            _ => HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        })?;

    state.cache.invalidate_directory().await;

    let total_apps = mini_app::Entity::find()
        .count(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!(
        "Directory submission: {} ({})",
        inserted.app_id, inserted.mini_app_url
    );

    Ok(Json(SubmitAppResponse {
        success: true,
        app: MiniAppView::from(&inserted),
        total_apps,
    }))
}

async fn load_directory(state: &AppState) -> Result<Arc<Vec<MiniAppView>>, HttpError> {
    if let Some(cached) = state
        .cache
        .directory
        .get(&DIRECTORY_CACHE_KEY.to_string())
        .await
    {
        return Ok(cached);
    }

    let models = mini_app::Entity::find()
        .order_by_asc(mini_app::Column::Id)
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let views: Vec<MiniAppView> = models.iter().map(MiniAppView::from).collect();
    let arc_views = Arc::new(views);
    state
        .cache
        .directory
        .insert(DIRECTORY_CACHE_KEY.to_string(), Arc::clone(&arc_views))
        .await;

    Ok(arc_views)
}
