//! Airdrop spin handlers and administrative bookkeeping.
//!
//! The win draw happens here, server-side, against the configured
//! probability. A winning spin creates a `pending` winner row; the
//! disbursement worker sends the tokens out of band. The unique
//! `(fid, won_on)` constraint caps wins at one per user per day.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rand::Rng;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::eligibility::sanitize_wallet_address;
use crate::entities::airdrop_winner::{self, STATUS_PENDING, STATUS_SENT};
use crate::models::airdrop::{AirdropStatsBundle, AirdropStatsView, WinnerView};
use crate::state::{AppState, STATS_CACHE_KEY};

use super::HttpError;

pub const MAX_APP_NAME_LEN: usize = 128;
pub const RECENT_WINNERS_LIMIT: u64 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/record-winner", post(record_winner))
        .route("/stats", get(get_stats))
        .route("/clear-wins", post(clear_wins))
        .route("/reset-all", post(reset_all))
}

#[derive(Debug, Deserialize)]
struct RecordWinnerRequest {
    fid: i64,
    wallet_address: String,
    app_discovered: String,
}

#[derive(Debug, Serialize)]
struct SpinResponse {
    won: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    winner: Option<WinnerView>,
    message: String,
}

#[derive(Debug, Serialize)]
struct AdminDeleteResponse {
    success: bool,
    message: String,
    deleted_count: u64,
}

/// Run the server-side win draw for a completed spin and record a winner row
/// when it hits
async fn record_winner(
    State(state): State<AppState>,
    Json(request): Json<RecordWinnerRequest>,
) -> Result<Json<SpinResponse>, HttpError> {
    if request.fid < 1 {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "Invalid FID".to_string(),
        ));
    }
    let wallet_address = sanitize_wallet_address(&request.wallet_address)
        .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;
    let app_discovered = request.app_discovered.trim().to_string();
    if app_discovered.is_empty() {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "Missing required field: app_discovered".to_string(),
        ));
    }
    if app_discovered.len() > MAX_APP_NAME_LEN {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            format!("App name exceeds {MAX_APP_NAME_LEN} character limit"),
        ));
    }

    // The draw is never delegated to the client
    if !draw_wins(state.airdrop.win_probability, &mut rand::rng()) {
        return Ok(Json(SpinResponse {
            won: false,
            winner: None,
            message: "No win this time. Keep spinning!".to_string(),
        }));
    }

    let now = Utc::now();
    let winner = airdrop_winner::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        fid: Set(request.fid),
        wallet_address: Set(wallet_address),
        app_discovered: Set(app_discovered),
        token_amount: Set(state.airdrop.tokens_per_win as i64),
        status: Set(STATUS_PENDING.to_string()),
        transaction_hash: Set(None),
        won_at: Set(now.fixed_offset()),
        won_on: Set(now.date_naive()),
    };

    // One win per FID per day, enforced by the unique (fid, won_on) index
    let inserted = airdrop_winner::Entity::insert(winner)
        .exec_with_returning(&state.database)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => HttpError::new(
                StatusCode::CONFLICT,
                "This FID has already won an airdrop today".to_string(),
            ),
            _ => HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        })?;

    state.cache.invalidate_stats().await;

    info!(
        "Airdrop win: FID {} on {} ({} tokens pending)",
        inserted.fid, inserted.app_discovered, inserted.token_amount
    );

    Ok(Json(SpinResponse {
        won: true,
        winner: Some(WinnerView::from(&inserted)),
        message: "Winner recorded successfully".to_string(),
    }))
}

/// Aggregate winner statistics plus the ten most recent winners
async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<AirdropStatsBundle>, HttpError> {
    if let Some(cached) = state.cache.stats.get(&STATS_CACHE_KEY.to_string()).await {
        return Ok(Json((*cached).clone()));
    }

    let total_winners = airdrop_winner::Entity::find()
        .count(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let pending_winners = airdrop_winner::Entity::find()
        .filter(airdrop_winner::Column::Status.eq(STATUS_PENDING))
        .count(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let sent_winners = airdrop_winner::Entity::find()
        .filter(airdrop_winner::Column::Status.eq(STATUS_SENT))
        .count(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let today = Utc::now().date_naive();
    let today_winners = airdrop_winner::Entity::find()
        .filter(airdrop_winner::Column::WonOn.eq(today))
        .count(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let sums = airdrop_winner::Entity::find()
        .select_only()
        .column(airdrop_winner::Column::Status)
        .column_as(airdrop_winner::Column::TokenAmount.sum(), "total_amount")
        .group_by(airdrop_winner::Column::Status)
        .into_tuple::<(String, Option<i64>)>()
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let mut tokens_distributed = 0;
    let mut tokens_pending = 0;
    for (status, amount) in sums {
        match status.as_str() {
            STATUS_SENT => tokens_distributed = amount.unwrap_or(0),
            STATUS_PENDING => tokens_pending = amount.unwrap_or(0),
            other => warn!("Unknown winner status in stats: {other}"),
        }
    }

    let recent = airdrop_winner::Entity::find()
        .order_by_desc(airdrop_winner::Column::WonAt)
        .limit(RECENT_WINNERS_LIMIT)
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let bundle = AirdropStatsBundle {
        stats: AirdropStatsView {
            total_winners,
            pending_winners,
            sent_winners,
            today_winners,
            tokens_distributed,
            tokens_pending,
        },
        recent_winners: recent.iter().map(WinnerView::from).collect(),
    };

    state
        .cache
        .stats
        .insert(STATS_CACHE_KEY.to_string(), Arc::new(bundle.clone()))
        .await;

    Ok(Json(bundle))
}

/// Delete today's winner rows
async fn clear_wins(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AdminDeleteResponse>, HttpError> {
    require_admin(&state, &headers)?;

    let today = Utc::now().date_naive();
    let result = airdrop_winner::Entity::delete_many()
        .filter(airdrop_winner::Column::WonOn.eq(today))
        .exec(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    state.cache.invalidate_stats().await;
    info!("Cleared {} wins for {}", result.rows_affected, today);

    Ok(Json(AdminDeleteResponse {
        success: true,
        message: "Wins cleared successfully".to_string(),
        deleted_count: result.rows_affected,
    }))
}

/// Delete every winner row
async fn reset_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AdminDeleteResponse>, HttpError> {
    require_admin(&state, &headers)?;

    let result = airdrop_winner::Entity::delete_many()
        .exec(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    state.cache.invalidate_stats().await;
    info!("Reset airdrop data, {} rows deleted", result.rows_affected);

    Ok(Json(AdminDeleteResponse {
        success: true,
        message: "All airdrop data reset successfully".to_string(),
        deleted_count: result.rows_affected,
    }))
}

/// Win draw over a roll in `[0, 1)`. The bound is exclusive, so a
/// probability of 1.0 always wins.
fn draw_wins<R: Rng>(win_probability: f64, rng: &mut R) -> bool {
    rng.random::<f64>() < win_probability
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), HttpError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(HttpError::new(
            StatusCode::UNAUTHORIZED,
            "Administrative endpoints are disabled".to_string(),
        ));
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected => Ok(()),
        _ => Err(HttpError::new(
            StatusCode::UNAUTHORIZED,
            "Admin token required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn certain_probability_always_wins() {
        for seed in 0..256 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert!(draw_wins(1.0, &mut rng));
        }
    }

    #[test]
    fn even_odds_produce_both_outcomes() {
        let wins = (0..512)
            .filter(|seed| draw_wins(0.5, &mut StdRng::seed_from_u64(*seed)))
            .count();
        assert!(wins > 0);
        assert!(wins < 512);
    }

    #[test]
    fn raising_the_probability_never_turns_a_win_into_a_loss() {
        for seed in 0..256 {
            let low = draw_wins(0.05, &mut StdRng::seed_from_u64(seed));
            let high = draw_wins(0.5, &mut StdRng::seed_from_u64(seed));
            if low {
                assert!(high);
            }
        }
    }
}
