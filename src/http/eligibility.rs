//! Eligibility and claim HTTP handlers.
//!
//! A user becomes eligible after reporting both a spin and a share, and may
//! then claim the configured token amount exactly once. Claim-once is
//! enforced by the unique FID constraint on `token_claims`: the insert either
//! lands or collides, there is no read-then-write window.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, SqlErr, UpdateMany,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::eligibility::{
    ClaimDecision, EligibilityAction, EligibilityFlags, decide_claim, sanitize_wallet_address,
};
use crate::entities::{token_claim, user_eligibility};
use crate::state::AppState;

use super::HttpError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/update-eligibility", post(update_eligibility))
        .route("/check-eligibility", post(check_eligibility))
        .route("/claim-tokens", post(claim_tokens))
}

#[derive(Debug, Deserialize)]
struct UpdateEligibilityRequest {
    farcaster_id: i64,
    action: EligibilityAction,
}

#[derive(Debug, Serialize)]
struct EligibilityResponse {
    success: bool,
    farcaster_id: i64,
    has_spun: bool,
    has_shared: bool,
    is_eligible: bool,
    newly_eligible: bool,
}

#[derive(Debug, Deserialize)]
struct CheckEligibilityRequest {
    farcaster_id: i64,
}

#[derive(Debug, Serialize)]
struct CheckEligibilityResponse {
    farcaster_id: i64,
    has_spun: bool,
    has_shared: bool,
    is_eligible: bool,
    has_claimed: bool,
    can_claim: bool,
    tokens_claimed: i64,
}

#[derive(Debug, Deserialize)]
struct ClaimTokensRequest {
    farcaster_id: i64,
    wallet_address: String,
}

#[derive(Debug, Serialize)]
struct ClaimTokensResponse {
    success: bool,
    farcaster_id: i64,
    wallet_address: String,
    tokens_claimed: i64,
    claim_id: i64,
    transaction_hash: String,
    gas_used: u64,
    message: String,
}

/// Record a spin or share action and recompute eligibility
async fn update_eligibility(
    State(state): State<AppState>,
    Json(request): Json<UpdateEligibilityRequest>,
) -> Result<Json<EligibilityResponse>, HttpError> {
    if request.farcaster_id < 1 {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "Farcaster ID is required".to_string(),
        ));
    }

    let existing = user_eligibility::Entity::find()
        .filter(user_eligibility::Column::FarcasterId.eq(request.farcaster_id))
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    let was_eligible = existing.as_ref().is_some_and(|record| record.is_eligible);

    let now_fixed = Utc::now().fixed_offset();
    if existing.is_none() {
        let flags = EligibilityFlags::default().apply(request.action);
        let record = user_eligibility::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            farcaster_id: Set(request.farcaster_id),
            has_spun: Set(flags.has_spun),
            has_shared: Set(flags.has_shared),
            is_eligible: Set(flags.is_eligible()),
            created_at: Set(now_fixed),
            updated_at: Set(now_fixed),
        };

        match user_eligibility::Entity::insert(record)
            .exec_with_returning(&state.database)
            .await
        {
            Ok(inserted) => {
                return Ok(Json(EligibilityResponse {
                    success: true,
                    farcaster_id: request.farcaster_id,
                    has_spun: inserted.has_spun,
                    has_shared: inserted.has_shared,
                    is_eligible: inserted.is_eligible,
                    newly_eligible: false,
                }));
            }
            // Lost the creation race: another request inserted the row
            // first. Fall through to the column-level update.
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {}
            Err(err) => {
                return Err(HttpError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.to_string(),
                ));
            }
        }
    }

    let result = eligibility_update(request.farcaster_id, request.action, now_fixed)
        .exec(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    if result.rows_affected == 0 {
        return Err(HttpError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Eligibility row disappeared during update".to_string(),
        ));
    }

    let updated = user_eligibility::Entity::find()
        .filter(user_eligibility::Column::FarcasterId.eq(request.farcaster_id))
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Eligibility row disappeared during update".to_string(),
            )
        })?;

    Ok(Json(EligibilityResponse {
        success: true,
        farcaster_id: request.farcaster_id,
        has_spun: updated.has_spun,
        has_shared: updated.has_shared,
        is_eligible: updated.is_eligible,
        newly_eligible: updated.is_eligible && !was_eligible,
    }))
}

/// Column-level eligibility update. Only the acted-on flag is written and
/// `is_eligible` is derived from the stored value of the other flag inside
/// the same statement, so concurrent spin and share reports for one FID
/// cannot overwrite each other's flag.
fn eligibility_update(
    farcaster_id: i64,
    action: EligibilityAction,
    now: DateTimeWithTimeZone,
) -> UpdateMany<user_eligibility::Entity> {
    let (acted, other) = match action {
        EligibilityAction::Spin => (
            user_eligibility::Column::HasSpun,
            user_eligibility::Column::HasShared,
        ),
        EligibilityAction::Share => (
            user_eligibility::Column::HasShared,
            user_eligibility::Column::HasSpun,
        ),
    };
    user_eligibility::Entity::update_many()
        .col_expr(acted, Expr::value(true))
        .col_expr(user_eligibility::Column::IsEligible, Expr::col(other).into())
        .col_expr(user_eligibility::Column::UpdatedAt, Expr::value(now))
        .filter(user_eligibility::Column::FarcasterId.eq(farcaster_id))
}

/// Report the full eligibility and claim status for a user
async fn check_eligibility(
    State(state): State<AppState>,
    Json(request): Json<CheckEligibilityRequest>,
) -> Result<Json<CheckEligibilityResponse>, HttpError> {
    if request.farcaster_id < 1 {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "Farcaster ID is required".to_string(),
        ));
    }

    let eligibility = user_eligibility::Entity::find()
        .filter(user_eligibility::Column::FarcasterId.eq(request.farcaster_id))
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let claim = token_claim::Entity::find()
        .filter(token_claim::Column::FarcasterId.eq(request.farcaster_id))
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let has_spun = eligibility.as_ref().is_some_and(|e| e.has_spun);
    let has_shared = eligibility.as_ref().is_some_and(|e| e.has_shared);
    let is_eligible = eligibility.as_ref().is_some_and(|e| e.is_eligible);

    Ok(Json(CheckEligibilityResponse {
        farcaster_id: request.farcaster_id,
        has_spun,
        has_shared,
        is_eligible,
        has_claimed: claim.is_some(),
        can_claim: is_eligible && claim.is_none(),
        tokens_claimed: claim.map(|c| c.tokens_claimed).unwrap_or(0),
    }))
}

/// Convert eligibility into the one-time token transfer
async fn claim_tokens(
    State(state): State<AppState>,
    Json(request): Json<ClaimTokensRequest>,
) -> Result<Json<ClaimTokensResponse>, HttpError> {
    if request.farcaster_id < 1 {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "Farcaster ID is required".to_string(),
        ));
    }
    let wallet_address = sanitize_wallet_address(&request.wallet_address)
        .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;

    let eligibility = user_eligibility::Entity::find()
        .filter(user_eligibility::Column::FarcasterId.eq(request.farcaster_id))
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let flags = eligibility.map(|record| EligibilityFlags {
        has_spun: record.has_spun,
        has_shared: record.has_shared,
    });
    match decide_claim(flags) {
        ClaimDecision::NoRecord => {
            return Err(HttpError::new(
                StatusCode::NOT_FOUND,
                "User not found".to_string(),
            ));
        }
        ClaimDecision::NotEligible => {
            return Err(HttpError::new(
                StatusCode::FORBIDDEN,
                "User is not eligible for token claim".to_string(),
            ));
        }
        ClaimDecision::Approved => {}
    }

    let tokens_claimed = state.airdrop.tokens_per_claim as i64;
    let claim = token_claim::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        farcaster_id: Set(request.farcaster_id),
        wallet_address: Set(wallet_address.clone()),
        tokens_claimed: Set(tokens_claimed),
        transaction_hash: Set(None),
        claimed_at: Set(Utc::now().fixed_offset()),
    };

    // The unique FID constraint is the claim-once guarantee: a concurrent
    // duplicate surfaces here as a constraint violation
    let inserted = token_claim::Entity::insert(claim)
        .exec_with_returning(&state.database)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => HttpError::new(
                StatusCode::CONFLICT,
                "User has already claimed tokens".to_string(),
            ),
            _ => HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        })?;

    let receipt = disburse_claim(&state, &wallet_address, state.airdrop.tokens_per_claim)
        .await
        .map_err(|err| {
            // The claim row stays, blocking a retry from double-spending,
            // but the transfer itself did not confirm
            warn!(
                "Claim {} recorded without transfer for FID {}: {}",
                inserted.id, request.farcaster_id, err.message
            );
            err
        })?;

    let mut active = inserted.clone().into_active_model();
    active.transaction_hash = Set(Some(receipt.tx_hash.clone()));
    active
        .update(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!(
        "Claim fulfilled: {} tokens to {} for FID {} (tx: {})",
        tokens_claimed, wallet_address, request.farcaster_id, receipt.tx_hash
    );

    Ok(Json(ClaimTokensResponse {
        success: true,
        farcaster_id: request.farcaster_id,
        wallet_address,
        tokens_claimed,
        claim_id: inserted.id,
        transaction_hash: receipt.tx_hash,
        gas_used: receipt.gas_used,
        message: "Tokens sent! They should arrive within a few seconds.".to_string(),
    }))
}

async fn disburse_claim(
    state: &AppState,
    wallet_address: &str,
    amount: u64,
) -> Result<crate::chain::TransferReceipt, HttpError> {
    let wallet = state
        .chain
        .wallet_status()
        .await
        .map_err(|err| HttpError::new(StatusCode::BAD_GATEWAY, err.to_string()))?;

    if wallet.balance < amount {
        return Err(HttpError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Airdrop wallet balance is insufficient".to_string(),
        ));
    }

    state
        .chain
        .transfer_tokens(wallet_address, amount)
        .await
        .map_err(|err| {
            HttpError::new(
                StatusCode::BAD_GATEWAY,
                format!("Token transfer failed: {err}"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    fn update_sql(action: EligibilityAction) -> String {
        let now = Utc::now().fixed_offset();
        eligibility_update(7, action, now)
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn spin_update_leaves_the_share_flag_untouched() {
        let sql = update_sql(EligibilityAction::Spin);
        assert!(sql.contains(r#""has_spun" = TRUE"#));
        assert!(sql.contains(r#""is_eligible" = "has_shared""#));
        assert!(!sql.contains(r#""has_shared" = TRUE"#));
        assert!(!sql.contains(r#""has_shared" = FALSE"#));
    }

    #[test]
    fn share_update_leaves_the_spin_flag_untouched() {
        let sql = update_sql(EligibilityAction::Share);
        assert!(sql.contains(r#""has_shared" = TRUE"#));
        assert!(sql.contains(r#""is_eligible" = "has_spun""#));
        assert!(!sql.contains(r#""has_spun" = TRUE"#));
        assert!(!sql.contains(r#""has_spun" = FALSE"#));
    }

    #[test]
    fn update_targets_a_single_fid() {
        let sql = update_sql(EligibilityAction::Spin);
        assert!(sql.contains(r#""farcaster_id" = 7"#));
    }
}
