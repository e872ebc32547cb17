//! Farcaster session handlers.
//!
//! `/me` (and its `/auth` alias) turn a Quick Auth bearer token into
//! `{fid, primary_address, username}`. Verification is bound to the domain
//! the request arrived on, so a token minted for another host is rejected.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::eligibility::sanitize_wallet_address;
use crate::entities::user_login;
use crate::farcaster::{AuthError, ResolvedUser};
use crate::state::AppState;

use super::HttpError;

pub const MAX_LOGIN_METHOD_LEN: usize = 32;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/auth", get(me).post(me))
        .route("/log-login", post(log_login))
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ResolvedUser>, HttpError> {
    let token = bearer_token(&headers)?;
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let domain = domain_from_host(host);

    let fid = state
        .farcaster
        .verify_session(token, &domain)
        .await
        .map_err(|err| match err {
            AuthError::InvalidToken(detail) => HttpError::new(
                StatusCode::UNAUTHORIZED,
                format!("Invalid token: {detail}"),
            ),
            AuthError::Provider(detail) => {
                HttpError::new(StatusCode::BAD_GATEWAY, detail)
            }
        })?;

    if let Some(cached) = state.cache.users.get(&fid).await {
        return Ok(Json((*cached).clone()));
    }

    let user = state.farcaster.resolve_user(fid).await;
    state
        .cache
        .users
        .insert(fid, Arc::new(user.clone()))
        .await;

    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
struct LogLoginRequest {
    farcaster_id: i64,
    wallet_address: Option<String>,
    login_method: Option<String>,
}

#[derive(Debug, Serialize)]
struct LogLoginResponse {
    success: bool,
    login_id: i64,
}

async fn log_login(
    State(state): State<AppState>,
    Json(request): Json<LogLoginRequest>,
) -> Result<Json<LogLoginResponse>, HttpError> {
    if request.farcaster_id < 1 {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "Farcaster ID is required".to_string(),
        ));
    }

    let wallet_address = match request.wallet_address.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(
            sanitize_wallet_address(raw)
                .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?,
        ),
        _ => None,
    };

    let login_method = request
        .login_method
        .as_deref()
        .map(str::trim)
        .filter(|method| !method.is_empty())
        .unwrap_or("unknown")
        .to_string();
    if login_method.len() > MAX_LOGIN_METHOD_LEN {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            format!("Login method exceeds {MAX_LOGIN_METHOD_LEN} character limit"),
        ));
    }

    let record = user_login::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        farcaster_id: sea_orm::ActiveValue::Set(request.farcaster_id),
        wallet_address: sea_orm::ActiveValue::Set(wallet_address),
        login_method: sea_orm::ActiveValue::Set(login_method.clone()),
        login_timestamp: sea_orm::ActiveValue::Set(Utc::now().fixed_offset()),
    };

    let inserted = user_login::Entity::insert(record)
        .exec(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!(
        "Login logged for FID {} via {}",
        request.farcaster_id, login_method
    );

    Ok(Json(LogLoginResponse {
        success: true,
        login_id: inserted.last_insert_id,
    }))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, HttpError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            HttpError::new(
                StatusCode::UNAUTHORIZED,
                "Missing authorization header".to_string(),
            )
        })?;
    authorization.strip_prefix("Bearer ").ok_or_else(|| {
        HttpError::new(
            StatusCode::UNAUTHORIZED,
            "Authorization header must be a bearer token".to_string(),
        )
    })
}

/// Token verification domain for the host a request arrived on. Local hosts
/// verify against http, everything else https.
fn domain_from_host(host: &str) -> String {
    if host.starts_with("localhost") || host.starts_with("127.") {
        format!("http://{host}")
    } else {
        format!("https://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_domains() {
        assert_eq!(domain_from_host("localhost:3000"), "http://localhost:3000");
        assert_eq!(domain_from_host("127.0.0.1:8080"), "http://127.0.0.1:8080");
        assert_eq!(
            domain_from_host("roulette.example.com"),
            "https://roulette.example.com"
        );
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");
    }
}
