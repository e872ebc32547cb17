//! Client for the Farcaster identity provider.
//!
//! Token verification is delegated to the Quick Auth service, bound to the
//! domain the request arrived on. Primary-address and username resolution go
//! through the public REST API; a missing address or profile is tolerated and
//! surfaces as a null field, not an error.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::FarcasterConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider examined the token and rejected it
    #[error("Invalid session token: {0}")]
    InvalidToken(String),
    /// The provider could not be reached or answered out of contract
    #[error("Identity provider failure: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedUser {
    pub fid: i64,
    pub primary_address: Option<String>,
    pub username: Option<String>,
}

#[derive(Clone)]
pub struct FarcasterClient {
    http: reqwest::Client,
    auth_url: String,
    api_url: String,
}

impl FarcasterClient {
    pub fn new(config: &FarcasterConfig) -> Result<Self> {
        let timeout = config.request_timeout();
        assert!(
            timeout >= Duration::from_millis(100),
            "Timeout below 100ms is unsafe"
        );

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Farcaster HTTP client")?;

        Ok(Self {
            http,
            auth_url: config.auth_url.trim_end_matches('/').to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Validate a Quick Auth bearer token for `domain` and return the FID it
    /// was issued to. There is no fallback identity: a provider outage is an
    /// error, never an anonymous or placeholder user.
    pub async fn verify_session(&self, token: &str, domain: &str) -> Result<i64, AuthError> {
        assert!(!domain.is_empty(), "Verification domain must be provided");
        if token.is_empty() {
            return Err(AuthError::InvalidToken("Empty bearer token".to_string()));
        }

        let url = format!("{}/verify-token", self.auth_url);
        let response = self
            .http
            .post(&url)
            .json(&VerifyTokenRequest { token, domain })
            .send()
            .await
            .map_err(|err| AuthError::Provider(err.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "token rejected".to_string());
            return Err(AuthError::InvalidToken(detail));
        }
        if !status.is_success() {
            return Err(AuthError::Provider(format!(
                "Verification endpoint returned {status}"
            )));
        }

        let payload: VerifyTokenResponse = response
            .json()
            .await
            .map_err(|err| AuthError::Provider(err.to_string()))?;
        if payload.fid < 1 {
            return Err(AuthError::Provider(format!(
                "Provider returned invalid FID {}",
                payload.fid
            )));
        }
        Ok(payload.fid)
    }

    /// Resolve the primary wallet address and username for a FID. Both
    /// lookups are best-effort.
    pub async fn resolve_user(&self, fid: i64) -> ResolvedUser {
        assert!(fid >= 1, "FID must be positive");
        let primary_address = self.fetch_primary_address(fid).await;
        let username = self.fetch_username(fid).await;
        ResolvedUser {
            fid,
            primary_address,
            username,
        }
    }

    async fn fetch_primary_address(&self, fid: i64) -> Option<String> {
        let url = format!(
            "{}/fc/primary-address?fid={fid}&protocol=ethereum",
            self.api_url
        );
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<PrimaryAddressResponse>().await {
                    Ok(payload) => Some(payload.result.address.address),
                    Err(err) => {
                        debug!("Malformed primary-address response for FID {fid}: {err}");
                        None
                    }
                }
            }
            Ok(response) => {
                debug!(
                    "Primary-address lookup for FID {fid} returned {}",
                    response.status()
                );
                None
            }
            Err(err) => {
                debug!("Primary-address lookup for FID {fid} failed: {err}");
                None
            }
        }
    }

    async fn fetch_username(&self, fid: i64) -> Option<String> {
        let url = format!("{}/v2/user?fid={fid}", self.api_url);
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<UserResponse>().await {
                    Ok(payload) => Some(payload.result.user.username),
                    Err(err) => {
                        debug!("Malformed user response for FID {fid}: {err}");
                        None
                    }
                }
            }
            Ok(response) => {
                debug!("User lookup for FID {fid} returned {}", response.status());
                None
            }
            Err(err) => {
                debug!("User lookup for FID {fid} failed: {err}");
                None
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct VerifyTokenRequest<'a> {
    token: &'a str,
    domain: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyTokenResponse {
    fid: i64,
}

#[derive(Debug, Deserialize)]
struct PrimaryAddressResponse {
    result: PrimaryAddressResult,
}

#[derive(Debug, Deserialize)]
struct PrimaryAddressResult {
    address: PrimaryAddressRecord,
}

#[derive(Debug, Deserialize)]
struct PrimaryAddressRecord {
    address: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    result: UserResult,
}

#[derive(Debug, Deserialize)]
struct UserResult {
    user: UserRecord,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    username: String,
}
