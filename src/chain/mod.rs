//! JSON-RPC client for the token wallet service.
//!
//! The service holds the airdrop wallet key and exposes two methods: a status
//! call reporting the wallet address and spendable token balance, and a
//! transfer call that submits an ERC-20 transfer and waits for confirmation.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::Deserialize;

#[derive(Clone)]
pub struct ChainClient {
    inner: HttpClient,
    timeout: Duration,
}

impl ChainClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        assert!(!endpoint.is_empty(), "RPC endpoint must be provided");
        assert!(
            timeout >= Duration::from_millis(100),
            "Timeout below 100ms is unsafe"
        );

        let client = HttpClientBuilder::default()
            .request_timeout(timeout)
            .build(endpoint)
            .with_context(|| format!("Failed to build RPC client for {endpoint}"))?;

        Ok(Self {
            inner: client,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        assert!(
            self.timeout >= Duration::from_millis(100),
            "Timeout invariant broken"
        );
        assert!(
            self.timeout <= Duration::from_secs(60),
            "Timeout exceeds maximum bound"
        );
        self.timeout
    }

    /// Fetch the airdrop wallet address and its current token balance
    pub async fn wallet_status(&self) -> Result<WalletStatusResponse> {
        let response: WalletStatusResponse = self
            .inner
            .request("wallet_status", rpc_params![])
            .await
            .context("RPC call wallet_status failed")?;
        validate_wallet_status(response)
    }

    /// Submit a token transfer and wait for its receipt. No idempotency key
    /// exists: callers must not blindly retry a transfer whose outcome is
    /// unknown.
    pub async fn transfer_tokens(&self, recipient: &str, amount: u64) -> Result<TransferReceipt> {
        assert!(!recipient.is_empty(), "Recipient address must be provided");
        assert!(amount > 0, "Transfer amount must be positive");
        assert!(
            amount <= 1_000_000,
            "Transfer amount exceeds defensive limit"
        );

        let response: TransferReceipt = self
            .inner
            .request("wallet_transferTokens", rpc_params![recipient, amount])
            .await
            .context("RPC call wallet_transferTokens failed")?;

        if response.tx_hash.is_empty() {
            bail!("RPC returned empty transaction hash");
        }
        Ok(response)
    }
}

/// Largest balance the wallet service is ever expected to report, in whole
/// tokens. An answer above this is treated as a malformed response.
const MAX_SANE_BALANCE: u64 = 1_000_000_000;

/// Remote answers are validated, not asserted: a malformed status fails the
/// request instead of panicking the task.
fn validate_wallet_status(response: WalletStatusResponse) -> Result<WalletStatusResponse> {
    if response.wallet_address.is_empty() {
        bail!("RPC returned empty wallet address");
    }
    if response.balance > MAX_SANE_BALANCE {
        bail!(
            "RPC returned wallet balance {} above the sanity bound",
            response.balance
        );
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(address: &str, balance: u64) -> WalletStatusResponse {
        WalletStatusResponse {
            wallet_address: address.to_string(),
            balance,
        }
    }

    #[test]
    fn wallet_status_validation() {
        assert!(validate_wallet_status(status("0xabc", 5_000)).is_ok());
        assert!(validate_wallet_status(status("0xabc", MAX_SANE_BALANCE)).is_ok());
        assert!(validate_wallet_status(status("", 5_000)).is_err());
        assert!(validate_wallet_status(status("0xabc", MAX_SANE_BALANCE + 1)).is_err());
    }
}

#[derive(Debug, Deserialize)]
pub struct WalletStatusResponse {
    pub wallet_address: String,
    /// Spendable balance in whole tokens
    pub balance: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferReceipt {
    pub tx_hash: String,
    pub gas_used: u64,
}
