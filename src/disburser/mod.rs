//! Background disbursement worker.
//!
//! Drains `pending` airdrop winners in batches: checks the airdrop wallet
//! balance, submits one transfer per winner, and flips the row to `sent`
//! with the transaction hash. Transfers have no idempotency key, so a
//! transfer that landed on-chain but failed to report stays `pending` and
//! will be retried on the next tick; see DESIGN.md for the accepted risk.

use std::sync::Arc;

use anyhow::{Context, Result};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    QuerySelect,
};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::chain::ChainClient;
use crate::config::DisburserConfig;
use crate::entities::airdrop_winner::{self, STATUS_PENDING, STATUS_SENT};
use crate::state::ApiCache;

pub struct Disburser {
    database: DatabaseConnection,
    chain: ChainClient,
    config: DisburserConfig,
    cache: Arc<ApiCache>,
}

impl Disburser {
    pub fn new(
        database: DatabaseConnection,
        chain: ChainClient,
        config: DisburserConfig,
        cache: Arc<ApiCache>,
    ) -> Self {
        assert!(
            config.batch_size > 0,
            "Disburser batch size must be positive"
        );
        Self {
            database,
            chain,
            config,
            cache,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!("Starting disbursement worker loop");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    match changed {
                        Ok(_) => {
                            if *shutdown.borrow() {
                                info!("Disburser shutdown signal received");
                                break;
                            }
                        }
                        Err(_) => {
                            warn!("Shutdown channel closed unexpectedly. Exiting disburser loop");
                            break;
                        }
                    }
                }
                _ = sleep(self.config.poll_interval()) => {
                    self.tick().await?;
                }
            }
        }

        Ok(())
    }

    async fn tick(&self) -> Result<()> {
        let pending = airdrop_winner::Entity::find()
            .filter(airdrop_winner::Column::Status.eq(STATUS_PENDING))
            .order_by_asc(airdrop_winner::Column::WonAt)
            .limit(self.config.batch_size)
            .all(&self.database)
            .await
            .context("Failed to load pending winners")?;

        if pending.is_empty() {
            debug!("No pending winners to disburse");
            return Ok(());
        }

        let wallet = self
            .chain
            .wallet_status()
            .await
            .context("Failed to query wallet status")?;
        let mut available = wallet.balance;
        let mut sent = 0u64;

        for winner in pending {
            let amount = u64::try_from(winner.token_amount)
                .context("Winner token amount exceeds u64 bounds")?;
            if available < amount {
                warn!(
                    "Wallet balance {} below {} needed for winner {}; pausing disbursement",
                    available, amount, winner.id
                );
                break;
            }

            match self.chain.transfer_tokens(&winner.wallet_address, amount).await {
                Ok(receipt) => {
                    let winner_id = winner.id;
                    let fid = winner.fid;
                    let mut active = winner.into_active_model();
                    active.status = Set(STATUS_SENT.to_string());
                    active.transaction_hash = Set(Some(receipt.tx_hash.clone()));
                    airdrop_winner::Entity::update(active)
                        .exec(&self.database)
                        .await
                        .context("Failed to mark winner as sent")?;

                    available -= amount;
                    sent += 1;
                    info!(
                        "Disbursed {} tokens to FID {} for winner {} (tx: {})",
                        amount, fid, winner_id, receipt.tx_hash
                    );
                }
                Err(err) => {
                    // Leave the row pending and stop the batch; retrying the
                    // rest this tick would just hit the same endpoint
                    warn!("Transfer for winner {} failed: {err}", winner.id);
                    break;
                }
            }
        }

        if sent > 0 {
            self.cache.invalidate_stats().await;
        }

        Ok(())
    }
}
