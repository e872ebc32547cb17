use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::airdrop_winner;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinnerView {
    pub id: i64,
    pub fid: i64,
    pub wallet_address: String,
    pub app_discovered: String,
    pub token_amount: i64,
    pub status: String,
    pub transaction_hash: Option<String>,
    pub won_at: DateTime<Utc>,
}

impl From<&airdrop_winner::Model> for WinnerView {
    fn from(model: &airdrop_winner::Model) -> Self {
        Self {
            id: model.id,
            fid: model.fid,
            wallet_address: model.wallet_address.clone(),
            app_discovered: model.app_discovered.clone(),
            token_amount: model.token_amount,
            status: model.status.clone(),
            transaction_hash: model.transaction_hash.clone(),
            won_at: model.won_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AirdropStatsView {
    pub total_winners: u64,
    pub pending_winners: u64,
    pub sent_winners: u64,
    pub today_winners: u64,
    pub tokens_distributed: i64,
    pub tokens_pending: i64,
}

/// Stats plus the recent-winner feed, cached as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AirdropStatsBundle {
    pub stats: AirdropStatsView,
    pub recent_winners: Vec<WinnerView>,
}
