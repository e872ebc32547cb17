use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use sea_orm::DatabaseConnection;

use crate::chain::ChainClient;
use crate::config::{AirdropConfig, CacheConfig};
use crate::farcaster::{FarcasterClient, ResolvedUser};
use crate::models::airdrop::AirdropStatsBundle;
use crate::models::directory::MiniAppView;

#[derive(Clone)]
pub struct AppState {
    pub database: DatabaseConnection,
    pub cache: Arc<ApiCache>,
    pub farcaster: FarcasterClient,
    pub chain: ChainClient,
    pub airdrop: AirdropConfig,
    pub admin_token: Option<String>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        database: DatabaseConnection,
        cache: Arc<ApiCache>,
        farcaster: FarcasterClient,
        chain: ChainClient,
        airdrop: AirdropConfig,
        admin_token: Option<String>,
    ) -> Self {
        assert!(
            airdrop.win_probability > 0.0 && airdrop.win_probability <= 1.0,
            "Win probability must be validated before state construction"
        );
        assert!(
            cache.users_capacity >= 100,
            "User cache capacity must be configured"
        );
        Self {
            database,
            cache,
            farcaster,
            chain,
            airdrop,
            admin_token,
            start_time: Instant::now(),
        }
    }
}

pub struct ApiCache {
    /// Full directory listing, keyed by a single sentinel entry
    pub directory: Cache<String, Arc<Vec<MiniAppView>>>,
    /// Resolved Farcaster users by FID
    pub users: Cache<i64, Arc<ResolvedUser>>,
    /// Airdrop stats bundle, keyed by a single sentinel entry
    pub stats: Cache<String, Arc<AirdropStatsBundle>>,
    pub users_capacity: u64,
}

pub const DIRECTORY_CACHE_KEY: &str = "directory";
pub const STATS_CACHE_KEY: &str = "stats";

impl ApiCache {
    pub fn new(config: &CacheConfig) -> Self {
        assert!(
            config.users_max_capacity >= 100,
            "User cache capacity threshold"
        );
        assert!(
            config.directory_max_capacity >= 1,
            "Directory cache capacity threshold"
        );

        let directory = Cache::builder()
            .max_capacity(config.directory_max_capacity)
            .time_to_live(Duration::from_secs(config.directory_ttl_seconds))
            .time_to_idle(Duration::from_secs(config.directory_ttl_seconds / 2 + 1))
            .build();

        let users = Cache::builder()
            .max_capacity(config.users_max_capacity)
            .time_to_live(Duration::from_secs(config.users_ttl_seconds))
            .time_to_idle(Duration::from_secs(config.users_ttl_seconds / 2 + 1))
            .build();

        let stats = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(config.stats_ttl_seconds))
            .time_to_idle(Duration::from_secs(config.stats_ttl_seconds / 2 + 1))
            .build();

        Self {
            directory,
            users,
            stats,
            users_capacity: config.users_max_capacity,
        }
    }

    /// Drop the cached directory listing after a submission
    pub async fn invalidate_directory(&self) {
        self.directory
            .invalidate(&DIRECTORY_CACHE_KEY.to_string())
            .await;
    }

    /// Drop the cached stats bundle after winner bookkeeping changes
    pub async fn invalidate_stats(&self) {
        self.stats.invalidate(&STATS_CACHE_KEY.to_string()).await;
    }
}
