use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub farcaster: FarcasterConfig,
    pub chain: ChainConfig,
    pub airdrop: AirdropConfig,
    pub disburser: DisburserConfig,
    pub cache: CacheConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self> {
        let configured_path =
            std::env::var("ROULETTE_API_CONFIG").unwrap_or_else(|_| "config/api.toml".to_string());
        assert!(
            !configured_path.is_empty(),
            "Configuration path must be non-empty"
        );
        assert!(
            configured_path.len() < 4096,
            "Configuration path length exceeds hard limit"
        );

        let mut builder = Config::builder()
            .add_source(File::new(&configured_path, FileFormat::Toml).required(true));

        if let Ok(env_override) = std::env::var("ROULETTE_API_ENV") {
            if !env_override.is_empty() {
                let env_file = format!("config/api.{}.toml", env_override);
                if Path::new(&env_file).exists() {
                    builder = builder.add_source(File::new(&env_file, FileFormat::Toml));
                }
            }
        }

        let settings = builder
            .build()
            .map_err(|err| map_config_error(err, &configured_path))?;
        let mut config: Self = settings
            .try_deserialize()
            .context("Failed to deserialize API configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> Result<()> {
        assert!(
            !self.database.url.is_empty(),
            "Database URL must be specified"
        );
        assert!(
            self.server.port > 0,
            "Server port must be greater than zero"
        );
        if let Some(token) = &self.server.admin_token {
            assert!(token.len() >= 16, "Admin token must be at least 16 bytes");
        }
        assert!(
            !self.farcaster.auth_url.is_empty(),
            "Farcaster auth URL must be specified"
        );
        assert!(
            !self.farcaster.api_url.is_empty(),
            "Farcaster API URL must be specified"
        );
        self.airdrop.ensure_bounds()?;
        self.disburser.ensure_bounds()?;
        self.cache.ensure_bounds()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Option<IpAddr>,
    pub port: u16,
    /// Bearer token required by the administrative airdrop endpoints.
    /// When unset those endpoints are disabled.
    pub admin_token: Option<String>,
}

impl ServerConfig {
    pub fn address(&self) -> SocketAddr {
        let host = self.host.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(self.port != 0, "HTTP port cannot be zero");
        assert!(self.port < 65535, "HTTP port must be below 65535");
        SocketAddr::new(host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FarcasterConfig {
    /// Quick Auth token verification endpoint base
    pub auth_url: String,
    /// Farcaster REST API base (primary address, user profiles)
    pub api_url: String,
    pub request_timeout_ms: Option<u64>,
}

impl FarcasterConfig {
    pub fn request_timeout(&self) -> Duration {
        let millis = self.request_timeout_ms.unwrap_or(3_000);
        assert!(millis >= 100, "Farcaster timeout must be at least 100ms");
        assert!(
            millis <= 60_000,
            "Farcaster timeout cannot exceed 60 seconds"
        );
        Duration::from_millis(millis)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// Wallet-service JSON-RPC endpoint used for token transfers
    pub rpc_url: String,
    pub request_timeout_ms: Option<u64>,
}

impl ChainConfig {
    pub fn request_timeout(&self) -> Duration {
        let millis = self.request_timeout_ms.unwrap_or(10_000);
        assert!(millis >= 100, "RPC timeout must be at least 100ms");
        assert!(millis <= 60_000, "RPC timeout cannot exceed 60 seconds");
        Duration::from_millis(millis)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirdropConfig {
    /// Probability that a recorded spin wins, applied server-side
    pub win_probability: f64,
    /// Whole tokens granted per winning spin
    pub tokens_per_win: u64,
    /// Whole tokens granted per eligibility claim
    pub tokens_per_claim: u64,
}

impl AirdropConfig {
    pub fn ensure_bounds(&self) -> Result<()> {
        assert!(
            self.win_probability > 0.0,
            "Win probability must be positive"
        );
        assert!(
            self.win_probability <= 1.0,
            "Win probability cannot exceed one"
        );
        assert!(self.tokens_per_win > 0, "Tokens per win must be positive");
        assert!(
            self.tokens_per_win <= 1_000_000,
            "Tokens per win exceeds defensive limit"
        );
        assert!(
            self.tokens_per_claim > 0,
            "Tokens per claim must be positive"
        );
        assert!(
            self.tokens_per_claim <= 1_000_000,
            "Tokens per claim exceeds defensive limit"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisburserConfig {
    pub poll_interval_ms: u64,
    pub batch_size: u64,
}

impl DisburserConfig {
    pub fn poll_interval(&self) -> Duration {
        assert!(
            self.poll_interval_ms >= 100,
            "Poll interval must be >= 100ms"
        );
        assert!(
            self.poll_interval_ms <= 300_000,
            "Poll interval must be <= 5 minutes"
        );
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ensure_bounds(&self) -> Result<()> {
        assert!(self.batch_size > 0, "Batch size must be positive");
        assert!(self.batch_size <= 256, "Batch size exceeds defensive limit");
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub directory_max_capacity: u64,
    pub directory_ttl_seconds: u64,
    pub users_max_capacity: u64,
    pub users_ttl_seconds: u64,
    pub stats_ttl_seconds: u64,
}

impl CacheConfig {
    fn ensure_bounds(&self) -> Result<()> {
        assert!(
            self.directory_max_capacity >= 1,
            "Directory cache capacity must be at least 1"
        );
        assert!(
            self.directory_ttl_seconds <= 3_600,
            "Directory cache TTL cannot exceed one hour"
        );
        assert!(
            self.users_max_capacity >= 100,
            "User cache capacity must be at least 100"
        );
        assert!(
            self.users_ttl_seconds <= 86_400,
            "User cache TTL cannot exceed one day"
        );
        assert!(
            self.stats_ttl_seconds <= 3_600,
            "Stats cache TTL cannot exceed one hour"
        );
        Ok(())
    }
}

fn map_config_error(err: ConfigError, path: &str) -> ConfigError {
    match err {
        ConfigError::NotFound(_) => ConfigError::NotFound(path.to_string()),
        other => other,
    }
}
