use std::time::Duration;

use serde::Deserialize;

use crate::services::RecommendationLimits;

/// Application configuration loaded from environment variables
///
/// Built once at startup and handed to the components that need it. Nothing
/// reads the environment after `from_env` returns.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Deployment environment name (`local`, `development`, `production`, ...)
    pub environment: String,

    /// PostgreSQL database connection URL
    pub database_url: String,

    /// Connections kept open in the pool
    pub database_pool_size: u32,

    /// Extra connections the pool may open under load
    #[serde(default)]
    pub database_max_overflow: u32,

    /// Comma-separated list of accepted Host header values
    pub allowed_hosts: String,

    /// Comma-separated list of CORS origins
    pub allowed_origins: String,

    /// Path prefix for every API route
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Upper bound for `limit` and `top_n` query parameters
    pub max_recommendation_limit: u32,

    /// `limit` used when the request does not send one
    pub default_recommendation_limit: u32,

    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,

    /// Per store call timeout in seconds
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_query_timeout_secs() -> u64 {
    10
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Reads `.env.{ENV}` (ENV defaults to `local`) and then `.env` if they exist.
    /// Variables already present in the process environment win.
    pub fn from_env() -> anyhow::Result<Self> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "local".to_string());
        dotenvy::from_filename(format!(".env.{}", env)).ok();
        dotenvy::dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    /// Build configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints that serde cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            anyhow::bail!("DATABASE_URL must start with postgres:// or postgresql://");
        }
        if self.database_pool_size == 0 {
            anyhow::bail!("DATABASE_POOL_SIZE must be at least 1");
        }
        if self.max_recommendation_limit == 0 {
            anyhow::bail!("MAX_RECOMMENDATION_LIMIT must be at least 1");
        }
        if self.default_recommendation_limit == 0
            || self.default_recommendation_limit > self.max_recommendation_limit
        {
            anyhow::bail!(
                "DEFAULT_RECOMMENDATION_LIMIT must be between 1 and {}",
                self.max_recommendation_limit
            );
        }
        if self.query_timeout_secs == 0 {
            anyhow::bail!("QUERY_TIMEOUT_SECS must be at least 1");
        }
        if self.allowed_hosts_list().is_empty() {
            anyhow::bail!("ALLOWED_HOSTS must name at least one host");
        }
        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            anyhow::bail!("API_PREFIX must start with '/'");
        }
        Ok(())
    }

    pub fn allowed_hosts_list(&self) -> Vec<String> {
        split_list(&self.allowed_hosts)
    }

    pub fn allowed_origins_list(&self) -> Vec<String> {
        split_list(&self.allowed_origins)
    }

    pub fn limits(&self) -> RecommendationLimits {
        RecommendationLimits {
            default_limit: self.default_recommendation_limit,
            max_limit: self.max_recommendation_limit,
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Total connections the pool may hold
    pub fn max_connections(&self) -> u32 {
        self.database_pool_size + self.database_max_overflow
    }

    /// Production logs are emitted as JSON
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
