use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Plan cache is disabled when unset.
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Plan applied to users without an active subscription.
    pub default_plan: String,
    pub plan_cache_ttl_secs: u64,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: std::env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            default_plan: std::env::var("DEFAULT_PLAN").unwrap_or_else(|_| "Free".to_string()),
            plan_cache_ttl_secs: parse_env("PLAN_CACHE_TTL_SECS", 60)
                .context("PLAN_CACHE_TTL_SECS must be a whole number of seconds")?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}
