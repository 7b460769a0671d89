use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub rate_limit_enabled: bool,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub item_cache_ttl_secs: u64,
    pub redis_connect_timeout_secs: u64,
    pub redis_response_timeout_secs: u64,
    pub db_pool_size: u32,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: env_or("JWT_EXPIRATION", 3600),
            rate_limit_enabled: env_or("RATE_LIMIT_ENABLED", true),
            rate_limit_window_secs: env_or("RATE_LIMIT_WINDOW", 60),
            rate_limit_requests: env_or("RATE_LIMIT_REQUESTS", 100),
            item_cache_ttl_secs: env_or("ITEM_CACHE_TTL", 300),
            redis_connect_timeout_secs: env_or("REDIS_CONNECT_TIMEOUT", 5),
            redis_response_timeout_secs: env_or("REDIS_RESPONSE_TIMEOUT", 5),
            db_pool_size: env_or("DB_POOL_SIZE", 10),
            server_host: env_or("SERVER_HOST", "0.0.0.0".to_string()),
            server_port: env_or("SERVER_PORT", 8000),
            api_base_uri: env_or("API_BASE_URI", "/api/v1".to_string()),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn item_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.item_cache_ttl_secs)
    }

    pub fn redis_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.redis_connect_timeout_secs)
    }

    pub fn redis_response_timeout(&self) -> Duration {
        Duration::from_secs(self.redis_response_timeout_secs)
    }
}
