use crate::{cache, expiry, ratelimit, workers};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub env: String,
    pub base_url: String,
    pub db_path: String,
    pub cache_ttl: Duration,
    pub cleanup_interval: Duration,
    pub cleanup_batch_size: usize,
    pub kgs_min_keys: usize,
    pub kgs_batch_size: usize,
    pub kgs_check_interval: Duration,
    pub rate_limit_per_minute: u32,
    pub rate_limit_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            env: "development".to_string(),
            base_url: "http://localhost:8080".to_string(),
            db_path: "data/gisty".to_string(),
            cache_ttl: cache::DEFAULT_CACHE_TTL,
            cleanup_interval: workers::reaper::DEFAULT_INTERVAL,
            cleanup_batch_size: workers::reaper::DEFAULT_BATCH_SIZE,
            kgs_min_keys: workers::keygen::DEFAULT_MIN_KEYS,
            kgs_batch_size: workers::keygen::DEFAULT_BATCH_SIZE,
            kgs_check_interval: workers::keygen::DEFAULT_CHECK_INTERVAL,
            rate_limit_per_minute: ratelimit::DEFAULT_REQUESTS_PER_MINUTE,
            rate_limit_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// defaults above. Duration-valued variables accept the same composite
    /// grammar as `expires_in` ("5m", "1h", "90s").
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        Self {
            port,
            env: env::var("ENV").unwrap_or(defaults.env),
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            db_path: env::var("DB_PATH").unwrap_or(defaults.db_path),
            cache_ttl: duration_var("CACHE_TTL", defaults.cache_ttl),
            cleanup_interval: duration_var("CLEANUP_INTERVAL", defaults.cleanup_interval),
            cleanup_batch_size: parse_var("CLEANUP_BATCH_SIZE", defaults.cleanup_batch_size),
            kgs_min_keys: parse_var("KGS_MIN_KEYS", defaults.kgs_min_keys),
            kgs_batch_size: parse_var("KGS_BATCH_SIZE", defaults.kgs_batch_size),
            kgs_check_interval: duration_var("KGS_CHECK_INTERVAL", defaults.kgs_check_interval),
            rate_limit_per_minute: parse_var(
                "RATE_LIMIT_REQUESTS_PER_MINUTE",
                defaults.rate_limit_per_minute,
            ),
            rate_limit_enabled: parse_var("RATE_LIMIT_ENABLED", defaults.rate_limit_enabled),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn duration_var(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|value| expiry::parse_duration(&value))
        .unwrap_or(default)
}
