use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub geo: GeoConfig,
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Geolocation provider chain and cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Base URL of the primary provider (ipapi.co-compatible).
    pub primary_url: String,
    pub primary_timeout_ms: u64,
    /// Base URL of the fallback provider (ip-api.com-compatible).
    pub fallback_url: String,
    pub fallback_timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Echo internal error detail in 500 bodies. Keep off in production.
    pub expose_error_details: bool,
    /// Append `mdmc_tracking_id` to destination URLs for debugging.
    pub debug_tracking_param: bool,
    pub link_cache_max_entries: u64,
    pub link_cache_ttl_secs: u64,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_secs: u64,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = env_or("SERVER_HOST", "127.0.0.1");
        let port = env_or("SERVER_PORT", "8080").parse::<u16>()?;

        let database_url = env_or("DATABASE_URL", "sqlite://./smartlink.db");
        let max_connections = env_or("DATABASE_MAX_CONNECTIONS", "5").parse::<u32>()?;

        let geo = GeoConfig {
            primary_url: env_or("GEO_PRIMARY_URL", "https://ipapi.co"),
            primary_timeout_ms: env_or("GEO_PRIMARY_TIMEOUT_MS", "3000").parse()?,
            fallback_url: env_or("GEO_FALLBACK_URL", "http://ip-api.com"),
            fallback_timeout_ms: env_or("GEO_FALLBACK_TIMEOUT_MS", "2000").parse()?,
            cache_ttl_secs: env_or("GEO_CACHE_TTL_SECS", "300").parse()?,
            cache_max_entries: env_or("GEO_CACHE_MAX_ENTRIES", "1000").parse()?,
        };

        // Rate limiting is opt-in: setting RATE_LIMIT_MAX_REQUESTS enables it.
        let rate_limit = match std::env::var("RATE_LIMIT_MAX_REQUESTS") {
            Ok(max) => Some(RateLimitConfig {
                max_requests: max.parse()?,
                window_secs: env_or("RATE_LIMIT_WINDOW_SECS", "60").parse()?,
            }),
            Err(_) => None,
        };

        let tracking = TrackingConfig {
            expose_error_details: env_flag("EXPOSE_ERROR_DETAILS"),
            debug_tracking_param: env_flag("DEBUG_TRACKING_PARAM"),
            link_cache_max_entries: env_or("LINK_CACHE_MAX_ENTRIES", "10000").parse()?,
            link_cache_ttl_secs: env_or("LINK_CACHE_TTL_SECS", "300").parse()?,
            rate_limit,
        };

        Ok(Config {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            geo,
            tracking,
        })
    }
}
