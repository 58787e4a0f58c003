use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `None` when DATABASE_URL is unset; the server then runs on the in-memory store
    pub database: Option<DatabaseConfig>,
    pub security: SecurityConfig,
    pub listing: ListingConfig,
    pub graph: GraphConfig,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Security configuration for production deployments
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// True if server is behind a proxy that terminates SSL (nginx, Cloudflare, etc.)
    /// When true: cookie_secure=true is enabled
    pub ssl_proxy: bool,
    /// Session encryption key (64 hex chars). Required when ssl_proxy=true
    pub session_secret_key: Option<String>,
    /// Bearer token granting admin access to the API
    pub api_secret: Option<String>,
}

/// Paging of group listings
#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub groups_per_page: i64,
}

/// Defaults and limits for chart queries
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub default_buckets: usize,
    pub max_buckets: usize,
    pub default_window: chrono::Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database: DatabaseConfig::from_env(),
            security: SecurityConfig::from_env()?,
            listing: ListingConfig::from_env(),
            graph: GraphConfig::from_env()?,
        })
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Option<Self> {
        let url = env::var("DATABASE_URL").ok()?;

        Some(Self {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            acquire_timeout: Duration::from_secs(
                env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            idle_timeout: Duration::from_secs(
                env::var("DATABASE_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                env::var("DATABASE_MAX_LIFETIME_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
        })
    }
}

impl ListingConfig {
    /// Load listing configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            groups_per_page: env::var("GROUPS_PAGE_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .ok()
                .filter(|n: &i64| *n > 0)
                .unwrap_or(10),
        }
    }
}

impl GraphConfig {
    /// Load chart configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let default_buckets = env::var("GRAPH_DEFAULT_BUCKETS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);
        let max_buckets = env::var("GRAPH_MAX_BUCKETS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .unwrap_or(1000);
        let window_hours: i64 = env::var("GRAPH_DEFAULT_WINDOW_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);

        if default_buckets == 0 || default_buckets > max_buckets {
            return Err(ConfigError::InvalidBuckets);
        }

        Ok(Self {
            default_buckets,
            max_buckets,
            default_window: chrono::Duration::hours(window_hours.max(1)),
        })
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { groups_per_page: 10 }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_buckets: 24,
            max_buckets: 1000,
            default_window: chrono::Duration::hours(24),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidBuckets,
    MissingSessionSecret,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid number"),
            ConfigError::InvalidBuckets => write!(
                f,
                "GRAPH_DEFAULT_BUCKETS must be between 1 and GRAPH_MAX_BUCKETS"
            ),
            ConfigError::MissingSessionSecret => {
                write!(
                    f,
                    "SESSION_SECRET_KEY is required when SSL_PROXY is enabled"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl SecurityConfig {
    /// Load security configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_secret_key = env::var("SESSION_SECRET_KEY").ok();

        let ssl_proxy = env::var("SSL_PROXY")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        // When SSL_PROXY is enabled, SESSION_SECRET_KEY is required
        if ssl_proxy && session_secret_key.is_none() {
            return Err(ConfigError::MissingSessionSecret);
        }

        Ok(Self {
            ssl_proxy,
            session_secret_key,
            api_secret: env::var("API_SECRET").ok().filter(|s| !s.is_empty()),
        })
    }
}
