use crate::auth::JwtConfig;
use crate::auth::jwt::MIN_SECRET_LEN;
use crate::core::ServerError;
use crate::db::IsolationLevel;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | HTTP_PORT | 3000 | HTTP listen port |
/// | DATABASE_URL | (none) | PostgreSQL URL; in-memory store when unset (development only) |
/// | DB_MAX_CONNECTIONS | 10 | Pool size |
/// | DB_ISOLATION | read_committed | read_committed / repeatable_read / serializable |
/// | ENFORCE_STATUS_TRANSITIONS | true | Reject order status moves outside the lifecycle |
/// | ALLOW_ORIGIN | (none) | CORS allowed origin |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | Default log level when RUST_LOG is unset |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | (none) | Daily rolling log files when the directory exists |
/// | MAX_CONNECTIONS | 1000 | In-flight request cap |
/// | REQUEST_TIMEOUT_MS | 30000 | Per-request timeout |
/// | JWT_SECRET | (dev only default) | HS256 secret, at least 32 bytes |
/// | JWT_ISSUER | shop-server | Expected `iss` |
/// | JWT_AUDIENCE | shop-clients | Expected `aud` |
/// | JWT_EXPIRATION_MINUTES | 1440 | Lifetime of issued tokens |
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_isolation: IsolationLevel,
    pub enforce_status_transitions: bool,
    pub allow_origin: Option<String>,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub max_connections: usize,
    pub request_timeout_ms: u64,
    pub jwt: JwtConfig,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ServerError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let db_isolation = match env_opt("DB_ISOLATION") {
            Some(raw) => raw.parse().map_err(ServerError::Config)?,
            None => IsolationLevel::default(),
        };

        let jwt = JwtConfig {
            secret: Self::require_secret("JWT_SECRET", &environment)?,
            expiration_minutes: env_parse("JWT_EXPIRATION_MINUTES", 1440),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "shop-server".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "shop-clients".into()),
        };

        Ok(Self {
            http_port: env_parse("HTTP_PORT", 3000),
            database_url: env_opt("DATABASE_URL"),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            db_isolation,
            enforce_status_transitions: env_parse("ENFORCE_STATUS_TRANSITIONS", true),
            allow_origin: env_opt("ALLOW_ORIGIN"),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_parse("LOG_JSON", false),
            log_dir: env_opt("LOG_DIR"),
            max_connections: env_parse("MAX_CONNECTIONS", 1000),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", 30000),
            environment,
            jwt,
        })
    }

    /// Secret from the environment; outside development it must be set
    fn require_secret(name: &str, environment: &str) -> Result<String, ServerError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(ServerError::Config(format!(
                        "{name} must be set in {environment} environment"
                    )));
                }
                format!("dev-{name}-not-for-production-use-only")
            }
        };
        if val.len() < MIN_SECRET_LEN {
            return Err(ServerError::Config(format!(
                "{name} must be at least {MIN_SECRET_LEN} characters long"
            )));
        }
        Ok(val)
    }

    /// Configuration for tests: in-memory store, fixed secret
    pub fn for_tests() -> Self {
        Self {
            http_port: 0,
            database_url: None,
            db_max_connections: 1,
            db_isolation: IsolationLevel::default(),
            enforce_status_transitions: true,
            allow_origin: None,
            environment: "development".into(),
            log_level: "debug".into(),
            log_json: false,
            log_dir: None,
            max_connections: 64,
            request_timeout_ms: 30000,
            jwt: JwtConfig {
                secret: "test-secret-that-is-long-enough-for-hs256".into(),
                expiration_minutes: 60,
                issuer: "shop-server".into(),
                audience: "shop-clients".into(),
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
