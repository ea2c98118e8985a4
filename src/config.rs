//! Runtime configuration, read from the environment (`.env` supported).

use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_GATEWAY_BASE_URL: &str = "https://api.razorpay.com";
pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;
pub const DEFAULT_FIXTURE_USER_ID: &str = "00000000-0000-4000-8000-000000000001";
pub const DEFAULT_FIXTURE_USER_EMAIL: &str = "dev@gurukul.local";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub run_migrations: bool,
    pub cors_origins: Vec<String>,
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
}

#[derive(Clone)]
pub struct GatewayConfig {
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub currency: String,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &self.key_secret.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("currency", &self.currency)
            .finish()
    }
}

impl GatewayConfig {
    pub fn has_credentials(&self) -> bool {
        self.key_id.is_some() && self.key_secret.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Jwt,
    /// Every request is treated as the fixture user. Local development only.
    Fixture,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub jwt_secret: Option<String>,
    pub token_ttl_days: i64,
    pub fixture_user_id: String,
    pub fixture_user_email: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_days", &self.token_ttl_days)
            .field("fixture_user_id", &self.fixture_user_id)
            .field("fixture_user_email", &self.fixture_user_email)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr: SocketAddr = parse_or("BIND_ADDR", get("BIND_ADDR"), || {
            DEFAULT_BIND_ADDR.parse().map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_string(),
            })
        })?;

        let run_migrations = match get("RUN_MIGRATIONS") {
            None => true,
            Some(v) => parse_bool("RUN_MIGRATIONS", &v)?,
        };

        let cors_origins = get("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let timeout_secs: u64 = parse_or("GATEWAY_TIMEOUT_SECS", get("GATEWAY_TIMEOUT_SECS"), || {
            Ok(DEFAULT_GATEWAY_TIMEOUT_SECS)
        })?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "GATEWAY_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        let gateway = GatewayConfig {
            key_id: get("RAZORPAY_KEY_ID"),
            key_secret: get("RAZORPAY_KEY_SECRET"),
            base_url: get("RAZORPAY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GATEWAY_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(timeout_secs),
            currency: get("PAYMENT_CURRENCY")
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        };

        let mode = match get("AUTH_MODE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("jwt") => AuthMode::Jwt,
            Some("fixture") => AuthMode::Fixture,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "AUTH_MODE",
                    value: other.to_string(),
                });
            }
        };

        let jwt_secret = get("JWT_SECRET");
        if mode == AuthMode::Jwt && jwt_secret.is_none() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        let token_ttl_days: i64 =
            parse_or("TOKEN_TTL_DAYS", get("TOKEN_TTL_DAYS"), || Ok(DEFAULT_TOKEN_TTL_DAYS))?;
        if token_ttl_days <= 0 {
            return Err(ConfigError::Invalid {
                name: "TOKEN_TTL_DAYS",
                value: token_ttl_days.to_string(),
            });
        }

        let auth = AuthConfig {
            mode,
            jwt_secret,
            token_ttl_days,
            fixture_user_id: get("FIXTURE_USER_ID")
                .unwrap_or_else(|| DEFAULT_FIXTURE_USER_ID.to_string()),
            fixture_user_email: get("FIXTURE_USER_EMAIL")
                .unwrap_or_else(|| DEFAULT_FIXTURE_USER_EMAIL.to_string()),
        };

        Ok(Self {
            bind_addr,
            database_url,
            run_migrations,
            cors_origins,
            gateway,
            auth,
        })
    }
}

fn parse_or<T, D>(name: &'static str, raw: Option<String>, default: D) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    D: FnOnce() -> Result<T, ConfigError>,
{
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => default(),
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}
