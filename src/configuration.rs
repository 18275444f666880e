use chrono::Duration;

use crate::auth::DEFAULT_ISSUER;
use crate::error::ConfigError;

/// Longest accepted token lifetime (ten years)
const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served under `/app`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Authentication settings, fixed for the lifetime of the process.
///
/// Rotating `secret` invalidates every outstanding access token; it requires a restart.
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub secret: String,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_secs: i64,
    /// Stamped into access tokens and required on verification
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Upper bound on a single session store call
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
}

impl AuthSettings {
    /// Settings with every default applied around `secret`
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_ttl_secs: default_access_token_ttl(),
            refresh_token_ttl_secs: default_refresh_token_ttl(),
            issuer: default_issuer(),
            store_timeout_ms: default_store_timeout(),
        }
    }

    /// Saturates at `Duration::MAX` for values `validate` would reject
    pub fn access_token_ttl(&self) -> Duration {
        Duration::try_seconds(self.access_token_ttl_secs).unwrap_or(Duration::MAX)
    }

    /// Saturates at `Duration::MAX` for values `validate` would reject
    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::try_seconds(self.refresh_token_ttl_secs).unwrap_or(Duration::MAX)
    }

    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.store_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.secret".to_string()));
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.issuer".to_string()));
        }
        validate_ttl("auth.access_token_ttl_secs", self.access_token_ttl_secs)?;
        validate_ttl("auth.refresh_token_ttl_secs", self.refresh_token_ttl_secs)?;
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "auth.store_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// The secret never shows up in logs.
impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("issuer", &self.issuer)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .finish()
    }
}

fn validate_ttl(key: &str, secs: i64) -> Result<(), ConfigError> {
    if secs <= 0 {
        return Err(ConfigError::InvalidValue(format!("{} must be positive", key)));
    }
    if secs > MAX_TOKEN_TTL_SECS {
        return Err(ConfigError::InvalidValue(format!(
            "{} must not exceed {} seconds",
            key, MAX_TOKEN_TTL_SECS
        )));
    }
    Ok(())
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_port() -> u16 {
    5432
}

fn default_static_dir() -> String {
    "./public".to_string()
}

fn default_access_token_ttl() -> i64 {
    60 * 60
}

fn default_refresh_token_ttl() -> i64 {
    60 * 24 * 60 * 60
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

fn default_store_timeout() -> u64 {
    5_000
}

/// Load settings from `configuration.yaml` (optional) and `APP_`-prefixed
/// environment variables, e.g. `APP_AUTH__SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .try_parsing(true)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.auth.validate()?;
    Ok(settings)
}
