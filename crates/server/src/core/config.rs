//! Server configuration
//!
//! Everything is read once from the environment at startup and is
//! read-only afterwards.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::auth::token::TokenService;
use crate::core::auth::CredentialStore;
use crate::finance::advisor::AdviceProxy;
use crate::finance::store::RecordStores;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://finance.sqlite";
pub const DEFAULT_DATA_DIR: &str = "finance_data";
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ADVICE_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Configuration for the finance server
#[derive(Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// SQLite connection string for the credential store
    pub database_url: String,
    /// Directory holding the record collections
    pub data_dir: PathBuf,
    /// HS256 signing secret for bearer tokens
    pub jwt_secret: String,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    /// Provider key for the advice proxy; `None` disables it
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub advice_timeout: Duration,
    /// Protect every mutating record route, not only add-expense
    pub require_auth_on_writes: bool,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("data_dir", &self.data_dir)
            .field("jwt_secret", &"<redacted>")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "<redacted>"))
            .field("llm_model", &self.llm_model)
            .field("advice_timeout", &self.advice_timeout)
            .field("require_auth_on_writes", &self.require_auth_on_writes)
            .finish()
    }
}

impl ServerConfig {
    /// Read configuration from process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            jwt_secret,
            bcrypt_cost: parse_or(&get, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?,
            llm_api_key: get("LLM_API_KEY"),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            advice_timeout: Duration::from_secs(parse_or(
                &get,
                "ADVICE_TIMEOUT_SECS",
                DEFAULT_ADVICE_TIMEOUT_SECS,
            )?),
            require_auth_on_writes: parse_or(&get, "REQUIRE_AUTH_ON_WRITES", false)?,
        })
    }

    /// Ensure the record directory exists
    pub async fn ensure_dirs(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub tokens: Arc<TokenService>,
    pub auth: Arc<CredentialStore>,
    pub records: Arc<RecordStores>,
    pub advisor: Option<Arc<AdviceProxy>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_secret_fails() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let err = ServerConfig::from_lookup(lookup(&[("JWT_SECRET", "   ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn defaults_apply() {
        let config = ServerConfig::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.advice_timeout, Duration::from_secs(15));
        assert_eq!(config.llm_api_key, None);
        assert!(!config.require_auth_on_writes);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[("JWT_SECRET", "s"), ("PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "top-secret-value"),
            ("LLM_API_KEY", "provider-key"),
        ]))
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("top-secret-value"));
        assert!(!rendered.contains("provider-key"));
    }
}
