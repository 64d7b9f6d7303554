//! Configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration: in-memory stores, default header names, no fallback
//! entries and no password logins.
//!
//! ```toml
//! admin_telegram_ids = [618647337]
//!
//! [store]
//! url = "https://project.supabase.co"
//! service_key = "..."
//! lookup_timeout_ms = 3000
//!
//! [login]
//! session_ttl_secs = 86400
//!
//! [[login.admins]]
//! admin_id = 2
//! name = "Anna"
//! role = "admin"
//! password_hash = "$argon2id$v=19$..."
//! permissions = ["all"]
//!
//! [[fallback]]
//! admin_id = 3
//! name = "Tutor"
//! role = "tutor"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use argon2::password_hash::PasswordHash;
use serde::Deserialize;
use thiserror::Error;

use crate::fallback::FallbackTable;
use crate::role::Role;
use crate::store::RestStoreConfig;
use crate::Secret;

/// Environment variable naming the TOML file.
pub const CONFIG_PATH_ENV: &str = "TUTORDESK_AUTH_CONFIG";
/// Overrides `store.url`.
pub const STORE_URL_ENV: &str = "SUPABASE_URL";
/// Overrides `store.service_key`.
pub const STORE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Failure to load or validate configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Io {
        /// File that was attempted.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The file parsed but a value is unusable.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct AuthConfig {
    /// External store connection.
    #[serde(default)]
    pub store: StoreConfig,
    /// Credential header names.
    #[serde(default)]
    pub headers: HeaderConfig,
    /// Password login.
    #[serde(default)]
    pub login: LoginConfig,
    /// Break-glass table for browser callers without a session.
    #[serde(default)]
    pub fallback: FallbackTable,
    /// Telegram ids reported as `admin` by the role lookup.
    #[serde(default)]
    pub admin_telegram_ids: Vec<i64>,
}

/// External store connection settings.
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Project URL. Set together with `service_key`; without both the
    /// in-memory stores are used.
    pub url: Option<String>,
    /// Service-role key. Set together with `url`.
    pub service_key: Option<Secret<String>>,
    /// Users table.
    #[serde(default = "default_users_table")]
    pub users_table: String,
    /// Browser sessions table.
    #[serde(default = "default_sessions_table")]
    pub sessions_table: String,
    /// Bound on a single lookup, in milliseconds.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            users_table: default_users_table(),
            sessions_table: default_sessions_table(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// `lookup_timeout_ms` as a `Duration`.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// REST adapter settings, when both the URL and the key are configured.
    pub fn rest_config(&self) -> Option<RestStoreConfig> {
        let url = self.url.as_ref()?;
        let key = self.service_key.as_ref()?;
        Some(RestStoreConfig {
            base_url: url.clone(),
            service_key: Secret::new(key.expose_secret().clone()),
            users_table: self.users_table.clone(),
            sessions_table: self.sessions_table.clone(),
            timeout: self.lookup_timeout(),
        })
    }
}

fn default_users_table() -> String {
    "hanna_users".to_owned()
}

fn default_sessions_table() -> String {
    "admin_browser_sessions".to_owned()
}

fn default_lookup_timeout_ms() -> u64 {
    5_000
}

/// Names of the headers carrying the credential signals.
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderConfig {
    /// Telegram subject id set by the Mini App runtime.
    #[serde(default = "default_telegram_header")]
    pub telegram_id: String,
    /// Browser bearer token.
    #[serde(default = "default_token_header")]
    pub admin_token: String,
    /// Admin id the browser token claims.
    #[serde(default = "default_admin_id_header")]
    pub admin_id: String,
    /// Incoming request id, echoed in logs. A UUID is generated when absent.
    #[serde(default = "default_request_id_header")]
    pub request_id: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            telegram_id: default_telegram_header(),
            admin_token: default_token_header(),
            admin_id: default_admin_id_header(),
            request_id: default_request_id_header(),
        }
    }
}

fn default_telegram_header() -> String {
    "x-telegram-id".to_owned()
}

fn default_token_header() -> String {
    "x-admin-token".to_owned()
}

fn default_admin_id_header() -> String {
    "x-admin-id".to_owned()
}

fn default_request_id_header() -> String {
    "x-request-id".to_owned()
}

/// Password login settings.
#[derive(Debug, Deserialize)]
pub struct LoginConfig {
    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Delay before answering a wrong password, in milliseconds.
    #[serde(default = "default_failure_delay_ms")]
    pub failure_delay_ms: u64,
    /// Accounts allowed to log in with a password.
    #[serde(default)]
    pub admins: Vec<AdminAccount>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl_secs(),
            failure_delay_ms: default_failure_delay_ms(),
            admins: Vec::new(),
        }
    }
}

impl LoginConfig {
    /// `session_ttl_secs` as a `Duration`.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// `failure_delay_ms` as a `Duration`.
    pub fn failure_delay(&self) -> Duration {
        Duration::from_millis(self.failure_delay_ms)
    }
}

fn default_session_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_failure_delay_ms() -> u64 {
    1_000
}

/// One password-login account.
#[derive(Debug, Deserialize)]
pub struct AdminAccount {
    /// Id the issued token is bound to.
    pub admin_id: i64,
    /// Default display name.
    pub name: String,
    /// Role recorded with the session.
    pub role: Role,
    /// Argon2 PHC string.
    pub password_hash: Secret<String>,
    /// Free-form permission labels returned to the client.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl AuthConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AuthConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Loads from [`CONFIG_PATH_ENV`] if set (defaults otherwise) and applies
    /// the store overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match var(CONFIG_PATH_ENV) {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(url) = var(STORE_URL_ENV) {
            config.store.url = Some(url);
        }
        if let Some(key) = var(STORE_KEY_ENV) {
            config.store.service_key = Some(Secret::new(key));
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store.lookup_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.lookup_timeout_ms must be positive".to_owned(),
            ));
        }
        if let Some(key) = &self.store.service_key {
            if key.is_blank() {
                return Err(ConfigError::Invalid("store.service_key is blank".to_owned()));
            }
        }
        if self.store.url.is_some() != self.store.service_key.is_some() {
            return Err(ConfigError::Invalid(
                "store.url and store.service_key must be set together".to_owned(),
            ));
        }
        if let Some(entry) = self.fallback.iter().find(|e| e.admin_id <= 0) {
            return Err(ConfigError::Invalid(format!(
                "fallback admin_id {} must be positive",
                entry.admin_id
            )));
        }
        if let Some(id) = self.admin_telegram_ids.iter().find(|id| **id <= 0) {
            return Err(ConfigError::Invalid(format!(
                "admin telegram id {id} must be positive"
            )));
        }

        let mut seen = HashSet::new();
        for account in &self.login.admins {
            if account.admin_id <= 0 {
                return Err(ConfigError::Invalid(format!(
                    "login admin_id {} must be positive",
                    account.admin_id
                )));
            }
            if !seen.insert(account.admin_id) {
                return Err(ConfigError::Invalid(format!(
                    "login admin_id {} configured twice",
                    account.admin_id
                )));
            }
            if PasswordHash::new(account.password_hash.expose_secret()).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "login admin {} has a malformed password hash",
                    account.admin_id
                )));
            }
        }
        Ok(())
    }
}
