//! Browser password login.
//!
//! A password identifies one configured admin account. A successful login
//! issues a token bound to the admin id (`admin_{id}_{millis}_{random}`) and
//! records a session row so the resolver's browser path can find it later.

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{AdminAccount, LoginConfig};
use crate::principal::AuthMethod;
use crate::resolver::DEFAULT_LOOKUP_TIMEOUT;
use crate::role::Role;
use crate::store::{bounded, NewSession, SessionStore};
use crate::Secret;

/// Why a login was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginError {
    /// No password, or a blank one.
    #[error("password is required")]
    MissingPassword,
    /// The password matches no configured account.
    #[error("invalid password")]
    InvalidCredentials,
}

/// A login attempt.
#[derive(Debug, Default)]
pub struct LoginRequest {
    /// Submitted password.
    pub password: Option<Secret<String>>,
    /// Display name for the session; the account name when absent.
    pub name: Option<String>,
    /// Client address, stored with the session.
    pub ip_address: Option<String>,
    /// Client user agent, stored with the session.
    pub user_agent: Option<String>,
}

/// A successful login.
#[derive(Debug, Serialize)]
pub struct LoginGrant {
    /// Matched account.
    pub admin_id: i64,
    /// Display name stored with the session.
    pub name: String,
    /// Account role.
    pub role: Role,
    /// Account permission labels.
    pub permissions: Vec<String>,
    /// Bearer token for the browser; send it back with the admin id.
    #[serde(serialize_with = "expose_token")]
    pub token: Secret<String>,
    /// When the session stops resolving.
    pub expires_at: DateTime<Utc>,
    /// Always `BrowserPassword`.
    pub auth_method: AuthMethod,
}

fn expose_token<S: Serializer>(token: &Secret<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(token.expose_secret())
}

/// Verifies passwords against configured argon2 hashes and opens sessions.
pub struct LoginService {
    accounts: Arc<[AdminAccount]>,
    sessions: Arc<dyn SessionStore>,
    session_ttl: Duration,
    failure_delay: Duration,
    store_timeout: Duration,
}

impl LoginService {
    /// Creates a service with a 24 hour session lifetime and a one second
    /// delay on wrong passwords.
    pub fn new(accounts: Vec<AdminAccount>, sessions: Arc<dyn SessionStore>) -> Self {
        Self::from_config(
            LoginConfig {
                admins: accounts,
                ..LoginConfig::default()
            },
            sessions,
        )
    }

    /// Creates a service from the `[login]` table.
    pub fn from_config(config: LoginConfig, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            session_ttl: config.session_ttl(),
            failure_delay: config.failure_delay(),
            accounts: config.admins.into(),
            sessions,
            store_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Session lifetime.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Pause before answering a wrong password.
    pub fn with_failure_delay(mut self, delay: Duration) -> Self {
        self.failure_delay = delay;
        self
    }

    /// Bound on the session insert.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Checks the password and opens a session.
    ///
    /// A session insert failure is logged and the grant is still returned;
    /// the resolver's fallback table covers accounts whose session is lost.
    ///
    /// # Errors
    ///
    /// `MissingPassword` immediately, or `InvalidCredentials` after the
    /// configured delay.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginGrant, LoginError> {
        let LoginRequest {
            password,
            name,
            ip_address,
            user_agent,
        } = request;

        let password = match password {
            Some(p) if !p.is_blank() => p,
            _ => return Err(LoginError::MissingPassword),
        };

        let Some(account) = self.match_account(password).await else {
            tracing::warn!(ip = ip_address.as_deref().unwrap_or(""), "browser login rejected");
            tokio::time::sleep(self.failure_delay).await;
            return Err(LoginError::InvalidCredentials);
        };

        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.session_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(24));
        let expires_at = now + ttl;
        let token = issue_token(account.admin_id, now);
        let name = name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| account.name.clone());

        let session = NewSession {
            admin_id: account.admin_id,
            name: name.clone(),
            role: account.role.clone(),
            token: Secret::new(token.clone()),
            ip_address,
            user_agent,
            created_at: now,
            expires_at,
        };
        if let Err(e) = bounded(self.store_timeout, self.sessions.create_session(session)).await {
            tracing::warn!(
                admin_id = account.admin_id,
                backend = self.sessions.backend_name(),
                error = %e,
                "could not record browser session"
            );
        }

        tracing::info!(admin_id = account.admin_id, role = %account.role, "browser login");
        Ok(LoginGrant {
            admin_id: account.admin_id,
            name,
            role: account.role.clone(),
            permissions: account.permissions.clone(),
            token: Secret::new(token),
            expires_at,
            auth_method: AuthMethod::BrowserPassword,
        })
    }

    /// Argon2 verification runs on the blocking pool.
    async fn match_account(&self, password: Secret<String>) -> Option<&AdminAccount> {
        let accounts = Arc::clone(&self.accounts);
        let matched = tokio::task::spawn_blocking(move || {
            accounts.iter().position(|a| {
                verify_password(a.password_hash.expose_secret(), password.expose_secret())
            })
        })
        .await;
        match matched {
            Ok(index) => index.and_then(|i| self.accounts.get(i)),
            Err(e) => {
                tracing::error!(error = %e, "password verification task failed");
                None
            }
        }
    }
}

/// Issues a browser token bound to `admin_id`.
pub fn issue_token(admin_id: i64, now: DateTime<Utc>) -> String {
    format!(
        "admin_{admin_id}_{}_{}",
        now.timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// Verifies a candidate password against an argon2 PHC string.
pub fn verify_password(hash: &str, candidate: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

/// Hashes a password for `[[login.admins]]` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())?;
    hash_password_with_salt(password, &salt)
}

pub(crate) fn hash_password_with_salt(
    password: &str,
    salt: &SaltString,
) -> Result<String, argon2::password_hash::Error> {
    Argon2::default()
        .hash_password(password.as_bytes(), salt)
        .map(|h| h.to_string())
}
