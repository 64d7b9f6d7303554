//! External collaborators: the user store and the browser session store.
//!
//! Lookups are single-shot. "Not found" is `Ok(None)`; every `Err` is a
//! transport or storage failure and is never treated as "not found".

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::role::Role;
use crate::Secret;

pub mod memory;
pub mod rest;

pub use memory::{MemorySessionStore, MemoryUserStore};
pub use rest::{RestStore, RestStoreConfig};

/// Failure talking to an external store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The lookup did not finish within the configured bound.
    #[error("store lookup timed out after {0:?}")]
    Timeout(Duration),
    /// The store answered with a non-success status.
    #[error("store rejected request with status {status}")]
    Rejected {
        /// HTTP status returned by the store.
        status: u16,
    },
    /// The store answered with something we could not decode.
    #[error("malformed store response: {0}")]
    Decode(String),
}

/// Result of a store call.
pub type StoreResult<T> = Result<T, StoreError>;

/// A row of the user store, looked up by Telegram id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    /// Row id; the backend may use integers or UUIDs.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Telegram user id.
    pub telegram_id: i64,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Stored role, verbatim.
    pub role: Role,
    /// Inactive users are refused.
    #[serde(default)]
    pub is_active: bool,
    /// Telegram username.
    #[serde(default)]
    pub username: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
}

/// An active browser session row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionRecord {
    /// Admin the session belongs to.
    pub admin_id: i64,
    /// Display name chosen at login.
    pub name: String,
    /// Role granted at login.
    pub role: Role,
    /// Session end.
    pub expires_at: DateTime<Utc>,
}

/// A session to record after a successful password login.
#[derive(Debug)]
pub struct NewSession {
    /// Account the session belongs to.
    pub admin_id: i64,
    /// Display name.
    pub name: String,
    /// Role the session resolves to.
    pub role: Role,
    /// Issued bearer token; only the store adapter exposes it.
    pub token: Secret<String>,
    /// Client address at login.
    pub ip_address: Option<String>,
    /// Client user agent at login.
    pub user_agent: Option<String>,
    /// Login time.
    pub created_at: DateTime<Utc>,
    /// After this the session no longer resolves.
    pub expires_at: DateTime<Utc>,
}

/// Looks up Mini App users by Telegram id.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Ok(None)` when no row matches.
    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> StoreResult<Option<UserRecord>>;

    /// Short name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Looks up and records browser sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Finds a session for `(admin_id, token)` whose `expires_at` is in the future.
    async fn find_active_session(
        &self,
        admin_id: i64,
        token: &str,
    ) -> StoreResult<Option<SessionRecord>>;

    /// Records a session after a password login.
    async fn create_session(&self, session: NewSession) -> StoreResult<()>;

    /// Short name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Runs a store call with an upper bound on its duration.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
