//! PostgREST (Supabase) adapter for both stores.
//!
//! Every call is a single HTTP request with no retries. The service key is
//! sent both as the `apikey` header and as a bearer token, which is what the
//! hosted backend expects for server-side access.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{NewSession, SessionRecord, SessionStore, StoreError, StoreResult, UserRecord, UserStore};
use crate::role::Role;
use crate::Secret;

const USER_COLUMNS: &str = "id,telegram_id,name,role,is_active,username,email";
const SESSION_COLUMNS: &str = "admin_id,name,role,expires_at";

/// Connection settings for [`RestStore`].
#[derive(Debug)]
pub struct RestStoreConfig {
    /// Project URL, without the `/rest/v1` suffix.
    pub base_url: String,
    /// Service-role key.
    pub service_key: Secret<String>,
    /// Table holding Mini App users.
    pub users_table: String,
    /// Table holding browser sessions.
    pub sessions_table: String,
    /// Upper bound on a single request.
    pub timeout: Duration,
}

/// User and session store over the PostgREST HTTP API.
pub struct RestStore {
    client: reqwest::Client,
    rest_url: String,
    service_key: Secret<String>,
    users_table: String,
    sessions_table: String,
    timeout: Duration,
}

impl RestStore {
    /// Builds the HTTP client. No request is made until the first lookup.
    pub fn new(config: RestStoreConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", config.base_url.trim_end_matches('/')),
            service_key: config.service_key,
            users_table: config.users_table,
            sessions_table: config.sessions_table,
            timeout: config.timeout,
        })
    }

    /// PostgREST root, `{base_url}/rest/v1`.
    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        let key = self.service_key.expose_secret();
        self.client
            .request(method, format!("{}/{table}", self.rest_url))
            .header("apikey", key.as_str())
            .bearer_auth(key)
    }

    fn transport_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else {
            StoreError::Unavailable(err.to_string())
        }
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&'static str, String)],
    ) -> StoreResult<Option<T>> {
        let resp = self
            .request(reqwest::Method::GET, table)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| self.transport_error(e))?;
        first_row(&body)
    }
}

#[async_trait]
impl UserStore for RestStore {
    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> StoreResult<Option<UserRecord>> {
        self.select_one(&self.users_table, &user_query(telegram_id))
            .await
    }

    fn backend_name(&self) -> &'static str {
        "postgrest"
    }
}

#[async_trait]
impl SessionStore for RestStore {
    async fn find_active_session(
        &self,
        admin_id: i64,
        token: &str,
    ) -> StoreResult<Option<SessionRecord>> {
        self.select_one(
            &self.sessions_table,
            &session_query(admin_id, token, Utc::now()),
        )
        .await
    }

    async fn create_session(&self, session: NewSession) -> StoreResult<()> {
        let row = SessionRow::from(session);
        let resp = self
            .request(reqwest::Method::POST, &self.sessions_table)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if status.is_success() {
            tracing::debug!(admin_id = row.admin_id, "browser session recorded");
            Ok(())
        } else {
            Err(StoreError::Rejected {
                status: status.as_u16(),
            })
        }
    }

    fn backend_name(&self) -> &'static str {
        "postgrest"
    }
}

/// Insert body for the sessions table. Only exists for the duration of one request.
#[derive(Serialize)]
struct SessionRow {
    admin_id: i64,
    name: String,
    role: Role,
    token: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<NewSession> for SessionRow {
    fn from(s: NewSession) -> Self {
        Self {
            admin_id: s.admin_id,
            name: s.name,
            role: s.role,
            token: s.token.into_exposed(),
            ip_address: s.ip_address,
            user_agent: s.user_agent,
            created_at: s.created_at,
            expires_at: s.expires_at,
        }
    }
}

fn user_query(telegram_id: i64) -> Vec<(&'static str, String)> {
    vec![
        ("select", USER_COLUMNS.to_string()),
        ("telegram_id", format!("eq.{telegram_id}")),
        ("limit", "1".to_string()),
    ]
}

fn session_query(admin_id: i64, token: &str, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
    vec![
        ("select", SESSION_COLUMNS.to_string()),
        ("admin_id", format!("eq.{admin_id}")),
        ("token", format!("eq.{token}")),
        (
            "expires_at",
            format!("gt.{}", now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ),
        ("limit", "1".to_string()),
    ]
}

/// PostgREST always answers a filtered select with a JSON array.
fn first_row<T: DeserializeOwned>(body: &[u8]) -> StoreResult<Option<T>> {
    let rows: Vec<T> =
        serde_json::from_slice(body).map_err(|e| StoreError::Decode(e.to_string()))?;
    Ok(rows.into_iter().next())
}
