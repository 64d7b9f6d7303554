//! In-process stores backed by `HashMap`s under `tokio::sync::RwLock`.
//!
//! Not durable. Used by tests, demos and local development. Both stores count
//! every lookup they serve and can be flipped into a failing mode, so callers
//! can observe whether a lookup happened and how a store outage is handled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{NewSession, SessionRecord, SessionStore, StoreError, StoreResult, UserRecord, UserStore};

#[derive(Debug, Default)]
struct Switches {
    lookups: AtomicUsize,
    unavailable: AtomicBool,
}

impl Switches {
    fn hit(&self, backend: &str) -> StoreResult<()> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{backend} switched off")));
        }
        Ok(())
    }
}

/// User store keyed by Telegram id.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<i64, UserRecord>>>,
    switches: Arc<Switches>,
}

impl MemoryUserStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user row.
    pub async fn insert(&self, user: UserRecord) {
        self.users.write().await.insert(user.telegram_id, user);
    }

    /// Number of lookups served so far, failed ones included.
    pub fn lookups(&self) -> usize {
        self.switches.lookups.load(Ordering::SeqCst)
    }

    /// When `true`, every lookup fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.switches.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> StoreResult<Option<UserRecord>> {
        self.switches.hit(self.backend_name())?;
        Ok(self.users.read().await.get(&telegram_id).cloned())
    }

    fn backend_name(&self) -> &'static str {
        "memory-users"
    }
}

#[derive(Debug, Clone)]
struct StoredSession {
    record: SessionRecord,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

/// Browser session store keyed by `(admin_id, token)`.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<(i64, String), StoredSession>>>,
    switches: Arc<Switches>,
}

impl MemorySessionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a session row directly, bypassing the failing mode.
    pub async fn insert(&self, token: impl Into<String>, record: SessionRecord) {
        self.sessions.write().await.insert(
            (record.admin_id, token.into()),
            StoredSession {
                record,
                ip_address: None,
                user_agent: None,
            },
        );
    }

    /// Number of lookups served so far, failed ones included.
    pub fn lookups(&self) -> usize {
        self.switches.lookups.load(Ordering::SeqCst)
    }

    /// When `true`, every lookup and insert fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.switches.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Client details recorded with a session, if the session exists.
    pub async fn client_info(
        &self,
        admin_id: i64,
        token: &str,
    ) -> Option<(Option<String>, Option<String>)> {
        self.sessions
            .read()
            .await
            .get(&(admin_id, token.to_string()))
            .map(|s| (s.ip_address.clone(), s.user_agent.clone()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find_active_session(
        &self,
        admin_id: i64,
        token: &str,
    ) -> StoreResult<Option<SessionRecord>> {
        self.switches.hit(self.backend_name())?;
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&(admin_id, token.to_string()))
            .filter(|s| s.record.expires_at > now)
            .map(|s| s.record.clone()))
    }

    async fn create_session(&self, session: NewSession) -> StoreResult<()> {
        if self.switches.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "{} switched off",
                self.backend_name()
            )));
        }
        let NewSession {
            admin_id,
            name,
            role,
            token,
            ip_address,
            user_agent,
            created_at: _,
            expires_at,
        } = session;

        self.sessions.write().await.insert(
            (admin_id, token.into_exposed()),
            StoredSession {
                record: SessionRecord {
                    admin_id,
                    name,
                    role,
                    expires_at,
                },
                ip_address,
                user_agent,
            },
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory-sessions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use crate::Secret;
    use chrono::Duration;

    fn student(telegram_id: i64) -> UserRecord {
        UserRecord {
            id: "u-1".to_string(),
            telegram_id,
            name: "Maria".to_string(),
            role: Role::Student,
            is_active: true,
            username: None,
            email: None,
        }
    }

    fn session(admin_id: i64, ttl: Duration) -> SessionRecord {
        SessionRecord {
            admin_id,
            name: "Anna".to_string(),
            role: Role::Admin,
            expires_at: Utc::now() + ttl,
        }
    }

    #[tokio::test]
    async fn user_lookup_hits_and_misses() {
        let store = MemoryUserStore::new();
        store.insert(student(42)).await;

        assert!(store.find_user_by_telegram_id(42).await.unwrap().is_some());
        assert!(store.find_user_by_telegram_id(99).await.unwrap().is_none());
        assert_eq!(store.lookups(), 2);
    }

    #[tokio::test]
    async fn failing_user_store_reports_unavailable() {
        let store = MemoryUserStore::new();
        store.insert(student(42)).await;
        store.set_unavailable(true);

        let err = store.find_user_by_telegram_id(42).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn expired_sessions_are_not_active() {
        let store = MemorySessionStore::new();
        store.insert("admin_2_live", session(2, Duration::hours(1))).await;
        store.insert("admin_2_old", session(2, Duration::hours(-1))).await;

        assert!(store.find_active_session(2, "admin_2_live").await.unwrap().is_some());
        assert!(store.find_active_session(2, "admin_2_old").await.unwrap().is_none());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn session_is_bound_to_its_admin_id() {
        let store = MemorySessionStore::new();
        store.insert("admin_2_tok", session(2, Duration::hours(1))).await;

        assert!(store.find_active_session(3, "admin_2_tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn created_sessions_are_found() {
        let store = MemorySessionStore::new();
        let now = Utc::now();
        store
            .create_session(NewSession {
                admin_id: 1,
                name: "Head Admin".to_string(),
                role: Role::Admin,
                token: Secret::new("admin_1_100_x".to_string()),
                ip_address: Some("10.0.0.1".to_string()),
                user_agent: None,
                created_at: now,
                expires_at: now + Duration::hours(24),
            })
            .await
            .unwrap();

        let found = store.find_active_session(1, "admin_1_100_x").await.unwrap();
        assert_eq!(found.map(|s| s.name), Some("Head Admin".to_string()));
        assert_eq!(
            store.client_info(1, "admin_1_100_x").await,
            Some((Some("10.0.0.1".to_string()), None))
        );
    }

    #[tokio::test]
    async fn failing_session_store_rejects_inserts() {
        let store = MemorySessionStore::new();
        store.set_unavailable(true);
        let now = Utc::now();
        let result = store
            .create_session(NewSession {
                admin_id: 1,
                name: "Head Admin".to_string(),
                role: Role::Admin,
                token: Secret::new("admin_1_100_x".to_string()),
                ip_address: None,
                user_agent: None,
                created_at: now,
                expires_at: now,
            })
            .await;
        assert!(result.is_err());
        assert!(store.is_empty().await);
    }
}
