//! The dual-mode authorization resolver.
//!
//! One walk per request:
//!
//! ```text
//! Start -> CredentialExtracted -> {TelegramPath | BrowserPath} -> RoleChecked -> {Authorized | Denied}
//! ```
//!
//! Nothing is retried. Store lookups are bounded by a timeout. A Telegram
//! lookup failure is terminal (`UpstreamUnavailable`); a session lookup
//! failure falls through to the break-glass table.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::audit::{AuditTrail, AuthDecision, ResolutionPath};
use crate::context::Ctx;
use crate::credential::{BrowserCredential, Credential, TelegramCredential};
use crate::error::Violation;
use crate::fallback::FallbackTable;
use crate::gate::RoleGate;
use crate::principal::{AuthMethod, IdentityKind, Origin, Principal, PrincipalBase, TelegramProfile};
use crate::request::RequestMeta;
use crate::role::{Role, RoleAllowList};
use crate::sanitizer::{AdminIdSanitizer, Sanitizer, SubjectIdSanitizer};
use crate::state::Authorized;
use crate::store::{bounded, SessionStore, UserRecord, UserStore};

/// Default upper bound on a single store lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

const NOT_RECOGNIZED: &str = "principal not recognized";

/// Resolves request credentials into an authorized [`Principal`].
///
/// Cheap to share: hold it in an `Arc` and call it from any number of
/// concurrent requests. The fallback table is read-only after construction.
pub struct Resolver {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    fallback: Arc<FallbackTable>,
    lookup_timeout: Duration,
    audit: Option<Arc<AuditTrail>>,
}

impl Resolver {
    /// Creates a resolver over the two stores and an injected fallback table.
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        fallback: FallbackTable,
    ) -> Self {
        Self {
            users,
            sessions,
            fallback: Arc::new(fallback),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            audit: None,
        }
    }

    /// Overrides the per-lookup timeout.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Also records every decision into `trail`.
    pub fn with_audit_trail(mut self, trail: Arc<AuditTrail>) -> Self {
        self.audit = Some(trail);
        self
    }

    /// The injected break-glass table.
    pub fn fallback(&self) -> &FallbackTable {
        &self.fallback
    }

    /// Resolves the caller and enforces `allowed_roles`.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated`: no usable credential, or a token not bound to its admin id
    /// - `NotFound`: the subject is unknown to every tier
    /// - `Forbidden`: inactive account, or role outside `allowed_roles`
    /// - `UpstreamUnavailable`: the user store failed during a Telegram lookup
    pub async fn resolve(
        &self,
        meta: RequestMeta,
        allowed_roles: &RoleAllowList,
    ) -> Result<Principal, Violation> {
        self.authorize(meta, &RoleGate::from(allowed_roles))
            .await
            .map(|ctx| ctx.into_principal())
    }

    /// Same walk as [`resolve`](Self::resolve), returning the authorized context.
    pub async fn authorize(
        &self,
        meta: RequestMeta,
        gate: &RoleGate,
    ) -> Result<Ctx<Authorized>, Violation> {
        let RequestMeta {
            request_id,
            signals,
        } = meta;
        let span = tracing::info_span!(
            "authorize",
            request_id = %request_id,
            path = tracing::field::Empty,
        );

        async move {
            let credential = Credential::extract(signals);
            tracing::debug!(credential = credential.path(), "credential extracted");

            let (path, resolved) = self.walk(credential, gate.allowed()).await;
            tracing::Span::current().record("path", path.as_str());

            let result = resolved.and_then(|principal| {
                Ctx::new(request_id.clone())
                    .authenticate(principal)
                    .authorize(gate)
            });
            self.record(&request_id, path, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn walk(
        &self,
        credential: Credential,
        required: &RoleAllowList,
    ) -> (ResolutionPath, Result<Principal, Violation>) {
        match credential {
            Credential::Absent => (
                ResolutionPath::None,
                Err(Violation::unauthenticated("no credential presented")),
            ),
            Credential::Incomplete => (
                ResolutionPath::None,
                Err(Violation::unauthenticated(
                    "browser credential needs both a token and an admin id",
                )),
            ),
            Credential::Telegram(cred) => (
                ResolutionPath::Telegram,
                self.resolve_telegram(cred, required).await,
            ),
            Credential::Browser(cred) => self.resolve_browser(cred).await,
        }
    }

    async fn resolve_telegram(
        &self,
        cred: TelegramCredential,
        required: &RoleAllowList,
    ) -> Result<Principal, Violation> {
        let telegram_id = SubjectIdSanitizer
            .sanitize(cred.subject)
            .map_err(|e| Violation::unauthenticated(e.to_string()))?
            .into_inner();

        let lookup = self.users.find_user_by_telegram_id(telegram_id);
        let record = match bounded(self.lookup_timeout, lookup).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(Violation::not_found(NOT_RECOGNIZED)),
            Err(e) => {
                tracing::error!(
                    backend = self.users.backend_name(),
                    error = %e,
                    "user store lookup failed"
                );
                return Err(Violation::upstream_unavailable("user store unavailable"));
            }
        };

        if !record.is_active {
            return Err(Violation::inactive(required, &record.role));
        }
        Ok(telegram_principal(record))
    }

    async fn resolve_browser(
        &self,
        cred: BrowserCredential,
    ) -> (ResolutionPath, Result<Principal, Violation>) {
        let admin_id = match AdminIdSanitizer.sanitize(cred.admin_id) {
            Ok(id) => id.into_inner(),
            Err(e) => {
                return (
                    ResolutionPath::Browser,
                    Err(Violation::unauthenticated(e.to_string())),
                )
            }
        };

        let token = cred.token.expose_secret();
        if !token_bound_to(token, admin_id) {
            return (
                ResolutionPath::Browser,
                Err(Violation::unauthenticated(
                    "token is not bound to the claimed admin id",
                )),
            );
        }

        let lookup = self.sessions.find_active_session(admin_id, token);
        match bounded(self.lookup_timeout, lookup).await {
            Ok(Some(session)) => {
                return (
                    ResolutionPath::Browser,
                    Ok(browser_principal(admin_id, session.name, session.role)),
                );
            }
            Ok(None) => tracing::debug!(admin_id, "no active session, consulting fallback table"),
            Err(e) => tracing::warn!(
                admin_id,
                backend = self.sessions.backend_name(),
                error = %e,
                "session store lookup failed, consulting fallback table"
            ),
        }

        let result = match self.fallback.get(admin_id) {
            Some(entry) => Ok(browser_principal(
                admin_id,
                entry.name.clone(),
                entry.role.clone(),
            )),
            None => Err(Violation::not_found(NOT_RECOGNIZED)),
        };
        (ResolutionPath::Fallback, result)
    }

    fn record(
        &self,
        request_id: &str,
        path: ResolutionPath,
        result: &Result<Ctx<Authorized>, Violation>,
    ) {
        let event = match result {
            Ok(ctx) => {
                let principal = ctx.principal();
                AuthDecision::authorized(request_id, path, principal.role().as_str(), principal.id())
            }
            Err(violation) => {
                let event = AuthDecision::denied(request_id, path, violation.code());
                match violation.denial() {
                    Some(denial) => event.with_role(denial.actual.as_str()),
                    None => event,
                }
            }
        };
        event.emit();
        if let Some(trail) = &self.audit {
            trail.record(event);
        }
    }
}

/// A browser token must start with `admin_{admin_id}_`.
///
/// This is a structural binding only; the session row carries expiry.
pub fn token_bound_to(token: &str, admin_id: i64) -> bool {
    token
        .strip_prefix("admin_")
        .and_then(|rest| rest.strip_prefix(admin_id.to_string().as_str()))
        .is_some_and(|rest| rest.starts_with('_'))
}

fn telegram_principal(record: UserRecord) -> Principal {
    let UserRecord {
        id,
        telegram_id,
        name,
        role,
        is_active,
        username,
        email,
    } = record;

    Principal::assemble(
        PrincipalBase {
            identity: IdentityKind::Telegram,
            id,
            name,
            role,
            auth_method: AuthMethod::Telegram,
        },
        Origin::Telegram(TelegramProfile {
            telegram_id,
            username,
            email,
            is_active,
        }),
    )
}

fn browser_principal(admin_id: i64, name: String, role: Role) -> Principal {
    Principal::assemble(
        PrincipalBase {
            identity: IdentityKind::Browser,
            id: admin_id.to_string(),
            name,
            role,
            auth_method: AuthMethod::Browser,
        },
        Origin::Browser { admin_id },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditOutcome;
    use crate::error::{DenialReason, ViolationKind};
    use crate::store::{MemorySessionStore, MemoryUserStore, SessionRecord};
    use chrono::Utc;

    struct Fixture {
        users: MemoryUserStore,
        sessions: MemorySessionStore,
        trail: Arc<AuditTrail>,
        resolver: Resolver,
    }

    fn fixture(fallback: FallbackTable) -> Fixture {
        let users = MemoryUserStore::new();
        let sessions = MemorySessionStore::new();
        let trail = Arc::new(AuditTrail::new());
        let resolver = Resolver::new(
            Arc::new(users.clone()),
            Arc::new(sessions.clone()),
            fallback,
        )
        .with_audit_trail(Arc::clone(&trail));
        Fixture {
            users,
            sessions,
            trail,
            resolver,
        }
    }

    fn user(telegram_id: i64, role: Role, is_active: bool) -> UserRecord {
        UserRecord {
            id: format!("u-{telegram_id}"),
            telegram_id,
            name: "Maria".to_string(),
            role,
            is_active,
            username: Some("maria".to_string()),
            email: Some("maria@example.com".to_string()),
        }
    }

    #[test]
    fn token_binding_is_a_prefix_check() {
        assert!(token_bound_to("admin_7_abc123", 7));
        assert!(token_bound_to("admin_7_", 7));
        assert!(!token_bound_to("admin_71_abc", 7));
        assert!(!token_bound_to("admin_7abc", 7));
        assert!(!token_bound_to("admin_8_abc", 7));
        assert!(!token_bound_to("xadmin_7_abc", 7));
        assert!(!token_bound_to("", 7));
    }

    #[tokio::test]
    async fn telegram_student_resolves() {
        let fx = fixture(FallbackTable::default());
        fx.users.insert(user(42, Role::Student, true)).await;

        let principal = fx
            .resolver
            .resolve(RequestMeta::new("r").with_telegram_id("42"), &RoleAllowList::any())
            .await
            .unwrap();

        assert!(matches!(principal, Principal::Student(_)));
        assert_eq!(principal.auth_method(), AuthMethod::Telegram);
        assert_eq!(principal.telegram_id(), Some(42));
    }

    #[tokio::test]
    async fn non_numeric_telegram_id_is_unauthenticated_without_lookup() {
        let fx = fixture(FallbackTable::default());
        let err = fx
            .resolver
            .resolve(RequestMeta::new("r").with_telegram_id("42abc"), &RoleAllowList::any())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ViolationKind::Unauthenticated);
        assert_eq!(fx.users.lookups(), 0);
    }

    #[tokio::test]
    async fn inactive_user_is_forbidden_not_missing() {
        let fx = fixture(FallbackTable::default());
        fx.users.insert(user(42, Role::Tutor, false)).await;

        let err = fx
            .resolver
            .resolve(RequestMeta::new("r").with_telegram_id("42"), &RoleAllowList::any())
            .await
            .unwrap_err();

        assert_eq!(err.denial().map(|d| d.reason), Some(DenialReason::Inactive));
        assert_eq!(err.denial().map(|d| d.actual.clone()), Some(Role::Tutor));
    }

    #[tokio::test]
    async fn user_store_outage_is_upstream_unavailable() {
        let fx = fixture(FallbackTable::default());
        fx.users.set_unavailable(true);

        let err = fx
            .resolver
            .resolve(RequestMeta::new("r").with_telegram_id("42"), &RoleAllowList::any())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ViolationKind::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn session_store_outage_falls_back() {
        let fx = fixture(FallbackTable::default().with_entry(2, "Anna", "admin"));
        fx.sessions.set_unavailable(true);

        let principal = fx
            .resolver
            .resolve(
                RequestMeta::new("r")
                    .with_admin_token("admin_2_1700000000000_x")
                    .with_admin_id("2"),
                &RoleAllowList::of(["admin"]),
            )
            .await
            .unwrap();

        assert_eq!(principal.name(), "Anna");
        assert_eq!(principal.admin_id(), Some(2));
        assert_eq!(fx.sessions.lookups(), 1);
        assert_eq!(fx.trail.events()[0].path(), ResolutionPath::Fallback);
    }

    #[tokio::test]
    async fn unknown_admin_with_no_session_is_not_found() {
        let fx = fixture(FallbackTable::default());
        let err = fx
            .resolver
            .resolve(
                RequestMeta::new("r")
                    .with_admin_token("admin_5_abc")
                    .with_admin_id("5"),
                &RoleAllowList::any(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ViolationKind::NotFound);
    }

    #[tokio::test]
    async fn incomplete_browser_pair_is_unauthenticated() {
        let fx = fixture(FallbackTable::default().with_entry(7, "Tutor", "tutor"));
        let err = fx
            .resolver
            .resolve(RequestMeta::new("r").with_admin_id("7"), &RoleAllowList::any())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated);
        assert_eq!(fx.sessions.lookups(), 0);
    }

    #[tokio::test]
    async fn slow_session_store_times_out_into_fallback() {
        use crate::store::{NewSession, StoreResult};
        use async_trait::async_trait;

        struct Stalled;

        #[async_trait]
        impl SessionStore for Stalled {
            async fn find_active_session(
                &self,
                _admin_id: i64,
                _token: &str,
            ) -> StoreResult<Option<SessionRecord>> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(None)
            }

            async fn create_session(&self, _session: NewSession) -> StoreResult<()> {
                Ok(())
            }

            fn backend_name(&self) -> &'static str {
                "stalled"
            }
        }

        let resolver = Resolver::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(Stalled),
            FallbackTable::default().with_entry(3, "Tutor", "tutor"),
        )
        .with_lookup_timeout(Duration::from_millis(20));

        let principal = resolver
            .resolve(
                RequestMeta::new("r")
                    .with_admin_token("admin_3_x")
                    .with_admin_id("3"),
                &RoleAllowList::any(),
            )
            .await
            .unwrap();
        assert_eq!(principal.role(), &Role::Tutor);
    }

    #[tokio::test]
    async fn decisions_are_audited() {
        let fx = fixture(FallbackTable::default());
        fx.users.insert(user(42, Role::Student, true)).await;
        fx.sessions
            .insert(
                "admin_1_tok",
                SessionRecord {
                    admin_id: 1,
                    name: "Head Admin".to_string(),
                    role: Role::Admin,
                    expires_at: Utc::now() + chrono::Duration::hours(1),
                },
            )
            .await;

        let _ = fx
            .resolver
            .resolve(RequestMeta::new("a"), &RoleAllowList::any())
            .await;
        let _ = fx
            .resolver
            .resolve(
                RequestMeta::new("b").with_telegram_id("42"),
                &RoleAllowList::of(["admin"]),
            )
            .await;
        let _ = fx
            .resolver
            .resolve(
                RequestMeta::new("c")
                    .with_admin_token("admin_1_tok")
                    .with_admin_id("1"),
                &RoleAllowList::any(),
            )
            .await;

        let events = fx.trail.events();
        assert_eq!(events.len(), 3);

        assert_eq!(events[0].path(), ResolutionPath::None);
        assert_eq!(events[0].code(), Some("unauthenticated"));

        assert_eq!(events[1].path(), ResolutionPath::Telegram);
        assert_eq!(events[1].code(), Some("forbidden"));
        assert_eq!(events[1].role(), Some("student"));

        assert_eq!(events[2].outcome(), AuditOutcome::Authorized);
        assert_eq!(events[2].path(), ResolutionPath::Browser);
        assert_eq!(events[2].subject(), Some("1"));
    }
}
