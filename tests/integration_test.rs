//! End-to-end resolution against the in-memory stores.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tutordesk_auth::audit::{AuditOutcome, AuditTrail, ResolutionPath};
use tutordesk_auth::store::{SessionRecord, UserRecord};
use tutordesk_auth::{
    AuthMethod, DenialReason, FallbackTable, MemorySessionStore, MemoryUserStore, Principal,
    RequestMeta, Resolver, Role, RoleAllowList, ViolationKind,
};

struct Fixture {
    users: MemoryUserStore,
    sessions: MemorySessionStore,
    trail: Arc<AuditTrail>,
    resolver: Resolver,
}

fn user(telegram_id: i64, name: &str, role: Role, is_active: bool) -> UserRecord {
    UserRecord {
        id: format!("u-{telegram_id}"),
        telegram_id,
        name: name.to_string(),
        role,
        is_active,
        username: None,
        email: Some(format!("{telegram_id}@example.com")),
    }
}

async fn fixture() -> Fixture {
    let users = MemoryUserStore::new();
    users.insert(user(42, "Masha", Role::Student, true)).await;
    users.insert(user(43, "Petya", Role::Student, false)).await;
    users.insert(user(50, "Olga", Role::Tutor, true)).await;

    let sessions = MemorySessionStore::new();
    let trail = Arc::new(AuditTrail::new());
    let resolver = Resolver::new(
        Arc::new(users.clone()),
        Arc::new(sessions.clone()),
        FallbackTable::default()
            .with_entry(1, "Head Admin", "admin")
            .with_entry(7, "Tutor", "tutor")
            .with_entry(9, "Helper", "assistant"),
    )
    .with_audit_trail(trail.clone());

    Fixture {
        users,
        sessions,
        trail,
        resolver,
    }
}

fn staff() -> RoleAllowList {
    RoleAllowList::of(["admin", "tutor"])
}

#[tokio::test]
async fn student_is_refused_on_a_staff_endpoint() {
    let f = fixture().await;

    let err = f
        .resolver
        .resolve(RequestMeta::new("req-1").with_telegram_id("42"), &staff())
        .await
        .unwrap_err();

    let denial = err.denial().expect("forbidden carries a denial");
    assert_eq!(denial.reason, DenialReason::RoleNotAllowed);
    assert_eq!(denial.required.roles(), &[Role::Admin, Role::Tutor]);
    assert_eq!(denial.actual, Role::Student);
}

#[tokio::test]
async fn active_student_resolves_on_an_open_endpoint() {
    let f = fixture().await;

    let principal = f
        .resolver
        .resolve(
            RequestMeta::new("req-2").with_telegram_id("42"),
            &RoleAllowList::any(),
        )
        .await
        .unwrap();

    let Principal::Student(student) = &principal else {
        panic!("expected a student, got {principal:?}");
    };
    assert_eq!(student.base.name, "Masha");
    assert_eq!(student.telegram_id, Some(42));
    assert_eq!(principal.auth_method(), AuthMethod::Telegram);
}

#[tokio::test]
async fn unknown_telegram_user_is_not_found() {
    let f = fixture().await;

    let err = f
        .resolver
        .resolve(RequestMeta::new("req-3").with_telegram_id("99"), &staff())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ViolationKind::NotFound);
}

#[tokio::test]
async fn inactive_user_is_forbidden_even_on_an_open_endpoint() {
    let f = fixture().await;

    let err = f
        .resolver
        .resolve(
            RequestMeta::new("req-4").with_telegram_id("43"),
            &RoleAllowList::any(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.denial().map(|d| d.reason), Some(DenialReason::Inactive));
}

#[tokio::test]
async fn user_store_outage_is_upstream_unavailable() {
    let f = fixture().await;
    f.users.set_unavailable(true);

    let err = f
        .resolver
        .resolve(RequestMeta::new("req-5").with_telegram_id("42"), &staff())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ViolationKind::UpstreamUnavailable);
}

#[tokio::test]
async fn fallback_admits_a_browser_tutor_without_a_session() {
    let f = fixture().await;

    let principal = f
        .resolver
        .resolve(
            RequestMeta::new("req-6")
                .with_admin_token("admin_7_abc123")
                .with_admin_id("7"),
            &staff(),
        )
        .await
        .unwrap();

    assert!(matches!(principal, Principal::Tutor(_)));
    assert_eq!(principal.name(), "Tutor");
    assert_eq!(principal.admin_id(), Some(7));
    assert_eq!(principal.auth_method(), AuthMethod::Browser);
    assert_eq!(f.sessions.lookups(), 1);

    let events = f.trail.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].path(), ResolutionPath::Fallback);
    assert_eq!(events[0].outcome(), AuditOutcome::Authorized);
}

#[tokio::test]
async fn session_role_wins_over_fallback() {
    let f = fixture().await;
    f.sessions
        .insert(
            "admin_7_live",
            SessionRecord {
                admin_id: 7,
                name: "Anna".to_string(),
                role: Role::Admin,
                expires_at: Utc::now() + Duration::hours(1),
            },
        )
        .await;

    let principal = f
        .resolver
        .resolve(
            RequestMeta::new("req-7")
                .with_admin_token("admin_7_live")
                .with_admin_id("7"),
            &staff(),
        )
        .await
        .unwrap();

    assert!(matches!(principal, Principal::Admin(_)));
    assert_eq!(principal.name(), "Anna");
    assert_eq!(f.trail.events()[0].path(), ResolutionPath::Browser);
}

#[tokio::test]
async fn expired_session_falls_back() {
    let f = fixture().await;
    f.sessions
        .insert(
            "admin_7_old",
            SessionRecord {
                admin_id: 7,
                name: "Anna".to_string(),
                role: Role::Admin,
                expires_at: Utc::now() - Duration::minutes(1),
            },
        )
        .await;

    let principal = f
        .resolver
        .resolve(
            RequestMeta::new("req-8")
                .with_admin_token("admin_7_old")
                .with_admin_id("7"),
            &staff(),
        )
        .await
        .unwrap();

    assert_eq!(principal.role(), &Role::Tutor);
}

#[tokio::test]
async fn session_outage_falls_back() {
    let f = fixture().await;
    f.sessions.set_unavailable(true);

    let principal = f
        .resolver
        .resolve(
            RequestMeta::new("req-9")
                .with_admin_token("admin_1_x")
                .with_admin_id("1"),
            &staff(),
        )
        .await
        .unwrap();

    assert_eq!(principal.role(), &Role::Admin);
}

#[tokio::test]
async fn browser_admin_outside_every_tier_is_not_found() {
    let f = fixture().await;

    let err = f
        .resolver
        .resolve(
            RequestMeta::new("req-10")
                .with_admin_token("admin_8_x")
                .with_admin_id("8"),
            &staff(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ViolationKind::NotFound);
}

#[tokio::test]
async fn token_for_another_admin_is_refused_without_lookups() {
    let f = fixture().await;

    for (token, admin_id) in [
        ("admin_1_abc", "7"),
        ("admin_77_abc", "7"),
        ("admin_7", "7"),
        ("user_7_abc", "7"),
    ] {
        let err = f
            .resolver
            .resolve(
                RequestMeta::new("req-11")
                    .with_admin_token(token)
                    .with_admin_id(admin_id),
                &staff(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated, "token {token}");
    }

    assert_eq!(f.sessions.lookups(), 0);
    assert_eq!(f.users.lookups(), 0);
}

#[tokio::test]
async fn browser_credential_wins_when_both_are_present() {
    let f = fixture().await;

    let principal = f
        .resolver
        .resolve(
            RequestMeta::new("req-12")
                .with_telegram_id("42")
                .with_admin_token("admin_7_abc")
                .with_admin_id("7"),
            &staff(),
        )
        .await
        .unwrap();

    assert_eq!(principal.role(), &Role::Tutor);
    assert_eq!(f.sessions.lookups(), 1);
    assert_eq!(f.users.lookups(), 0);
}

#[tokio::test]
async fn no_credential_is_unauthenticated() {
    let f = fixture().await;

    let err = f
        .resolver
        .resolve(RequestMeta::new("req-13"), &RoleAllowList::any())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ViolationKind::Unauthenticated);
    assert_eq!(f.trail.events()[0].path(), ResolutionPath::None);
    assert_eq!(f.trail.events()[0].outcome(), AuditOutcome::Denied);
}

#[tokio::test]
async fn half_a_browser_credential_is_unauthenticated() {
    let f = fixture().await;

    let err = f
        .resolver
        .resolve(
            RequestMeta::new("req-14").with_admin_token("admin_7_abc"),
            &staff(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ViolationKind::Unauthenticated);
    assert_eq!(f.sessions.lookups(), 0);
}

#[tokio::test]
async fn malformed_telegram_id_is_unauthenticated() {
    let f = fixture().await;

    for raw in ["abc", "-5", "0", "12.5"] {
        let err = f
            .resolver
            .resolve(RequestMeta::new("req-15").with_telegram_id(raw), &staff())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated, "id {raw:?}");
    }
    assert_eq!(f.users.lookups(), 0);
}

#[tokio::test]
async fn tutor_passes_a_tutor_endpoint_by_telegram() {
    let f = fixture().await;

    let principal = f
        .resolver
        .resolve(
            RequestMeta::new("req-16").with_telegram_id("50"),
            &RoleAllowList::of(["tutor"]),
        )
        .await
        .unwrap();

    assert_eq!(principal.telegram_id(), Some(50));
    assert_eq!(principal.admin_id(), None);
}

#[tokio::test]
async fn browser_principal_with_a_non_staff_role_keeps_its_admin_id() {
    let f = fixture().await;

    let principal = f
        .resolver
        .resolve(
            RequestMeta::new("req-17")
                .with_admin_token("admin_9_x")
                .with_admin_id("9"),
            &RoleAllowList::any(),
        )
        .await
        .unwrap();

    assert!(matches!(principal, Principal::Member(_)));
    assert_eq!(principal.admin_id(), Some(9));
    let json = serde_json::to_value(&principal).unwrap();
    assert_eq!(json["admin_id"], 9);
    assert_eq!(json["role"], "assistant");
}

#[tokio::test]
async fn zero_padded_admin_id_does_not_match_a_padded_token() {
    let f = fixture().await;

    let err = f
        .resolver
        .resolve(
            RequestMeta::new("req-18")
                .with_admin_token("admin_07_x")
                .with_admin_id("07"),
            &staff(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ViolationKind::Unauthenticated);
    assert_eq!(f.sessions.lookups(), 0);
}
