//! Walks the resolver through each credential path against in-memory stores.
//!
//! ```text
//! RUST_LOG=tutordesk_auth=debug cargo run --example resolve_flow
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;
use tutordesk_auth::audit::AuditTrail;
use tutordesk_auth::store::{NewSession, SessionStore, UserRecord};
use tutordesk_auth::{
    FallbackTable, MemorySessionStore, MemoryUserStore, RequestMeta, Resolver, Role,
    RoleAllowList, Secret,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let users = MemoryUserStore::new();
    users
        .insert(UserRecord {
            id: "u-42".to_string(),
            telegram_id: 42,
            name: "Masha".to_string(),
            role: Role::Student,
            is_active: true,
            username: Some("masha".to_string()),
            email: None,
        })
        .await;

    let sessions = MemorySessionStore::new();
    let now = Utc::now();
    sessions
        .create_session(NewSession {
            admin_id: 1,
            name: "Head Admin".to_string(),
            role: Role::Admin,
            token: Secret::new("admin_1_1700000000000_f00d".to_string()),
            ip_address: None,
            user_agent: None,
            created_at: now,
            expires_at: now + Duration::hours(24),
        })
        .await?;

    let trail = Arc::new(AuditTrail::new());
    let resolver = Resolver::new(
        Arc::new(users),
        Arc::new(sessions),
        FallbackTable::default().with_entry(7, "Tutor", "tutor"),
    )
    .with_audit_trail(trail.clone());

    let staff = RoleAllowList::of(["admin", "tutor"]);
    let cases = [
        ("student on a staff endpoint", RequestMeta::new("req-1").with_telegram_id("42"), &staff),
        (
            "admin with a live session",
            RequestMeta::new("req-2")
                .with_admin_token("admin_1_1700000000000_f00d")
                .with_admin_id("1"),
            &staff,
        ),
        (
            "tutor via the fallback table",
            RequestMeta::new("req-3")
                .with_admin_token("admin_7_abc123")
                .with_admin_id("7"),
            &staff,
        ),
        (
            "token bound to someone else",
            RequestMeta::new("req-4")
                .with_admin_token("admin_1_abc123")
                .with_admin_id("7"),
            &staff,
        ),
        ("unknown telegram user", RequestMeta::new("req-5").with_telegram_id("99"), &staff),
    ];

    for (label, meta, allowed) in cases {
        match resolver.resolve(meta, allowed).await {
            Ok(principal) => println!(
                "{label}: {} ({}) via {:?}",
                principal.name(),
                principal.role(),
                principal.auth_method()
            ),
            Err(violation) => println!("{label}: {violation}"),
        }
    }

    println!();
    for event in trail.events() {
        println!("{event}");
    }
    Ok(())
}
