//! Dual-mode authorization for the tutoring Mini App API.
//!
//! Every request arrives with one of two credential shapes:
//! - **Telegram**: a numeric subject id set by the Mini App runtime,
//!   resolved against the user store.
//! - **Browser**: a bearer token plus the admin id it claims to belong to,
//!   resolved against the session store and then an injected break-glass
//!   table.
//!
//! [`Resolver::resolve`] turns either into a role-tagged [`Principal`] and
//! checks it against the endpoint's [`RoleAllowList`]. Failures are one of
//! four [`ViolationKind`]s.
//!
//! # Core Types
//!
//! - [`Secret<T>`]: redacts bearer tokens and keys in logs and `Debug` output
//! - [`Tainted<T>`]: raw header values that must pass a [`Sanitizer`]
//! - [`Ctx`]: request context typed by how far resolution got
//! - [`RoleGate`]: an endpoint's role requirement
//! - [`FallbackTable`]: admins admitted when no session row exists
//!
//! # Examples
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use std::sync::Arc;
//! use tutordesk_auth::{
//!     FallbackTable, MemorySessionStore, MemoryUserStore, RequestMeta, Resolver, Role,
//!     RoleAllowList, ViolationKind,
//! };
//!
//! let resolver = Resolver::new(
//!     Arc::new(MemoryUserStore::new()),
//!     Arc::new(MemorySessionStore::new()),
//!     FallbackTable::default().with_entry(7, "Tutor", "tutor"),
//! );
//!
//! // Browser caller with no session row: admitted through the fallback table.
//! let meta = RequestMeta::new("req-1")
//!     .with_admin_token("admin_7_abc123")
//!     .with_admin_id("7");
//! let principal = resolver
//!     .resolve(meta, &RoleAllowList::of(["admin", "tutor"]))
//!     .await
//!     .unwrap();
//! assert_eq!(principal.role(), &Role::Tutor);
//!
//! // A token that does not start with `admin_{id}_` is refused outright.
//! let meta = RequestMeta::new("req-2")
//!     .with_admin_token("admin_8_abc123")
//!     .with_admin_id("7");
//! let err = resolver.resolve(meta, &RoleAllowList::any()).await.unwrap_err();
//! assert_eq!(err.kind, ViolationKind::Unauthenticated);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod config;
mod context;
mod credential;
mod error;
mod fallback;
mod gate;
mod logging;
mod login;
mod principal;
mod request;
mod resolver;
mod role;
mod role_lookup;
mod sanitizer;
mod secret;
mod state;
pub mod store;
mod tainted;
mod verified;
pub mod web;

pub use config::{AuthConfig, ConfigError};
pub use context::Ctx;
pub use credential::{BrowserCredential, Credential, TelegramCredential};
pub use error::{Denial, DenialReason, Error, Violation, ViolationKind};
pub use fallback::{FallbackEntry, FallbackTable};
pub use gate::RoleGate;
pub use logging::RequestLog;
pub use login::{
    hash_password, issue_token, verify_password, LoginError, LoginGrant, LoginRequest, LoginService,
};
pub use principal::{
    AdminPrincipal, AuthMethod, IdentityKind, MemberPrincipal, Origin, Principal, PrincipalBase,
    StudentPrincipal, TelegramProfile, TutorPrincipal,
};
pub use request::{CredentialSignals, RequestMeta};
pub use resolver::{token_bound_to, Resolver, DEFAULT_LOOKUP_TIMEOUT};
pub use role::{Role, RoleAllowList};
pub use role_lookup::{RoleDirectory, RoleSummary, PROSPECT};
pub use sanitizer::{
    AdminIdSanitizer, SanitizationError, SanitizationErrorKind, Sanitizer, SubjectIdSanitizer,
};
pub use secret::Secret;
pub use state::{Authed, Authorized, Unauthed};
pub use store::{MemorySessionStore, MemoryUserStore};
pub use tainted::Tainted;
pub use verified::Verified;
