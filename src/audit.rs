//! Audit records for authorization decisions.
//!
//! - `AuthDecision`: one terminal decision (authorized or denied)
//! - `AuditTrail`: optional in-memory recorder for decisions
//!
//! Decisions are always emitted through `tracing`; recording them into a
//! trail is opt-in via [`Resolver::with_audit_trail`](crate::Resolver::with_audit_trail).

mod event;
mod trail;

pub use event::{AuditOutcome, AuthDecision, ResolutionPath};
pub use trail::AuditTrail;
