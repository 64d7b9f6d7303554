//! In-memory recorder for authorization decisions.

use std::sync::{Mutex, MutexGuard};

use super::AuthDecision;

/// In-memory, append-only list of decisions.
///
/// Shared between concurrent requests behind an `Arc`. Meant for tests and
/// diagnostics; production deployments rely on the `tracing` output of
/// [`AuthDecision::emit`].
///
/// # Example
///
/// ```
/// use tutordesk_auth::audit::{AuditTrail, AuthDecision, ResolutionPath};
///
/// let trail = AuditTrail::new();
/// trail.record(AuthDecision::denied("req-1", ResolutionPath::None, "unauthenticated"));
///
/// assert_eq!(trail.len(), 1);
/// assert_eq!(trail.events()[0].request_id(), "req-1");
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Mutex<Vec<AuthDecision>>,
}

impl AuditTrail {
    /// An empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<AuthDecision>> {
        // A panic while holding the lock cannot leave a Vec push half-done.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends a decision.
    pub fn record(&self, event: AuthDecision) {
        self.guard().push(event);
    }

    /// Snapshot of all decisions in recording order.
    pub fn events(&self) -> Vec<AuthDecision> {
        self.guard().clone()
    }

    /// Number of recorded decisions.
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Drops every recorded decision.
    pub fn clear(&self) {
        self.guard().clear();
    }
}
