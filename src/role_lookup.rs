//! Role lookup for the Mini App start screen.
//!
//! Unlike the resolver this never refuses a known Telegram user: callers
//! that are not configured admins and not active students are reported as
//! `prospect` so the client can show the sign-up flow.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error::Violation;
use crate::resolver::DEFAULT_LOOKUP_TIMEOUT;
use crate::role::Role;
use crate::sanitizer::{Sanitizer, SubjectIdSanitizer};
use crate::store::{bounded, UserStore};
use crate::Tainted;

/// Role reported for callers the Mini App does not know yet.
pub const PROSPECT: &str = "prospect";

/// What the start screen needs to know about a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    /// `admin`, `student` or `prospect`.
    pub role: Role,
    /// Echo of the caller's id.
    pub telegram_id: i64,
    /// Only reported for active students.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Maps Telegram ids to a coarse role.
pub struct RoleDirectory {
    users: Arc<dyn UserStore>,
    admin_ids: HashSet<i64>,
    lookup_timeout: Duration,
}

impl RoleDirectory {
    /// Creates a directory; `admin_ids` are reported as `admin` without a lookup.
    pub fn new(users: Arc<dyn UserStore>, admin_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            users,
            admin_ids: admin_ids.into_iter().collect(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Bound on the user store lookup.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Looks up the caller's role.
    ///
    /// Configured admin ids answer without touching the store.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for a malformed id, `UpstreamUnavailable` when the
    /// user store fails. An unknown id is not an error.
    pub async fn lookup(&self, subject: Tainted<String>) -> Result<RoleSummary, Violation> {
        let telegram_id = SubjectIdSanitizer
            .sanitize(subject)
            .map_err(|e| Violation::unauthenticated(e.to_string()))?
            .into_inner();

        if self.admin_ids.contains(&telegram_id) {
            return Ok(RoleSummary {
                role: Role::Admin,
                telegram_id,
                name: None,
            });
        }

        let lookup = self.users.find_user_by_telegram_id(telegram_id);
        let user = bounded(self.lookup_timeout, lookup).await.map_err(|e| {
            tracing::error!(
                backend = self.users.backend_name(),
                error = %e,
                "role lookup failed"
            );
            Violation::upstream_unavailable("user store unavailable")
        })?;

        Ok(match user {
            Some(user) if user.role == Role::Student && user.is_active => RoleSummary {
                role: Role::Student,
                telegram_id,
                name: Some(user.name),
            },
            _ => RoleSummary {
                role: Role::Other(PROSPECT.to_owned()),
                telegram_id,
                name: None,
            },
        })
    }
}
