use std::fmt;

use thiserror::Error;

use crate::role::{Role, RoleAllowList};

/// Errors surfaced by this crate outside of request resolution.
#[derive(Debug, Error)]
pub enum Error {
    /// An authorization violation occurred.
    #[error("authorization violation: {0}")]
    Violation(#[from] Violation),
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Terminal failure of a single authorization resolution.
///
/// Every `Violation` ends processing of the current request; none of them are
/// retried by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Violation {
    /// What went wrong.
    pub kind: ViolationKind,
    /// Human-readable explanation for the caller.
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// No usable credential, or a malformed one.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::Unauthenticated, message)
    }

    /// The credential was well-formed but no tier knows the subject.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::NotFound, message)
    }

    /// A lookup that has no fallback tier failed at the transport level.
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::UpstreamUnavailable, message)
    }

    /// The principal's role is not in `required`.
    pub fn role_not_allowed(required: &RoleAllowList, actual: &Role) -> Self {
        Self::new(
            ViolationKind::Forbidden(Denial {
                reason: DenialReason::RoleNotAllowed,
                required: required.clone(),
                actual: actual.clone(),
            }),
            format!("insufficient role: requires {required}, caller has {actual}"),
        )
    }

    /// The subject exists but is marked inactive.
    pub fn inactive(required: &RoleAllowList, actual: &Role) -> Self {
        Self::new(
            ViolationKind::Forbidden(Denial {
                reason: DenialReason::Inactive,
                required: required.clone(),
                actual: actual.clone(),
            }),
            "account is inactive",
        )
    }

    /// Stable machine-readable code for this violation.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Returns the denial details for `Forbidden` violations.
    pub fn denial(&self) -> Option<&Denial> {
        match &self.kind {
            ViolationKind::Forbidden(denial) => Some(denial),
            _ => None,
        }
    }
}

/// The four terminal failure kinds of authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// No usable credential was presented, or its shape was malformed.
    Unauthenticated,
    /// The credential is well-formed but the subject is unknown to every tier.
    NotFound,
    /// The subject is known but inactive, or holds a role outside the allow-list.
    Forbidden(Denial),
    /// An external store could not be reached during a lookup with no fallback.
    UpstreamUnavailable,
}

impl ViolationKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ViolationKind::Unauthenticated => "unauthenticated",
            ViolationKind::NotFound => "not_found",
            ViolationKind::Forbidden(_) => "forbidden",
            ViolationKind::UpstreamUnavailable => "upstream_unavailable",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Unauthenticated => write!(f, "Unauthenticated"),
            ViolationKind::NotFound => write!(f, "NotFound"),
            ViolationKind::Forbidden(denial) => write!(f, "Forbidden ({})", denial.reason),
            ViolationKind::UpstreamUnavailable => write!(f, "UpstreamUnavailable"),
        }
    }
}

/// Both sides of a `Forbidden` decision.
///
/// Clients rely on seeing the required set and the caller's actual role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    /// Why access was refused.
    pub reason: DenialReason,
    /// The endpoint's allow-list.
    pub required: RoleAllowList,
    /// The role the caller actually holds.
    pub actual: Role,
}

/// Why a known principal was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The account is marked inactive in the user store.
    Inactive,
    /// The role is not a member of the endpoint's allow-list.
    RoleNotAllowed,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::Inactive => write!(f, "inactive"),
            DenialReason::RoleNotAllowed => write!(f, "role not allowed"),
        }
    }
}
