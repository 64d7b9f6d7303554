use crate::{
    error::Violation,
    principal::Principal,
    role::{Role, RoleAllowList},
};

/// Role-authority enforcement for one endpoint.
///
/// A gate with no requirements admits any resolved principal. Otherwise the
/// principal's role must be one of the required roles; a mismatch is
/// `Forbidden` and the violation carries both the required set and the
/// caller's actual role.
///
/// # Examples
///
/// ```
/// use tutordesk_auth::{Role, RoleGate};
///
/// let gate = RoleGate::new()
///     .require(Role::Admin)
///     .require(Role::Tutor)
///     .require(Role::Admin); // deduplicated
///
/// assert_eq!(gate.allowed().roles(), &[Role::Admin, Role::Tutor]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGate {
    allowed: RoleAllowList,
}

impl RoleGate {
    /// A gate that admits every resolved principal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required role, deduplicating identical requirements.
    pub fn require(mut self, role: impl Into<Role>) -> Self {
        self.allowed = self.allowed.allow(role);
        self
    }

    /// The roles this gate accepts.
    pub fn allowed(&self) -> &RoleAllowList {
        &self.allowed
    }

    /// Checks a principal against the gate.
    ///
    /// # Errors
    ///
    /// Returns a `Forbidden` violation when the role is not accepted.
    pub fn check(&self, principal: &Principal) -> Result<(), Violation> {
        let role = principal.role();
        if self.allowed.permits(role) {
            Ok(())
        } else {
            Err(Violation::role_not_allowed(&self.allowed, role))
        }
    }
}

impl From<RoleAllowList> for RoleGate {
    fn from(allowed: RoleAllowList) -> Self {
        Self { allowed }
    }
}

impl From<&RoleAllowList> for RoleGate {
    fn from(allowed: &RoleAllowList) -> Self {
        Self {
            allowed: allowed.clone(),
        }
    }
}
