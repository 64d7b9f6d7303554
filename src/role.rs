use std::fmt;

use serde::{Deserialize, Serialize};

/// A role name as stored in the user store or session store.
///
/// The three roles the Mini App knows about get their own variants; any other
/// value is kept verbatim in [`Role::Other`] so that a stored role is never
/// rewritten on its way to a handler.
///
/// # Examples
///
/// ```
/// use tutordesk_auth::Role;
///
/// assert_eq!(Role::parse("tutor"), Role::Tutor);
/// assert_eq!(Role::parse("prospect"), Role::Other("prospect".to_string()));
/// assert_eq!(Role::Admin.as_str(), "admin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Teaching staff.
    Tutor,
    /// Enrolled student.
    Student,
    /// Any other stored role, verbatim.
    Other(String),
}

impl Role {
    /// Parses a stored role name. Matching is exact; no case folding.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => Role::Admin,
            "tutor" => Role::Tutor,
            "student" => Role::Student,
            other => Role::Other(other.to_string()),
        }
    }

    /// Returns the stored spelling of this role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Tutor => "tutor",
            Role::Student => "student",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        Role::parse(&raw)
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Role::parse(raw)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of roles an endpoint accepts.
///
/// Order of insertion is kept (it shows up in error payloads) and duplicates
/// are dropped. An empty list means "any authenticated principal".
///
/// # Examples
///
/// ```
/// use tutordesk_auth::{Role, RoleAllowList};
///
/// let staff = RoleAllowList::any()
///     .allow(Role::Admin)
///     .allow(Role::Tutor)
///     .allow(Role::Admin); // deduplicated
///
/// assert_eq!(staff.roles().len(), 2);
/// assert!(staff.permits(&Role::Tutor));
/// assert!(!staff.permits(&Role::Student));
/// assert!(RoleAllowList::any().permits(&Role::Student));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleAllowList {
    roles: Vec<Role>,
}

impl RoleAllowList {
    /// An empty allow-list: every authenticated principal passes.
    pub fn any() -> Self {
        Self { roles: Vec::new() }
    }

    /// Builds an allow-list from roles, keeping first occurrence order.
    pub fn of<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        roles.into_iter().fold(Self::any(), |list, r| list.allow(r))
    }

    /// Adds a role unless an equal one is already present.
    pub fn allow(mut self, role: impl Into<Role>) -> Self {
        let role = role.into();
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    /// Returns `true` when `role` passes this list.
    pub fn permits(&self, role: &Role) -> bool {
        self.roles.is_empty() || self.roles.contains(role)
    }

    /// Returns `true` for the "any authenticated principal" list.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// The accepted roles in insertion order.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl fmt::Display for RoleAllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.roles.is_empty() {
            return f.write_str("any");
        }
        for (i, role) in self.roles.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            f.write_str(role.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_roles_parse_to_variants() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("tutor"), Role::Tutor);
        assert_eq!(Role::parse("student"), Role::Student);
    }

    #[test]
    fn unknown_roles_are_kept_verbatim() {
        let role = Role::parse("Admin");
        assert_eq!(role, Role::Other("Admin".to_string()));
        assert_eq!(role.as_str(), "Admin");
    }

    #[test]
    fn role_serializes_as_plain_string() {
        let json = serde_json::to_string(&Role::Tutor).unwrap();
        assert_eq!(json, "\"tutor\"");

        let back: Role = serde_json::from_str("\"prospect\"").unwrap();
        assert_eq!(back, Role::Other("prospect".to_string()));
    }

    #[test]
    fn allow_list_keeps_order_and_dedupes() {
        let list = RoleAllowList::of(["tutor", "admin", "tutor"]);
        assert_eq!(list.roles(), &[Role::Tutor, Role::Admin]);
        assert_eq!(list.to_string(), "tutor or admin");
    }

    #[test]
    fn empty_allow_list_permits_everything() {
        let list = RoleAllowList::any();
        assert!(list.is_empty());
        assert!(list.permits(&Role::Other("prospect".to_string())));
        assert_eq!(list.to_string(), "any");
    }

    #[test]
    fn allow_list_serializes_as_array() {
        let list = RoleAllowList::of([Role::Admin, Role::Tutor]);
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json, serde_json::json!(["admin", "tutor"]));
    }
}
