//! The normalized result of authorization.
//!
//! A [`Principal`] is built fresh for every request and never persisted here.
//! Its shape depends on the role: staff see the full Telegram profile,
//! students get a reduced one, any other role gets the shared base only.

use serde::Serialize;

use crate::role::Role;

/// Which credential family produced the principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// Telegram subject id from the Mini App runtime.
    Telegram,
    /// Browser bearer token plus admin id.
    Browser,
}

/// How the caller authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Resolved through the user store by Telegram id.
    Telegram,
    /// Resolved through a browser session or the fallback table.
    Browser,
    /// Issued by a password login; only appears on login grants.
    BrowserPassword,
}

/// Fields every principal variant carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalBase {
    /// Credential family.
    pub identity: IdentityKind,
    /// Opaque subject id: the user row id, or the admin id for browser callers.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Role, verbatim from whichever tier resolved the caller.
    pub role: Role,
    /// Authentication method tag.
    pub auth_method: AuthMethod,
}

/// Telegram-side profile data from the user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelegramProfile {
    /// Telegram user id.
    pub telegram_id: i64,
    /// Telegram username, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Contact email, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Active flag from the user store.
    pub is_active: bool,
}

/// Where the principal's extra fields come from.
#[derive(Debug, Clone)]
pub enum Origin {
    /// A user-store row.
    Telegram(TelegramProfile),
    /// A browser session row or fallback entry.
    Browser {
        /// The admin id the token is bound to.
        admin_id: i64,
    },
}

/// Administrator principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminPrincipal {
    /// Shared fields.
    #[serde(flatten)]
    pub base: PrincipalBase,
    /// Admin id, for browser-resolved callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<i64>,
    /// User-store profile, for Telegram-resolved callers.
    #[serde(flatten)]
    pub telegram: Option<TelegramProfile>,
}

/// Tutor principal. Same visibility as an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TutorPrincipal {
    /// Shared fields.
    #[serde(flatten)]
    pub base: PrincipalBase,
    /// Admin id, for browser-resolved callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<i64>,
    /// User-store profile, for Telegram-resolved callers.
    #[serde(flatten)]
    pub telegram: Option<TelegramProfile>,
}

/// Student principal. Email and the active flag are not exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentPrincipal {
    /// Shared fields.
    #[serde(flatten)]
    pub base: PrincipalBase,
    /// Telegram user id, for Telegram-resolved callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<i64>,
    /// Telegram username, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Admin id, for browser-resolved callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<i64>,
}

/// Principal holding any role the Mini App has no special handling for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberPrincipal {
    /// Shared fields.
    #[serde(flatten)]
    pub base: PrincipalBase,
    /// Telegram user id, for Telegram-resolved callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<i64>,
    /// Admin id, for browser-resolved callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<i64>,
}

/// The resolved caller, one variant per role.
///
/// # Examples
///
/// ```
/// use tutordesk_auth::{AuthMethod, IdentityKind, Origin, Principal, PrincipalBase, Role};
///
/// let principal = Principal::assemble(
///     PrincipalBase {
///         identity: IdentityKind::Browser,
///         id: "7".to_string(),
///         name: "Tutor".to_string(),
///         role: Role::Tutor,
///         auth_method: AuthMethod::Browser,
///     },
///     Origin::Browser { admin_id: 7 },
/// );
///
/// assert!(matches!(principal, Principal::Tutor(_)));
/// assert_eq!(principal.admin_id(), Some(7));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Principal {
    /// `admin` role.
    Admin(AdminPrincipal),
    /// `tutor` role.
    Tutor(TutorPrincipal),
    /// `student` role.
    Student(StudentPrincipal),
    /// Any other role.
    Member(MemberPrincipal),
}

impl Principal {
    /// Builds the role-specific variant, dropping fields the role may not see.
    pub fn assemble(base: PrincipalBase, origin: Origin) -> Self {
        let (admin_id, profile) = match origin {
            Origin::Telegram(profile) => (None, Some(profile)),
            Origin::Browser { admin_id } => (Some(admin_id), None),
        };

        match base.role {
            Role::Admin => Principal::Admin(AdminPrincipal {
                base,
                admin_id,
                telegram: profile,
            }),
            Role::Tutor => Principal::Tutor(TutorPrincipal {
                base,
                admin_id,
                telegram: profile,
            }),
            Role::Student => {
                let (telegram_id, username) = match profile {
                    Some(p) => (Some(p.telegram_id), p.username),
                    None => (None, None),
                };
                Principal::Student(StudentPrincipal {
                    base,
                    telegram_id,
                    username,
                    admin_id,
                })
            }
            Role::Other(_) => Principal::Member(MemberPrincipal {
                base,
                telegram_id: profile.map(|p| p.telegram_id),
                admin_id,
            }),
        }
    }

    /// The shared base record.
    pub fn base(&self) -> &PrincipalBase {
        match self {
            Principal::Admin(p) => &p.base,
            Principal::Tutor(p) => &p.base,
            Principal::Student(p) => &p.base,
            Principal::Member(p) => &p.base,
        }
    }

    /// The caller's role.
    pub fn role(&self) -> &Role {
        &self.base().role
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.base().name
    }

    /// Opaque subject id.
    pub fn id(&self) -> &str {
        &self.base().id
    }

    /// Authentication method tag.
    pub fn auth_method(&self) -> AuthMethod {
        self.base().auth_method
    }

    /// Credential family.
    pub fn identity(&self) -> IdentityKind {
        self.base().identity
    }

    /// Admin id for browser-resolved callers, whatever their role.
    pub fn admin_id(&self) -> Option<i64> {
        match self {
            Principal::Admin(p) => p.admin_id,
            Principal::Tutor(p) => p.admin_id,
            Principal::Student(p) => p.admin_id,
            Principal::Member(p) => p.admin_id,
        }
    }

    /// Telegram id for Telegram-resolved callers.
    pub fn telegram_id(&self) -> Option<i64> {
        match self {
            Principal::Admin(p) => p.telegram.as_ref().map(|t| t.telegram_id),
            Principal::Tutor(p) => p.telegram.as_ref().map(|t| t.telegram_id),
            Principal::Student(p) => p.telegram_id,
            Principal::Member(p) => p.telegram_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telegram_base(role: Role) -> PrincipalBase {
        PrincipalBase {
            identity: IdentityKind::Telegram,
            id: "u-1".to_string(),
            name: "Maria".to_string(),
            role,
            auth_method: AuthMethod::Telegram,
        }
    }

    fn profile() -> TelegramProfile {
        TelegramProfile {
            telegram_id: 42,
            username: Some("maria".to_string()),
            email: Some("maria@example.com".to_string()),
            is_active: true,
        }
    }

    #[test]
    fn admin_keeps_full_profile() {
        let p = Principal::assemble(telegram_base(Role::Admin), Origin::Telegram(profile()));
        let json = serde_json::to_value(&p).unwrap();

        assert_eq!(json["role"], "admin");
        assert_eq!(json["auth_method"], "telegram");
        assert_eq!(json["telegram_id"], 42);
        assert_eq!(json["email"], "maria@example.com");
        assert_eq!(json["is_active"], true);
        assert!(json.get("admin_id").is_none());
    }

    #[test]
    fn student_has_no_email() {
        let p = Principal::assemble(telegram_base(Role::Student), Origin::Telegram(profile()));
        let json = serde_json::to_value(&p).unwrap();

        assert_eq!(json["role"], "student");
        assert_eq!(json["telegram_id"], 42);
        assert_eq!(json["username"], "maria");
        assert!(json.get("email").is_none());
        assert!(json.get("is_active").is_none());
    }

    #[test]
    fn other_roles_become_members() {
        let p = Principal::assemble(
            telegram_base(Role::Other("prospect".to_string())),
            Origin::Telegram(profile()),
        );
        assert!(matches!(p, Principal::Member(_)));
        assert_eq!(p.telegram_id(), Some(42));

        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["role"], "prospect");
        assert!(json.get("username").is_none());
    }

    #[test]
    fn browser_staff_carry_admin_id() {
        let base = PrincipalBase {
            identity: IdentityKind::Browser,
            id: "2".to_string(),
            name: "Anna".to_string(),
            role: Role::Admin,
            auth_method: AuthMethod::Browser,
        };
        let p = Principal::assemble(base, Origin::Browser { admin_id: 2 });

        assert_eq!(p.admin_id(), Some(2));
        assert_eq!(p.telegram_id(), None);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["admin_id"], 2);
        assert_eq!(json["identity"], "browser");
        assert!(json.get("telegram_id").is_none());
    }

    #[test]
    fn browser_non_staff_keep_admin_id() {
        for role in [Role::Student, Role::Other("assistant".to_string())] {
            let base = PrincipalBase {
                identity: IdentityKind::Browser,
                id: "9".to_string(),
                name: "Helper".to_string(),
                role: role.clone(),
                auth_method: AuthMethod::Browser,
            };
            let p = Principal::assemble(base, Origin::Browser { admin_id: 9 });

            assert_eq!(p.admin_id(), Some(9), "role {role}");
            let json = serde_json::to_value(&p).unwrap();
            assert_eq!(json["admin_id"], 9, "role {role}");
            assert!(json.get("telegram_id").is_none());
        }
    }

    #[test]
    fn accessors_read_the_base() {
        let p = Principal::assemble(telegram_base(Role::Tutor), Origin::Telegram(profile()));
        assert_eq!(p.role(), &Role::Tutor);
        assert_eq!(p.name(), "Maria");
        assert_eq!(p.id(), "u-1");
        assert_eq!(p.auth_method(), AuthMethod::Telegram);
        assert_eq!(p.identity(), IdentityKind::Telegram);
    }
}
