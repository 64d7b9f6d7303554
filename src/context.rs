use crate::error::Violation;
use crate::gate::RoleGate;
use crate::logging::RequestLog;
use crate::principal::Principal;
use crate::state::{Authed, Authorized, Unauthed};

/// Per-request execution context.
///
/// `Ctx<S>` is generic over where the request is in the resolution walk:
/// - `Ctx<Unauthed>`: request id only
/// - `Ctx<Authed>`: a principal was resolved from the credential
/// - `Ctx<Authorized>`: the principal passed the endpoint's role gate
///
/// ```text
/// Ctx<Unauthed> --authenticate--> Ctx<Authed> --authorize(gate)--> Ctx<Authorized>
/// ```
///
/// Contexts are only produced by the resolver; user code cannot construct
/// one, so holding a `Ctx<Authorized>` is proof the checks ran.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::sync::Arc;
/// use tutordesk_auth::{
///     FallbackTable, MemorySessionStore, MemoryUserStore, RequestMeta, Resolver, RoleGate,
/// };
///
/// let resolver = Resolver::new(
///     Arc::new(MemoryUserStore::new()),
///     Arc::new(MemorySessionStore::new()),
///     FallbackTable::default().with_entry(7, "Tutor", "tutor"),
/// );
///
/// let meta = RequestMeta::new("req-1")
///     .with_admin_token("admin_7_abc123")
///     .with_admin_id("7");
///
/// let ctx = resolver
///     .authorize(meta, &RoleGate::new().require("tutor"))
///     .await
///     .unwrap();
/// assert_eq!(ctx.principal().name(), "Tutor");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Ctx<S = Authorized> {
    request_id: String,
    state: S,
}

impl<S> Ctx<S> {
    /// Returns the request id for this context.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Ctx<Unauthed> {
    pub(crate) fn new(request_id: String) -> Self {
        Self {
            request_id,
            state: Unauthed::new(),
        }
    }

    /// Attaches the principal a credential resolved to.
    pub(crate) fn authenticate(self, principal: Principal) -> Ctx<Authed> {
        Ctx {
            request_id: self.request_id,
            state: Authed { principal },
        }
    }
}

impl Ctx<Authed> {
    /// The resolved principal, not yet checked against any gate.
    pub fn principal(&self) -> &Principal {
        &self.state.principal
    }

    /// Runs the role gate.
    ///
    /// # Errors
    ///
    /// Returns the gate's `Forbidden` violation when the role does not pass.
    pub(crate) fn authorize(self, gate: &RoleGate) -> Result<Ctx<Authorized>, Violation> {
        gate.check(&self.state.principal)?;
        Ok(Ctx {
            request_id: self.request_id,
            state: Authorized {
                principal: self.state.principal,
            },
        })
    }
}

impl Ctx<Authorized> {
    /// The authorized principal.
    pub fn principal(&self) -> &Principal {
        &self.state.principal
    }

    /// Consumes the context and returns its principal.
    pub fn into_principal(self) -> Principal {
        self.state.principal
    }

    /// Returns a logger bound to this request and caller.
    pub fn log(&self) -> RequestLog<'_> {
        RequestLog::new(&self.request_id, self.state.principal.role().as_str())
    }
}
