use crate::{Secret, Tainted};

/// Metadata about an inbound request, as seen by the resolver.
///
/// Built by the web adapter (or by hand in tests); consumed once by
/// [`Resolver::resolve`](crate::Resolver::resolve).
#[derive(Debug)]
pub struct RequestMeta {
    /// Unique identifier for this request, used in logs and audit events.
    pub request_id: String,
    /// The three raw credential signals.
    pub signals: CredentialSignals,
}

impl RequestMeta {
    /// Creates request metadata with no credential signals set.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            signals: CredentialSignals::default(),
        }
    }

    /// Sets the Telegram subject id signal.
    pub fn with_telegram_id(mut self, raw: impl Into<String>) -> Self {
        self.signals.telegram_id = Some(Tainted::new(raw.into()));
        self
    }

    /// Sets the browser bearer token signal.
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.signals.admin_token = Some(Secret::new(token.into()));
        self
    }

    /// Sets the browser-claimed admin id signal.
    pub fn with_admin_id(mut self, raw: impl Into<String>) -> Self {
        self.signals.admin_id = Some(Tainted::new(raw.into()));
        self
    }
}

/// The raw, unvalidated credential signals a request can carry.
///
/// Header names are a web-layer concern; here the signals are name-agnostic.
#[derive(Debug, Default)]
pub struct CredentialSignals {
    /// Telegram subject id asserted by the Mini App runtime.
    pub telegram_id: Option<Tainted<String>>,
    /// Opaque browser bearer token.
    pub admin_token: Option<Secret<String>>,
    /// Admin id the browser claims the token belongs to.
    pub admin_id: Option<Tainted<String>>,
}

impl CredentialSignals {
    /// Returns `true` when none of the three signals is set.
    pub fn is_empty(&self) -> bool {
        self.telegram_id.is_none() && self.admin_token.is_none() && self.admin_id.is_none()
    }
}
