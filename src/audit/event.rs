//! Authorization decision events.
//!
//! Events hold only safe metadata: request id, the path taken, the outcome
//! and the caller's role and subject id. Tokens and raw header values never
//! reach an event.

use std::fmt;

use serde::Serialize;

/// Which tier produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    /// No credential, or an incomplete one.
    None,
    /// User-store lookup by Telegram id.
    Telegram,
    /// Session-store lookup by admin id and token.
    Browser,
    /// Break-glass table after the session store had no answer.
    Fallback,
}

impl ResolutionPath {
    /// Label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPath::None => "none",
            ResolutionPath::Telegram => "telegram",
            ResolutionPath::Browser => "browser",
            ResolutionPath::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// A principal was returned.
    Authorized,
    /// A violation was returned.
    Denied,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Authorized => write!(f, "authorized"),
            AuditOutcome::Denied => write!(f, "denied"),
        }
    }
}

/// One authorization decision.
///
/// # Example
///
/// ```
/// use tutordesk_auth::audit::{AuditOutcome, AuthDecision, ResolutionPath};
///
/// let event = AuthDecision::denied("req-9", ResolutionPath::Telegram, "not_found");
///
/// assert_eq!(event.outcome(), AuditOutcome::Denied);
/// assert_eq!(event.code(), Some("not_found"));
/// assert!(event.role().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthDecision {
    request_id: String,
    path: ResolutionPath,
    outcome: AuditOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
}

impl AuthDecision {
    /// A successful resolution.
    pub fn authorized(
        request_id: impl Into<String>,
        path: ResolutionPath,
        role: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            path,
            outcome: AuditOutcome::Authorized,
            code: None,
            role: Some(role.into()),
            subject: Some(subject.into()),
        }
    }

    /// A failed resolution with its violation code.
    pub fn denied(request_id: impl Into<String>, path: ResolutionPath, code: &'static str) -> Self {
        Self {
            request_id: request_id.into(),
            path,
            outcome: AuditOutcome::Denied,
            code: Some(code),
            role: None,
            subject: None,
        }
    }

    /// Records the role of a known caller that was still refused.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Request the decision belongs to.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Which credential path was taken.
    pub fn path(&self) -> ResolutionPath {
        self.path
    }

    /// Authorized or denied.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Violation code of a denial.
    pub fn code(&self) -> Option<&'static str> {
        self.code
    }

    /// Resolved role, when the caller was identified.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Caller id, never a token.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Emits the event through `tracing` under the `audit` target.
    pub fn emit(&self) {
        match self.outcome {
            AuditOutcome::Authorized => tracing::info!(
                target: "tutordesk_auth::audit",
                request_id = %self.request_id,
                path = %self.path,
                outcome = %self.outcome,
                role = self.role.as_deref().unwrap_or(""),
                subject = self.subject.as_deref().unwrap_or(""),
                "authorization decision"
            ),
            AuditOutcome::Denied => tracing::warn!(
                target: "tutordesk_auth::audit",
                request_id = %self.request_id,
                path = %self.path,
                outcome = %self.outcome,
                code = self.code.unwrap_or(""),
                role = self.role.as_deref().unwrap_or(""),
                "authorization decision"
            ),
        }
    }
}

impl fmt::Display for AuthDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuthDecision[outcome={}, path={}, request_id={}",
            self.outcome, self.path, self.request_id
        )?;
        if let Some(code) = self.code {
            write!(f, ", code={code}")?;
        }
        if let Some(role) = &self.role {
            write!(f, ", role={role}")?;
        }
        if let Some(subject) = &self.subject {
            write!(f, ", subject={subject}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorized_event_carries_role_and_subject() {
        let event = AuthDecision::authorized("req-1", ResolutionPath::Fallback, "tutor", "7");
        assert_eq!(event.outcome(), AuditOutcome::Authorized);
        assert_eq!(event.path(), ResolutionPath::Fallback);
        assert_eq!(event.role(), Some("tutor"));
        assert_eq!(event.subject(), Some("7"));
        assert!(event.code().is_none());
    }

    #[test]
    fn denied_event_can_name_the_role() {
        let event = AuthDecision::denied("req-2", ResolutionPath::Telegram, "forbidden")
            .with_role("student");
        assert_eq!(
            event.to_string(),
            "AuthDecision[outcome=denied, path=telegram, request_id=req-2, code=forbidden, role=student]"
        );
    }

    #[test]
    fn serializes_without_empty_fields() {
        let json = serde_json::to_value(AuthDecision::denied(
            "req-3",
            ResolutionPath::None,
            "unauthenticated",
        ))
        .unwrap();
        assert_eq!(json["path"], "none");
        assert_eq!(json["outcome"], "denied");
        assert!(json.get("role").is_none());
        assert!(json.get("subject").is_none());
    }

    #[test]
    fn emit_does_not_panic_without_subscriber() {
        AuthDecision::authorized("req-4", ResolutionPath::Browser, "admin", "2").emit();
    }
}
