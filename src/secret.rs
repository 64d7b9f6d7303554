use std::fmt;

/// A wrapper that keeps bearer tokens and passwords out of logs.
///
/// Browser tokens are capability references: anyone holding one can act as
/// the admin it names until its session row expires. `Secret<T>` makes sure
/// such values never reach a `tracing` field or an error message by accident.
/// The wrapped value is only reachable through [`expose_secret`](Self::expose_secret).
///
/// # Examples
///
/// ```
/// use tutordesk_auth::Secret;
///
/// let token = Secret::new("admin_7_1718000000000_k3j2".to_string());
///
/// assert_eq!(format!("{:?}", token), "[REDACTED]");
/// assert_eq!(format!("{}", token), "[REDACTED]");
/// assert!(token.expose_secret().starts_with("admin_7_"));
/// ```
// Do NOT derive Clone, Copy or Default: a token must have exactly one owner per request.
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// Callers must not log or format the returned reference.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }

    /// Consumes the wrapper and hands the value to a sink that needs ownership
    /// (an HTTP query, a store insert).
    pub fn into_exposed(self) -> T {
        self.inner
    }
}

impl Secret<String> {
    /// Returns `true` when the wrapped string is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.inner.trim().is_empty()
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for Secret<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Secret::new)
    }
}
