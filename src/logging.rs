use std::fmt;

/// A request-bound logger handed out by an authorized context.
///
/// Every event carries the request id and the caller's role, so handler
/// logs line up with the resolver's own span. Tokens are `Secret` values
/// and render as `[REDACTED]` if they are ever formatted into a message.
#[derive(Debug)]
pub struct RequestLog<'a> {
    request_id: &'a str,
    role: &'a str,
}

impl<'a> RequestLog<'a> {
    /// Only `Ctx<Authorized>` creates these.
    pub(crate) fn new(request_id: &'a str, role: &'a str) -> Self {
        Self { request_id, role }
    }

    /// Returns the request id attached to every event.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs at info level.
    ///
    /// ```no_run
    /// # fn example(log: &tutordesk_auth::RequestLog<'_>) {
    /// log.info(format_args!("loaded {} lessons", 3));
    /// # }
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, role = %self.role, "{}", args);
    }

    /// Logs at warn level.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, role = %self.role, "{}", args);
    }

    /// Logs at error level.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(request_id = %self.request_id, role = %self.role, "{}", args);
    }

    /// Logs at debug level.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, role = %self.role, "{}", args);
    }
}
