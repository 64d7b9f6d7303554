//! Extraction traits and axum extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::context::Ctx;
use crate::error::Violation;
use crate::request::RequestMeta;
use crate::state::Authorized;

/// Extracts resolver input from a framework request.
///
/// Implement this for any request type to feed the resolver without going
/// through axum.
///
/// # Examples
///
/// ```
/// use tutordesk_auth::RequestMeta;
/// use tutordesk_auth::web::ExtractMetadata;
///
/// struct BotUpdate {
///     update_id: u64,
///     from_id: i64,
/// }
///
/// impl ExtractMetadata for BotUpdate {
///     fn extract_metadata(&self) -> RequestMeta {
///         RequestMeta::new(format!("update-{}", self.update_id))
///             .with_telegram_id(self.from_id.to_string())
///     }
/// }
///
/// let meta = BotUpdate { update_id: 9, from_id: 42 }.extract_metadata();
/// assert_eq!(meta.request_id, "update-9");
/// assert!(meta.signals.telegram_id.is_some());
/// ```
pub trait ExtractMetadata {
    /// Builds the request id and raw credential signals.
    fn extract_metadata(&self) -> RequestMeta;
}

/// Hands the context placed by [`require_roles`](super::require_roles) to
/// a handler.
///
/// A route that takes `Ctx<Authorized>` without the middleware in front of
/// it rejects every request as unauthenticated.
impl<S> FromRequestParts<S> for Ctx<Authorized>
where
    S: Send + Sync,
{
    type Rejection = Violation;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Ctx<Authorized>>()
            .cloned()
            .ok_or_else(|| Violation::unauthenticated("request was not authorized"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;
    use axum::http::Request;

    struct Fixed(&'static str);

    impl ExtractMetadata for Fixed {
        fn extract_metadata(&self) -> RequestMeta {
            RequestMeta::new(self.0)
        }
    }

    #[test]
    fn trait_objects_work() {
        let source: Box<dyn ExtractMetadata> = Box::new(Fixed("req-1"));
        let meta = source.extract_metadata();
        assert_eq!(meta.request_id, "req-1");
        assert!(meta.signals.is_empty());
    }

    #[tokio::test]
    async fn missing_context_is_rejected() {
        let (mut parts, ()) = Request::new(()).into_parts();
        let err = Ctx::<Authorized>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated);
    }
}
