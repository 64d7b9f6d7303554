//! Role-gating middleware.
//!
//! ```text
//! HTTP request
//!   -> RequestAdapter (headers -> RequestMeta)
//!   -> Resolver::authorize(meta, gate)
//!   -> Ctx<Authorized> in request extensions
//!   -> handler
//! ```
//!
//! Denials never reach the handler; they are answered here with the JSON
//! error body.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::gate::RoleGate;
use crate::resolver::Resolver;

use super::error::ApiError;
use super::{ExtractMetadata, HeaderNames, RequestAdapter};

/// State for [`require_roles`]: a resolver plus one endpoint's gate.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Router};
/// use tutordesk_auth::web::{require_roles, HeaderNames, RoleGuard};
/// use tutordesk_auth::{
///     FallbackTable, MemorySessionStore, MemoryUserStore, Resolver, RoleGate,
/// };
///
/// let resolver = Arc::new(Resolver::new(
///     Arc::new(MemoryUserStore::new()),
///     Arc::new(MemorySessionStore::new()),
///     FallbackTable::default(),
/// ));
/// let guard = RoleGuard::new(
///     resolver,
///     Arc::new(HeaderNames::default()),
///     RoleGate::new().require("admin").require("tutor"),
/// );
///
/// let app: Router = Router::new()
///     .route("/api/lessons", get(|| async { "ok" }))
///     .route_layer(middleware::from_fn_with_state(guard, require_roles));
/// ```
#[derive(Clone)]
pub struct RoleGuard {
    resolver: Arc<Resolver>,
    headers: Arc<HeaderNames>,
    gate: RoleGate,
}

impl RoleGuard {
    /// Creates a guard for one endpoint.
    pub fn new(resolver: Arc<Resolver>, headers: Arc<HeaderNames>, gate: RoleGate) -> Self {
        Self {
            resolver,
            headers,
            gate,
        }
    }

    /// The gate this guard enforces.
    pub fn gate(&self) -> &RoleGate {
        &self.gate
    }
}

/// Resolves the caller and lets the request through only if the guard's
/// gate admits them.
///
/// Use with [`axum::middleware::from_fn_with_state`].
pub async fn require_roles(
    State(guard): State<RoleGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let adapter = RequestAdapter::from_headers(request.headers(), &guard.headers);
    let request_id = adapter.request_id().to_owned();

    match guard
        .resolver
        .authorize(adapter.extract_metadata(), &guard.gate)
        .await
    {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(violation) => ApiError::from(violation)
            .with_request_id(request_id)
            .into_response(),
    }
}
