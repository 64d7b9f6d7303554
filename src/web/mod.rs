//! HTTP boundary.
//!
//! Header values enter here as raw strings and leave as a [`RequestMeta`]
//! whose signals are `Tainted`/`Secret`. Nothing in this module decides who
//! the caller is; that is the resolver's job.
//!
//! # Integration
//!
//! 1. [`RequestAdapter`] reads the configured credential headers.
//! 2. [`require_roles`] runs the resolver against one endpoint's gate.
//! 3. Handlers take [`Ctx<Authorized>`](crate::Ctx) as an extractor.
//!
//! Denials are answered with [`ApiError`]: `401`, `403`, `404` or `503` and
//! a JSON body. A `403` body carries `required_roles` and `actual_role`.
//!
//! [`RequestMeta`]: crate::RequestMeta

mod adapter;
mod error;
mod extract;
mod middleware;
mod routes;

pub use adapter::{HeaderNames, RequestAdapter};
pub use error::{bad_request, status_for, ApiError, ErrorBody};
pub use extract::ExtractMetadata;
pub use middleware::{require_roles, RoleGuard};
pub use routes::{router, AppState};
