//! The Mini App API router.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};

use crate::config::{AuthConfig, ConfigError};
use crate::context::Ctx;
use crate::error::Violation;
use crate::gate::RoleGate;
use crate::login::{LoginGrant, LoginRequest, LoginService};
use crate::principal::Principal;
use crate::resolver::Resolver;
use crate::role_lookup::{RoleDirectory, RoleSummary};
use crate::secret::Secret;
use crate::state::Authorized;
use crate::store::{
    MemorySessionStore, MemoryUserStore, RestStore, SessionStore, UserStore,
};

use super::error::{bad_request, ApiError};
use super::middleware::{require_roles, RoleGuard};
use super::{ExtractMetadata, HeaderNames, RequestAdapter};

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    /// Dual-mode resolver for gated routes.
    pub resolver: Arc<Resolver>,
    /// Browser password login.
    pub login: Arc<LoginService>,
    /// Start-screen role lookup.
    pub roles: Arc<RoleDirectory>,
    /// Credential header names.
    pub headers: Arc<HeaderNames>,
}

impl AppState {
    /// Wires stores and services from configuration.
    ///
    /// Uses the PostgREST store when both the URL and the service key are
    /// set, and empty in-memory stores otherwise.
    pub fn from_config(config: AuthConfig) -> Result<Self, ConfigError> {
        let headers = Arc::new(HeaderNames::try_from(&config.headers)?);
        let timeout = config.store.lookup_timeout();

        let (users, sessions) = match config.store.rest_config() {
            Some(rest) => {
                let store = RestStore::new(rest)
                    .map_err(|e| ConfigError::Invalid(format!("store client: {e}")))?;
                let store = Arc::new(store);
                tracing::info!(url = %store.rest_url(), "using PostgREST store");
                (
                    store.clone() as Arc<dyn UserStore>,
                    store as Arc<dyn SessionStore>,
                )
            }
            None => {
                tracing::warn!("no store configured, using empty in-memory stores");
                (
                    Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>,
                    Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>,
                )
            }
        };

        let login = LoginService::from_config(config.login, sessions.clone())
            .with_store_timeout(timeout);
        let roles = RoleDirectory::new(users.clone(), config.admin_telegram_ids)
            .with_lookup_timeout(timeout);
        let resolver = Resolver::new(users, sessions, config.fallback).with_lookup_timeout(timeout);

        Ok(Self {
            resolver: Arc::new(resolver),
            login: Arc::new(login),
            roles: Arc::new(roles),
            headers,
        })
    }

    /// A guard enforcing `gate` with this state's resolver.
    pub fn guard(&self, gate: RoleGate) -> RoleGuard {
        RoleGuard::new(self.resolver.clone(), self.headers.clone(), gate)
    }
}

/// Builds the API router.
///
/// - `POST /api/browser-auth`: password login
/// - `GET /api/user-role`: role lookup for the Telegram caller
/// - `GET /api/whoami`: the resolved principal, any role
pub fn router(state: AppState) -> Router {
    let whoami_guard = state.guard(RoleGate::default());

    Router::new()
        .route("/api/browser-auth", post(browser_auth))
        .route("/api/user-role", get(user_role))
        .route(
            "/api/whoami",
            get(whoami).route_layer(middleware::from_fn_with_state(whoami_guard, require_roles)),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct BrowserAuthBody {
    password: Option<Secret<String>>,
    #[serde(default)]
    name: Option<String>,
}

async fn browser_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<BrowserAuthBody>, JsonRejection>,
) -> Result<Json<LoginGrant>, ApiError> {
    let Json(body) = body.map_err(|e| bad_request(e.body_text()))?;

    let request = LoginRequest {
        password: body.password,
        name: body.name,
        ip_address: client_ip(&headers),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    };

    state.login.login(request).await.map(Json).map_err(ApiError::from)
}

async fn user_role(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RoleSummary>, ApiError> {
    let adapter = RequestAdapter::from_headers(&headers, &state.headers);
    let request_id = adapter.request_id().to_owned();

    let Some(subject) = adapter.extract_metadata().signals.telegram_id else {
        return Err(
            ApiError::from(Violation::unauthenticated("telegram id is required"))
                .with_request_id(request_id),
        );
    };

    state
        .roles
        .lookup(subject)
        .await
        .map(Json)
        .map_err(|v| ApiError::from(v).with_request_id(request_id))
}

#[derive(Debug, Serialize)]
struct WhoAmI {
    request_id: String,
    principal: Principal,
}

async fn whoami(ctx: Ctx<Authorized>) -> Json<WhoAmI> {
    ctx.log().info(format_args!("whoami"));
    Json(WhoAmI {
        request_id: ctx.request_id().to_owned(),
        principal: ctx.into_principal(),
    })
}

/// First hop of `x-forwarded-for`, else `x-real-ip`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_owned)
}
