//! Runs the Mini App auth API.
//!
//! ```text
//! TUTORDESK_AUTH_CONFIG=auth.toml \
//! SUPABASE_URL=https://project.supabase.co \
//! SUPABASE_SERVICE_ROLE_KEY=... \
//! RUST_LOG=tutordesk_auth=debug \
//! cargo run --example miniapp_server
//! ```
//!
//! Without a store URL the server runs against empty in-memory stores, so
//! only fallback-table admins can get through `/api/whoami`.

use tracing_subscriber::EnvFilter;
use tutordesk_auth::web::{router, AppState};
use tutordesk_auth::AuthConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AuthConfig::from_env()?;
    let state = AppState::from_config(config)?;
    let app = router(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
