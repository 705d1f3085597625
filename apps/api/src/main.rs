mod config;
mod errors;
mod llm_client;
mod pipelines;
mod prompt;
mod routes;
mod schema;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::AnthropicClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter_directive(&config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Waypoint API v{}", env!("CARGO_PKG_VERSION"));

    // One stateless generation client shared by every pipeline invocation
    let llm = Arc::new(AnthropicClient::new(
        config.anthropic_api_key.clone(),
        config.generation_timeout,
    ));
    info!("Generation client initialized (model: {})", llm_client::MODEL);

    // Pipelines are immutable after definition; invocations run concurrently
    // without coordination
    let state = AppState {
        llm,
        career_paths: Arc::new(pipelines::career_paths::pipeline(config.generation_timeout)),
        roadmap: Arc::new(pipelines::roadmap::pipeline(config.generation_timeout)),
        resume_parser: Arc::new(pipelines::resume_parser::pipeline(config.generation_timeout)),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Default tracing directive scoped to this crate. Cargo exposes the package
/// name with a hyphen, but event targets carry the underscored module path,
/// so the name must be underscored for the directive to match anything.
fn default_filter_directive(rust_log: &str) -> String {
    format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), rust_log)
}
