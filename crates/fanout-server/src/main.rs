use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fanout_core::{CoordinationConfig, Coordinator};
use fanout_server::routes;
use fanout_server::state::AppState;
use fanout_store::{Store, StoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fanout=info".parse()?))
        .with_target(false)
        .init();

    let port: u16 = match std::env::var("FANOUT_SERVER_PORT") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("Invalid FANOUT_SERVER_PORT '{raw}'"))?,
        Err(_) => 5000,
    };
    let addr = format!("0.0.0.0:{port}");

    let coordination = CoordinationConfig::from_env()?;
    let store = Store::redis(&StoreConfig::from_env()?).await?;
    tracing::info!(
        backend = store.backend_name(),
        prefix = coordination.keys.prefix(),
        dedup_scope = %coordination.dedup_scope,
        "Coordination store ready"
    );

    let state = Arc::new(AppState {
        coordinator: Coordinator::new(store, &coordination),
    });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
