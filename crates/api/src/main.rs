use anyhow::{Context, Result};
use std::sync::Arc;

use api::{build_pipeline, logging, server, AppConfig};

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init_tracing(&config.logging);

    // Backends use blocking HTTP clients, so build them before any runtime
    // exists and keep them alive past its shutdown.
    let pipeline = build_pipeline(&config)?;
    let state = Arc::new(server::AppState::new(pipeline, config.display.clone()));

    let runtime = tokio::runtime::Runtime::new().context("Failed to start server runtime")?;
    let app = server::router(state.clone());
    let bind = config.server.bind.clone();

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&bind)
            .await
            .with_context(|| format!("Failed to bind {}", bind))?;

        tracing::info!("Server listening on http://{}", bind);

        axum::serve(listener, app).await.context("Server error")
    })?;

    drop(runtime);
    drop(state);
    Ok(())
}
