use std::sync::Arc;

use anyhow::Context;
use docchat_api::{cors_layer, create_router, ApiConfig, AppState};
use docchat_retrieval::RagPipeline;
use docchat_store::MemoryIndex;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "docchat_api=info,docchat_retrieval=info,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    let settings = config.load_settings().context("Failed to load pipeline configuration")?;

    tracing::info!(
        port = config.port,
        index_path = %settings.index_path.display(),
        generator_model = %settings.generator_model,
        "Starting Docchat API server"
    );

    let index = MemoryIndex::load(&settings.index_path).with_context(|| {
        format!(
            "Failed to open the similarity index at {}. Build it with the ingestion pipeline \
             or point DOCCHAT_INDEX_PATH at an existing snapshot",
            settings.index_path.display()
        )
    })?;

    let pipeline = RagPipeline::from_settings(&settings, Arc::new(index))?;
    pipeline.verify_dimensions().await.with_context(|| {
        format!(
            "Embedding model '{}' does not match the index at {}",
            settings.embedder_model,
            settings.index_path.display()
        )
    })?;
    let state = Arc::new(AppState::new(pipeline));

    let app = create_router(state)
        .layer(cors_layer(&config.cors_origin)?)
        .layer(TraceLayer::new_for_http());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", config.cors_origin);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
