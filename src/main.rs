use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use hopital_core::{
    config::{database_url_from_env_value, max_image_bytes_from_env_value},
    CoreConfig, Database,
};

/// Main entry point for the Hopital application
///
/// Opens (and migrates) the database, then serves the REST API with its
/// OpenAPI/Swagger documentation until interrupted.
///
/// # Environment Variables
/// - `HOPITAL_DATABASE_URL`: SQLite database URL (default: "sqlite://hopital.db")
/// - `HOPITAL_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `HOPITAL_MAX_IMAGE_BYTES`: largest accepted image upload (default: 10 MiB)
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, database or server startup fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hopital=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = database_url_from_env_value(std::env::var("HOPITAL_DATABASE_URL").ok());
    let max_image_bytes =
        max_image_bytes_from_env_value(std::env::var("HOPITAL_MAX_IMAGE_BYTES").ok())?;
    let rest_addr =
        std::env::var("HOPITAL_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::new(database_url, max_image_bytes)?);
    let db = Database::open(&cfg).await?;

    let app = router(AppState::new(db.clone(), cfg));

    tracing::info!("++ Starting Hopital REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("-- Hopital REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
    }
}
