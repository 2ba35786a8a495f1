//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging against a scratch data directory. The workspace's
//! main `mpr-run` binary serves the same router.

use mpr_core::config::data_dir_from_env_value;
use mpr_core::CoreConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the MPR REST API server
///
/// # Environment Variables
/// - `MPR_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `MPR_DATA_DIR`: Record directory (default: "record_data")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the data directory cannot be created, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("mpr_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MPR_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = data_dir_from_env_value(std::env::var("MPR_DATA_DIR").ok());

    tracing::info!("-- Starting MPR REST API on {}", addr);
    tracing::info!("-- Records in {}", data_dir.display());

    let cfg = Arc::new(CoreConfig::new(data_dir)?);
    let app = api_rest::router(api_rest::AppState::open(cfg)?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
