use mpr_core::CoreConfig;
use mpr_core::config::data_dir_from_env_value;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the MPR application
///
/// Resolves configuration once, opens the record store and serves the REST API.
///
/// # Environment Variables
/// - `MPR_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MPR_DATA_DIR`: Directory for record storage (default: "record_data")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mpr_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("mpr_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr: SocketAddr = std::env::var("MPR_REST_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".into())
        .parse()?;
    let data_dir = data_dir_from_env_value(std::env::var("MPR_DATA_DIR").ok());

    tracing::info!("++ Starting MPR REST on {}", rest_addr);
    tracing::info!("++ Records in {}", data_dir.display());

    let cfg = Arc::new(CoreConfig::new(data_dir)?);
    let rest_app = api_rest::router(api_rest::AppState::open(cfg)?);

    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, rest_app).await?;

    Ok(())
}
