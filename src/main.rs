use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use countries_core::{CoreConfig, CountryService};

/// Main entry point for the country mirror server
///
/// Serves the REST API on port 3000 (configurable via COUNTRIES_REST_ADDR).
///
/// # Environment Variables
/// - `COUNTRIES_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `DATABASE_URL` / `DB_DIR` / `DB_NAME`: SQLite database location
/// - `COUNTRIES_API_URL`, `EXCHANGE_API_URL`: external feeds
/// - `FETCH_TIMEOUT_SECS`, `CACHE_DIR`, `GDP_MULTIPLIER_SEED`
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, storage or the listener fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("countries_run=info".parse()?)
                .add_directive("countries_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("COUNTRIES_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = CoreConfig::from_lookup(|key| std::env::var(key).ok())?;
    let service = CountryService::from_config(&cfg)?;
    let app = api_rest::router(service);

    tracing::info!("++ Starting countries REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Countries REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
