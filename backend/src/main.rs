use anyhow::Context;
use minitwit::{
    config::AppConfig,
    db,
    web_server::{run_server, AppState},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- Setup ---
    // 1. Initialize structured logging (RUST_LOG overrides the default level)
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 2. Load configuration and open the database
    let app_config = AppConfig::from_env().context("Failed to load configuration")?;

    let db_pool = db::connect(&app_config.database)
        .await
        .context("Failed to connect to the database")?;
    db::run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    let app_state =
        AppState::new(db_pool, app_config).context("Failed to register metrics")?;

    // --- Run Server ---
    tracing::info!("Initializing server...");
    run_server(app_state).await.context("Server error")?;
    Ok(())
}
