use adapter::database::connect_database_with;
use anyhow::{Context, Result};
use registry::AppRegistry;
use shared::config::AppConfig;
use shared::env::{which, Environment};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;
    bootstrap().await
}

fn init_logger() -> Result<()> {
    let log_level = match which() {
        Environment::Development => "debug",
        Environment::Production => "info",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into());

    let subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(subscriber)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

async fn bootstrap() -> Result<()> {
    let app_config = AppConfig::new()?;
    let pool = connect_database_with(&app_config.database);
    pool.setup_schema()
        .await
        .context("Failed to prepare the database schema")?;

    let registry = AppRegistry::new(pool);

    let armed = registry
        .reminder_scheduler()
        .rebuild_all()
        .await
        .context("Failed to rebuild reminder timers")?;
    tracing::info!(armed, "reminder timers rebuilt");

    tracing::info!(admins = app_config.admin.admin_ids.len(), "engine ready");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("shutting down");
    Ok(())
}
