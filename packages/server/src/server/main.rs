// Main entry point for the reminder server

use std::sync::Arc;

use anyhow::{Context, Result};
use reminder_core::kernel::{
    start_scheduler, BaseNotifier, HttpEmailNotifier, LogNotifier, PostgresStore, ServerDeps,
};
use reminder_core::server::{build_app, AppState};
use reminder_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reminder_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dose reminder server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        timezone = %config.schedule.timezone,
        resync_policy = %config.schedule.resync_policy,
        escalation = %config.sweep.escalation,
        "Configuration loaded"
    );
    if let Err(e) = config.sweep.check_coverage() {
        tracing::warn!("{}", e);
    }

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let notifier: Arc<dyn BaseNotifier> = match &config.email {
        Some(email) => Arc::new(HttpEmailNotifier::new(email)?),
        None => {
            tracing::warn!("EMAIL_API_URL not set, reminders will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let store = Arc::new(PostgresStore::new(pool.clone()));
    let deps = ServerDeps::new(
        store.clone(),
        store.clone(),
        store,
        notifier,
        config.schedule.clone(),
        config.sweep.clone(),
    );

    // Start the reminder sweep
    let _scheduler = start_scheduler(deps.clone())
        .await
        .context("Failed to start scheduler")?;

    let app = build_app(AppState {
        db_pool: pool,
        deps,
    });

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
