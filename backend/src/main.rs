use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use productivity_backend::api::router;
use productivity_backend::config::AppConfig;
use productivity_backend::db;
use productivity_backend::feed::TecsupHttpClient;
use productivity_backend::services::{SnapshotScheduler, SummaryService};
use productivity_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "productivity_backend=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    let feed = Arc::new(TecsupHttpClient::from_config(&config)?);

    if let Some(interval) = config.snapshot_interval_secs {
        let scheduler = SnapshotScheduler::new(
            SummaryService::new(pool.clone()),
            interval,
            config.summary_retention_days,
        );
        tokio::spawn(scheduler.start());
        info!("daily snapshot scheduler started (every {}s)", interval);
    }

    let addr = config.bind_addr;
    let state = AppState::new(pool, feed, config);
    let app = router(state);

    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
