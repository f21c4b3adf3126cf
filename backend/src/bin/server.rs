//! Planner HTTP Server Binary
//!
//! Initializes the repository and recalculation settings, builds the router
//! and serves requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin planner-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `REPOSITORY_TYPE`: Storage backend when no `repository.toml` is found (default: local)
//! - `RECALC_GRACE_DAYS`, `RECALC_DEFAULT_DISTRIBUTION`: recalculation overrides
//! - `RUST_LOG`: Log filter (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use leadtime_planner::db::{self, RecalculationSettings, RepositoryConfig};
use leadtime_planner::http::{create_router, AppState};

fn load_settings() -> RecalculationSettings {
    let base = match RepositoryConfig::from_default_location() {
        Ok(config) => {
            info!("Loaded repository.toml");
            config.recalculation
        }
        Err(e) => {
            warn!("{}; using built-in recalculation defaults", e);
            RecalculationSettings::default()
        }
    };
    base.with_env_overrides()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting planner HTTP server");

    db::init_repository()?;
    let repository = Arc::clone(db::get_repository()?);
    info!("Repository initialized successfully");

    let settings = load_settings();
    info!(
        "Recalculation defaults: distribution={}, grace_days={}, respect_locks={}",
        settings.default_distribution, settings.grace_days, settings.respect_locks
    );

    let app = create_router(AppState::with_settings(repository, settings));

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
