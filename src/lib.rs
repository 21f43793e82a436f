mod activity;
mod auth;
mod db;
mod http;
mod settings;
mod throttle;
mod utils;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::Utc;
use log::warn;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

pub use activity::{
    ActivityLogger, ActivityStore, PageViewTracker, TimeBudgetTracker, UsageReport,
};
pub use auth::{AuthProvider, RequestContext, User};
pub use db::Database;
pub use settings::SettingsStore;
pub use throttle::{Debouncer, ThrottleCache};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: Arc<AuthProvider>,
    pub logger: Arc<ActivityLogger>,
    pub time_budget: Arc<TimeBudgetTracker>,
    pub page_views: Arc<PageViewTracker>,
    pub settings: Arc<SettingsStore>,
}

pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("hubtrack starting up...");

    let data_dir = std::env::var("HUBTRACK_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"));
    std::fs::create_dir_all(&data_dir)?;

    let settings = SettingsStore::new(data_dir.join("settings.json"))?;
    let server = settings.server();
    let tracking = settings.tracking();

    let database = Database::new(data_dir.join(&server.database_file))?;

    // Sessions that expired while the service was down are dead weight.
    let removed = database.delete_expired_sessions(Utc::now()).await?;
    if removed > 0 {
        warn!("Removed {removed} expired auth sessions");
    }

    let store: Arc<dyn ActivityStore> = Arc::new(database.clone());
    let auth = Arc::new(AuthProvider::new(database.clone()));
    let logger = Arc::new(ActivityLogger::new(Arc::clone(&store)));
    let time_budget = Arc::new(TimeBudgetTracker::new(Arc::clone(&store)));
    let page_views = Arc::new(PageViewTracker::new(
        Arc::clone(&logger),
        Duration::from_secs(tracking.cooldown_secs),
        Duration::from_millis(tracking.debounce_ms),
        tracking.sweep_threshold,
    ));

    let state = AppState {
        db: database,
        auth,
        logger,
        time_budget,
        page_views,
        settings: Arc::new(settings),
    };

    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", server.host, server.port))?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    http::serve(addr, state, shutdown).await
}
