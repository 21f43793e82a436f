pub mod handlers;

use std::net::SocketAddr;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use log::info;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/time-limit/update", post(handlers::update_time_limit))
        .route("/activity/page-view", post(handlers::page_view))
        .route("/activity/log", post(handlers::log_event))
        .route("/activity/recent", get(handlers::recent_activity))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState, shutdown: CancellationToken) -> Result<()> {
    let app = router(state);

    info!("hubtrack listening on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    Ok(())
}
