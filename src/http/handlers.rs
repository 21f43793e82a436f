//! Request handlers.
//!
//! Tracking endpoints always answer HTTP 200; failures are reported in the
//! body (`success: false`) so a failed report can never break a client's
//! navigation. Callers identify themselves with a bearer token; unknown or
//! missing tokens make the request anonymous rather than rejected.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap},
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};

use crate::{auth::RequestContext, db::models::ActivityEvent, AppState};

const DEFAULT_RECENT_LIMIT: usize = 20;
const MAX_RECENT_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagePayload {
    pub seconds: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewPayload {
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPayload {
    pub action: String,
    pub path: String,
    #[serde(default = "empty_details")]
    pub details: serde_json::Value,
}

fn empty_details() -> serde_json::Value {
    serde_json::json!({})
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed() -> Self {
        Self {
            success: false,
            error: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn update_time_limit(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<UsagePayload>,
) -> Json<StatusResponse> {
    let ctx = request_context(&state, &headers, peer).await;
    let report = state.time_budget.report_usage(&ctx, payload.seconds).await;

    Json(if report.success {
        StatusResponse::ok()
    } else {
        StatusResponse::failed()
    })
}

pub async fn page_view(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<PageViewPayload>,
) -> Json<StatusResponse> {
    let ctx = request_context(&state, &headers, peer).await;
    state.page_views.page_view(ctx, payload.path);

    // Fire-and-forget: the actual logging happens behind the debounce.
    Json(StatusResponse::ok())
}

pub async fn log_event(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<LogPayload>,
) -> Json<StatusResponse> {
    let ctx = request_context(&state, &headers, peer).await;
    state
        .logger
        .log_activity(&ctx, &payload.action, &payload.path, payload.details)
        .await;

    Json(StatusResponse::ok())
}

pub async fn recent_activity(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<RecentQuery>,
) -> Json<Vec<ActivityEvent>> {
    let ctx = request_context(&state, &headers, peer).await;
    let Some(user) = &ctx.user else {
        return Json(Vec::new());
    };

    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(MAX_RECENT_LIMIT);

    match state.db.list_recent_events_for_user(&user.id, limit).await {
        Ok(events) => Json(events),
        Err(err) => {
            error!("failed to list recent events for {}: {err:#}", user.id);
            Json(Vec::new())
        }
    }
}

async fn request_context(state: &AppState, headers: &HeaderMap, peer: SocketAddr) -> RequestContext {
    let token = bearer_token(headers);
    let user = state.auth.current_user(token.as_deref()).await;

    let ip_address = forwarded_client_ip(headers).unwrap_or_else(|| peer.ip().to_string());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    RequestContext {
        user,
        ip_address,
        user_agent,
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// First hop of `X-Forwarded-For`, when a reverse proxy fronts the service.
fn forwarded_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}
