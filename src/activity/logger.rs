//! Fire-and-forget activity recording.
//!
//! Logging must never disrupt the caller's primary flow: an anonymous caller
//! is a silent no-op, and store failures are logged and swallowed. Delivery is
//! best-effort with no retries.

use std::sync::Arc;

use chrono::Utc;
use log::error;

use crate::{
    auth::RequestContext,
    db::models::NewActivityEvent,
};

use super::ActivityStore;

pub struct ActivityLogger {
    store: Arc<dyn ActivityStore>,
}

impl ActivityLogger {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    /// Records one action for the calling user and refreshes their last-seen
    /// mark. The two writes are independent and issued concurrently; either
    /// may fail without affecting the other or the caller.
    pub async fn log_activity(
        &self,
        ctx: &RequestContext,
        action: &str,
        path: &str,
        details: serde_json::Value,
    ) {
        let Some(user) = &ctx.user else {
            // Anonymous actions are never logged.
            return;
        };

        let event = NewActivityEvent {
            user_id: user.id.clone(),
            action: action.to_string(),
            path: path.to_string(),
            details,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
        };

        let user_id = user.id.clone();
        let (inserted, touched) = tokio::join!(
            self.store.insert_activity_event(event),
            self.store.touch_last_seen(&user_id, Utc::now()),
        );

        if let Err(err) = inserted {
            error!("failed to record {action} event for {user_id}: {err:#}");
        }
        if let Err(err) = touched {
            error!("failed to refresh last-seen for {user_id}: {err:#}");
        }
    }
}
