//! Page-view signal intake.
//!
//! Views arrive as a pathname plus optional `?query`. Each one passes through
//! the debouncer and cooldown cache before it becomes a PAGE_VIEW event, so
//! rapid navigation and re-renders collapse to a single record. Keys are
//! scoped per user so one visitor's traffic never suppresses another's.

use std::sync::Arc;

use tokio::time::Duration;

use crate::{
    auth::RequestContext,
    throttle::{Debouncer, ThrottleCache},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_info;

use super::ActivityLogger;

pub struct PageViewTracker {
    debouncer: Debouncer,
    logger: Arc<ActivityLogger>,
}

impl PageViewTracker {
    pub fn new(
        logger: Arc<ActivityLogger>,
        cooldown: Duration,
        debounce: Duration,
        sweep_threshold: usize,
    ) -> Self {
        let throttle = Arc::new(ThrottleCache::new(cooldown, sweep_threshold));
        Self {
            debouncer: Debouncer::new(debounce, throttle),
            logger,
        }
    }

    /// Fire-and-forget: schedules the view for logging and returns
    /// immediately. Anonymous views are dropped here since they could never be
    /// logged anyway.
    pub fn page_view(&self, ctx: RequestContext, path: String) {
        let Some(user) = &ctx.user else {
            return;
        };

        let key = format!("{}:{}", user.id, path);
        log_info!("page view signal for {key}");

        let logger = Arc::clone(&self.logger);
        self.debouncer.emit(key, move || async move {
            logger
                .log_activity(&ctx, "PAGE_VIEW", &path, serde_json::json!({}))
                .await;
        });
    }
}
