//! Rolling daily counter of active seconds per user.
//!
//! Tracking is opt-in per profile; unlimited accounts never touch the store.
//! "Today" is anchored to the UTC calendar date. Failures degrade to a
//! `success: false` report and never reach the caller's UI.

use std::sync::Arc;

use chrono::Utc;
use log::error;
use serde::Serialize;

use crate::auth::RequestContext;

use super::ActivityStore;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub success: bool,
}

impl UsageReport {
    fn ok() -> Self {
        Self { success: true }
    }

    fn failed() -> Self {
        Self { success: false }
    }
}

pub struct TimeBudgetTracker {
    store: Arc<dyn ActivityStore>,
}

impl TimeBudgetTracker {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    /// Adds `seconds` of reported usage to the caller's daily counter.
    ///
    /// Client-supplied timing is noisy, so non-positive deltas are a lenient
    /// success-no-op rather than an error. An anonymous caller cannot be
    /// attributed and reports as failed without further detail.
    pub async fn report_usage(&self, ctx: &RequestContext, seconds: i64) -> UsageReport {
        if seconds <= 0 {
            return UsageReport::ok();
        }

        let Some(user) = &ctx.user else {
            return UsageReport::failed();
        };

        let budget = match self.store.load_time_budget(&user.id).await {
            Ok(Some(budget)) => budget,
            Ok(None) => {
                error!("usage report for unknown profile {}", user.id);
                return UsageReport::failed();
            }
            Err(err) => {
                error!("failed to load time budget for {}: {err:#}", user.id);
                return UsageReport::failed();
            }
        };

        if !budget.is_time_limited {
            return UsageReport::ok();
        }

        let today = current_utc_day();
        match self
            .store
            .apply_usage(&user.id, &today, seconds as u64)
            .await
        {
            Ok(_) => UsageReport::ok(),
            Err(err) => {
                error!("failed to apply usage for {}: {err:#}", user.id);
                UsageReport::failed()
            }
        }
    }
}

/// ISO `YYYY-MM-DD` for the current UTC day. Day rollover follows the server
/// clock's UTC date, so users outside UTC reset at a non-midnight local time.
pub fn current_utc_day() -> String {
    Utc::now().date_naive().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use crate::{
        activity::{testing::RecordingStore, ActivityStore},
        auth::{RequestContext, User},
        db::{models::TimeBudget, Database},
    };

    use super::{current_utc_day, TimeBudgetTracker};

    fn user_ctx() -> RequestContext {
        RequestContext::for_user(User {
            id: "u1".to_string(),
            email: "u1@fizikhub.net".to_string(),
        })
    }

    fn limited_budget(used: u64, reset_date: &str) -> TimeBudget {
        TimeBudget {
            is_time_limited: true,
            daily_time_used_seconds: used,
            time_limit_reset_date: Some(reset_date.to_string()),
        }
    }

    #[tokio::test]
    async fn non_positive_deltas_never_touch_the_store() {
        let store = Arc::new(RecordingStore::default());
        let tracker = TimeBudgetTracker::new(Arc::clone(&store) as Arc<dyn ActivityStore>);

        assert!(tracker.report_usage(&user_ctx(), 0).await.success);
        assert!(tracker.report_usage(&user_ctx(), -5).await.success);
        assert_eq!(store.store_calls(), 0);
    }

    #[tokio::test]
    async fn anonymous_caller_reports_failure() {
        let store = Arc::new(RecordingStore::default());
        let tracker = TimeBudgetTracker::new(Arc::clone(&store) as Arc<dyn ActivityStore>);

        let report: crate::UsageReport = tracker
            .report_usage(&RequestContext::anonymous(), 100)
            .await;
        assert!(!report.success);
        assert_eq!(store.store_calls(), 0);
    }

    #[tokio::test]
    async fn unlimited_accounts_are_skipped() {
        let store = Arc::new(RecordingStore::with_budget(TimeBudget {
            is_time_limited: false,
            daily_time_used_seconds: 0,
            time_limit_reset_date: None,
        }));
        let tracker = TimeBudgetTracker::new(Arc::clone(&store) as Arc<dyn ActivityStore>);

        assert!(tracker.report_usage(&user_ctx(), 100).await.success);
        assert_eq!(store.apply_count(), 0);
    }

    #[tokio::test]
    async fn limited_account_accumulates_for_today() {
        let store = Arc::new(RecordingStore::with_budget(limited_budget(
            50,
            &current_utc_day(),
        )));
        let tracker = TimeBudgetTracker::new(Arc::clone(&store) as Arc<dyn ActivityStore>);

        assert!(tracker.report_usage(&user_ctx(), 30).await.success);

        let budget = store.budget.lock().unwrap().clone().unwrap();
        assert_eq!(budget.daily_time_used_seconds, 80);
    }

    #[tokio::test]
    async fn store_failure_maps_to_failed_report() {
        let store = Arc::new(RecordingStore {
            budget: std::sync::Mutex::new(Some(limited_budget(0, "2024-03-01"))),
            fail_apply: true,
            ..RecordingStore::default()
        });
        let tracker = TimeBudgetTracker::new(Arc::clone(&store) as Arc<dyn ActivityStore>);

        assert!(!tracker.report_usage(&user_ctx(), 30).await.success);
    }

    // Rollover semantics against the real SQL, not the mock.
    #[tokio::test]
    async fn stale_counter_resets_on_a_new_day() {
        let path = std::env::temp_dir().join(format!("hubtrack-test-{}.sqlite3", Uuid::new_v4()));
        let db = Database::new(path).unwrap();
        db.insert_profile("u1", "u1@fizikhub.net", Utc::now())
            .await
            .unwrap();
        db.set_time_limited("u1", true).await.unwrap();
        // 50 seconds accumulated under an old date.
        db.apply_usage("u1", "2024-03-01", 50).await.unwrap();

        let tracker = TimeBudgetTracker::new(Arc::new(db.clone()));
        assert!(tracker.report_usage(&user_ctx(), 30).await.success);

        let budget = db.load_time_budget("u1").await.unwrap().unwrap();
        assert_eq!(budget.daily_time_used_seconds, 30);
        assert_eq!(
            budget.time_limit_reset_date.as_deref(),
            Some(current_utc_day().as_str())
        );
    }
}
