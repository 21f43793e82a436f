use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::{
    models::{NewActivityEvent, TimeBudget},
    Database,
};

/// The persistent-store seam the trackers write through. `Database` is the
/// production implementation; tests substitute a recording store.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn insert_activity_event(&self, event: NewActivityEvent) -> Result<()>;
    async fn touch_last_seen(&self, user_id: &str, seen_at: DateTime<Utc>) -> Result<()>;
    async fn load_time_budget(&self, user_id: &str) -> Result<Option<TimeBudget>>;
    /// Applies `seconds` of usage for the given UTC day, rolling the counter
    /// over if the stored reset date is stale. Returns the new total.
    async fn apply_usage(&self, user_id: &str, day: &str, seconds: u64) -> Result<u64>;
}

#[async_trait]
impl ActivityStore for Database {
    async fn insert_activity_event(&self, event: NewActivityEvent) -> Result<()> {
        Database::insert_activity_event(self, event).await
    }

    async fn touch_last_seen(&self, user_id: &str, seen_at: DateTime<Utc>) -> Result<()> {
        Database::touch_last_seen(self, user_id, seen_at).await
    }

    async fn load_time_budget(&self, user_id: &str) -> Result<Option<TimeBudget>> {
        Database::load_time_budget(self, user_id).await
    }

    async fn apply_usage(&self, user_id: &str, day: &str, seconds: u64) -> Result<u64> {
        Database::apply_usage(self, user_id, day, seconds).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use crate::db::models::{NewActivityEvent, TimeBudget};

    use super::ActivityStore;

    /// Records every call so tests can assert exactly which writes happened,
    /// with per-operation failure injection.
    #[derive(Default)]
    pub struct RecordingStore {
        pub events: Mutex<Vec<NewActivityEvent>>,
        pub touches: Mutex<Vec<(String, DateTime<Utc>)>>,
        pub applied: Mutex<Vec<(String, String, u64)>>,
        pub budget: Mutex<Option<TimeBudget>>,
        pub budget_loads: Mutex<usize>,
        pub fail_insert: bool,
        pub fail_touch: bool,
        pub fail_apply: bool,
    }

    impl RecordingStore {
        pub fn with_budget(budget: TimeBudget) -> Self {
            Self {
                budget: Mutex::new(Some(budget)),
                ..Self::default()
            }
        }

        pub fn event_count(&self) -> usize {
            self.events.lock().unwrap().len()
        }

        pub fn touch_count(&self) -> usize {
            self.touches.lock().unwrap().len()
        }

        pub fn apply_count(&self) -> usize {
            self.applied.lock().unwrap().len()
        }

        pub fn store_calls(&self) -> usize {
            self.event_count()
                + self.touch_count()
                + self.apply_count()
                + *self.budget_loads.lock().unwrap()
        }
    }

    #[async_trait]
    impl ActivityStore for RecordingStore {
        async fn insert_activity_event(&self, event: NewActivityEvent) -> Result<()> {
            if self.fail_insert {
                return Err(anyhow!("injected insert failure"));
            }
            self.events.lock().unwrap().push(event);
            Ok(())
        }

        async fn touch_last_seen(&self, user_id: &str, seen_at: DateTime<Utc>) -> Result<()> {
            if self.fail_touch {
                return Err(anyhow!("injected touch failure"));
            }
            self.touches
                .lock()
                .unwrap()
                .push((user_id.to_string(), seen_at));
            Ok(())
        }

        async fn load_time_budget(&self, _user_id: &str) -> Result<Option<TimeBudget>> {
            *self.budget_loads.lock().unwrap() += 1;
            Ok(self.budget.lock().unwrap().clone())
        }

        async fn apply_usage(&self, user_id: &str, day: &str, seconds: u64) -> Result<u64> {
            if self.fail_apply {
                return Err(anyhow!("injected apply failure"));
            }
            self.applied
                .lock()
                .unwrap()
                .push((user_id.to_string(), day.to_string(), seconds));

            let mut budget = self.budget.lock().unwrap();
            let budget = budget.as_mut().ok_or_else(|| anyhow!("no profile"))?;
            if budget.time_limit_reset_date.as_deref() == Some(day) {
                budget.daily_time_used_seconds += seconds;
            } else {
                budget.daily_time_used_seconds = seconds;
                budget.time_limit_reset_date = Some(day.to_string());
            }
            Ok(budget.daily_time_used_seconds)
        }
    }
}
