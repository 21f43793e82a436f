use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub email: String,
    /// Presence mark; refreshed on every accepted activity event.
    pub last_seen_at: Option<DateTime<Utc>>,
    pub is_time_limited: bool,
    pub daily_time_used_seconds: u64,
    /// ISO `YYYY-MM-DD` (UTC). The usage counter is only meaningful while this
    /// matches the current day; a stale date means the counter is logically zero.
    pub time_limit_reset_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The slice of a profile the time-budget tracker reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBudget {
    pub is_time_limited: bool,
    pub daily_time_used_seconds: u64,
    pub time_limit_reset_date: Option<String>,
}
