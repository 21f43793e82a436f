//! Activity event data models.
//!
//! One row per accepted user action. Immutable once created: the service only
//! ever inserts and reads these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub id: String,
    pub user_id: String,
    /// Tag from an open-ended set, e.g. "PAGE_VIEW", "ARTICLE_LIKE".
    pub action: String,
    /// Resource the action touched: pathname plus optional `?query`.
    pub path: String,
    pub details: serde_json::Value,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

/// Event as handed to the store. Id and creation timestamp are assigned at
/// insert time.
#[derive(Debug, Clone)]
pub struct NewActivityEvent {
    pub user_id: String,
    pub action: String,
    pub path: String,
    pub details: serde_json::Value,
    pub ip_address: String,
    pub user_agent: String,
}
