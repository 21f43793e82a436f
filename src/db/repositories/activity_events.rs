use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::parse_datetime,
    models::{ActivityEvent, NewActivityEvent},
};

fn row_to_event(row: &Row) -> Result<ActivityEvent> {
    let created_at: String = row.get("created_at")?;
    let details: String = row.get("details")?;

    Ok(ActivityEvent {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        action: row.get("action")?,
        path: row.get("path")?,
        details: serde_json::from_str(&details).context("failed to parse event details")?,
        ip_address: row.get("ip_address")?,
        user_agent: row.get("user_agent")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn insert_activity_event(&self, event: NewActivityEvent) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO activity_events (id, user_id, action, path, details, ip_address, user_agent, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    Uuid::new_v4().to_string(),
                    event.user_id,
                    event.action,
                    event.path,
                    serde_json::to_string(&event.details)?,
                    event.ip_address,
                    event.user_agent,
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("failed to insert activity event")?;
            Ok(())
        })
        .await
    }

    pub async fn list_recent_events_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ActivityEvent>> {
        let user_id = user_id.to_string();
        let limit = limit as i64;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, action, path, details, ip_address, user_agent, created_at
                 FROM activity_events
                 WHERE user_id = ?1
                 ORDER BY created_at DESC
                 LIMIT ?2",
            )?;

            let mut rows = stmt.query(params![user_id, limit])?;
            let mut events = Vec::new();
            while let Some(row) = rows.next()? {
                events.push(row_to_event(row)?);
            }

            Ok(events)
        })
        .await
    }
}
