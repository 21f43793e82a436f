use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_optional_datetime, to_i64, to_u64},
    models::{Profile, TimeBudget},
};

fn row_to_profile(row: &Row) -> Result<Profile> {
    let last_seen_at: Option<String> = row.get("last_seen_at")?;
    let created_at: String = row.get("created_at")?;
    let daily_time_used_seconds: i64 = row.get("daily_time_used_seconds")?;

    Ok(Profile {
        user_id: row.get("user_id")?,
        email: row.get("email")?,
        last_seen_at: parse_optional_datetime(last_seen_at, "last_seen_at")?,
        is_time_limited: row.get("is_time_limited")?,
        daily_time_used_seconds: to_u64(daily_time_used_seconds, "daily_time_used_seconds")?,
        time_limit_reset_date: row.get("time_limit_reset_date")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn insert_profile(
        &self,
        user_id: &str,
        email: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let user_id = user_id.to_string();
        let email = email.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO profiles (user_id, email, created_at)
                 VALUES (?1, ?2, ?3)",
                params![user_id, email, created_at.to_rfc3339()],
            )
            .context("failed to insert profile")?;
            Ok(())
        })
        .await
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, email, last_seen_at, is_time_limited,
                        daily_time_used_seconds, time_limit_reset_date, created_at
                 FROM profiles
                 WHERE user_id = ?1",
            )?;

            let mut rows = stmt.query(params![user_id])?;
            let profile = match rows.next()? {
                Some(row) => Some(row_to_profile(row)?),
                None => None,
            };
            Ok(profile)
        })
        .await
    }

    pub async fn touch_last_seen(&self, user_id: &str, seen_at: DateTime<Utc>) -> Result<()> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE profiles
                 SET last_seen_at = ?1
                 WHERE user_id = ?2",
                params![seen_at.to_rfc3339(), user_id],
            )
            .context("failed to update last-seen mark")?;
            Ok(())
        })
        .await
    }

    pub async fn load_time_budget(&self, user_id: &str) -> Result<Option<TimeBudget>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let budget = conn
                .query_row(
                    "SELECT is_time_limited, daily_time_used_seconds, time_limit_reset_date
                     FROM profiles
                     WHERE user_id = ?1",
                    params![user_id],
                    |row| {
                        Ok((
                            row.get::<_, bool>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, Option<String>>(2)?,
                        ))
                    },
                )
                .optional()
                .context("failed to load time budget")?;

            match budget {
                Some((is_time_limited, used, reset_date)) => Ok(Some(TimeBudget {
                    is_time_limited,
                    daily_time_used_seconds: to_u64(used, "daily_time_used_seconds")?,
                    time_limit_reset_date: reset_date,
                })),
                None => Ok(None),
            }
        })
        .await
    }

    /// Rollover and increment in one statement. A reset date that no longer
    /// matches `day` means the stored counter belongs to an earlier day and the
    /// increment starts from zero. Returns the new accumulated total.
    pub async fn apply_usage(&self, user_id: &str, day: &str, seconds: u64) -> Result<u64> {
        let user_id = user_id.to_string();
        let day = day.to_string();
        self.execute(move |conn| {
            let total: i64 = conn
                .query_row(
                    "UPDATE profiles
                     SET daily_time_used_seconds = CASE
                             WHEN time_limit_reset_date = ?1 THEN daily_time_used_seconds + ?2
                             ELSE ?2
                         END,
                         time_limit_reset_date = ?1
                     WHERE user_id = ?3
                     RETURNING daily_time_used_seconds",
                    params![day, to_i64(seconds)?, user_id],
                    |row| row.get(0),
                )
                .optional()
                .context("failed to apply usage")?
                .with_context(|| format!("no profile for user {user_id}"))?;

            to_u64(total, "daily_time_used_seconds")
        })
        .await
    }

    pub async fn set_time_limited(&self, user_id: &str, limited: bool) -> Result<()> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE profiles
                 SET is_time_limited = ?1
                 WHERE user_id = ?2",
                params![limited, user_id],
            )
            .context("failed to update time-limit flag")?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::db::Database;

    fn test_db() -> Database {
        let path = std::env::temp_dir().join(format!("hubtrack-test-{}.sqlite3", Uuid::new_v4()));
        Database::new(path).expect("test database should open")
    }

    #[tokio::test]
    async fn touch_last_seen_updates_presence() {
        let db = test_db();
        db.insert_profile("u1", "u1@fizikhub.net", Utc::now())
            .await
            .unwrap();

        let profile = db.get_profile("u1").await.unwrap().unwrap();
        assert!(profile.last_seen_at.is_none());

        let seen_at = Utc::now();
        db.touch_last_seen("u1", seen_at).await.unwrap();

        let profile = db.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.last_seen_at.unwrap(), seen_at);
    }

    #[tokio::test]
    async fn apply_usage_accumulates_within_same_day() {
        let db = test_db();
        db.insert_profile("u1", "u1@fizikhub.net", Utc::now())
            .await
            .unwrap();
        db.set_time_limited("u1", true).await.unwrap();

        let today = Utc::now().date_naive().to_string();
        assert_eq!(db.apply_usage("u1", &today, 50).await.unwrap(), 50);
        assert_eq!(db.apply_usage("u1", &today, 30).await.unwrap(), 80);

        let budget = db.load_time_budget("u1").await.unwrap().unwrap();
        assert_eq!(budget.daily_time_used_seconds, 80);
        assert_eq!(budget.time_limit_reset_date.as_deref(), Some(today.as_str()));
    }

    #[tokio::test]
    async fn apply_usage_resets_on_day_rollover() {
        let db = test_db();
        db.insert_profile("u1", "u1@fizikhub.net", Utc::now())
            .await
            .unwrap();

        // Counter accumulated under yesterday's date is stale and must not
        // carry into the new day.
        assert_eq!(db.apply_usage("u1", "2024-03-01", 50).await.unwrap(), 50);
        assert_eq!(db.apply_usage("u1", "2024-03-02", 30).await.unwrap(), 30);

        let budget = db.load_time_budget("u1").await.unwrap().unwrap();
        assert_eq!(budget.daily_time_used_seconds, 30);
        assert_eq!(budget.time_limit_reset_date.as_deref(), Some("2024-03-02"));
    }

    #[tokio::test]
    async fn apply_usage_without_profile_is_an_error() {
        let db = test_db();
        let result = db.apply_usage("ghost", "2024-03-01", 10).await;
        assert!(result.is_err());
    }
}
