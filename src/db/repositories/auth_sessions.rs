use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::auth::User;
use crate::db::connection::Database;

impl Database {
    /// Session rows are normally provisioned by the platform's login flow; this
    /// helper exists for tooling and tests.
    pub async fn insert_auth_session(
        &self,
        token: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let token = token.to_string();
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO auth_sessions (token, user_id, expires_at, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    token,
                    user_id,
                    expires_at.to_rfc3339(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("failed to insert auth session")?;
            Ok(())
        })
        .await
    }

    pub async fn get_user_for_token(&self, token: &str) -> Result<Option<User>> {
        let token = token.to_string();
        self.execute(move |conn| {
            let user = conn
                .query_row(
                    "SELECT p.user_id, p.email
                     FROM auth_sessions s
                     JOIN profiles p ON p.user_id = s.user_id
                     WHERE s.token = ?1 AND s.expires_at > ?2",
                    params![token, Utc::now().to_rfc3339()],
                    |row| {
                        Ok(User {
                            id: row.get(0)?,
                            email: row.get(1)?,
                        })
                    },
                )
                .optional()
                .context("failed to resolve session token")?;

            Ok(user)
        })
        .await
    }

    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        self.execute(move |conn| {
            let removed = conn
                .execute(
                    "DELETE FROM auth_sessions WHERE expires_at <= ?1",
                    params![now.to_rfc3339()],
                )
                .context("failed to delete expired sessions")?;
            Ok(removed)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::db::Database;

    fn test_db() -> Database {
        let path = std::env::temp_dir().join(format!("hubtrack-test-{}.sqlite3", Uuid::new_v4()));
        Database::new(path).expect("test database should open")
    }

    #[tokio::test]
    async fn valid_token_resolves_to_user() {
        let db = test_db();
        db.insert_profile("u1", "u1@fizikhub.net", Utc::now())
            .await
            .unwrap();
        db.insert_auth_session("tok-1", "u1", Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        let user = db.get_user_for_token("tok-1").await.unwrap().unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.email, "u1@fizikhub.net");
    }

    #[tokio::test]
    async fn expired_or_unknown_tokens_resolve_to_none() {
        let db = test_db();
        db.insert_profile("u1", "u1@fizikhub.net", Utc::now())
            .await
            .unwrap();
        db.insert_auth_session("tok-old", "u1", Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        assert!(db.get_user_for_token("tok-old").await.unwrap().is_none());
        assert!(db.get_user_for_token("tok-missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_expired_sessions_keeps_live_ones() {
        let db = test_db();
        db.insert_profile("u1", "u1@fizikhub.net", Utc::now())
            .await
            .unwrap();
        db.insert_auth_session("tok-old", "u1", Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        db.insert_auth_session("tok-live", "u1", Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        let removed = db.delete_expired_sessions(Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert!(db.get_user_for_token("tok-live").await.unwrap().is_some());
    }
}
