//! Caller identity resolution.
//!
//! Sessions are issued elsewhere in the platform; this service only resolves a
//! bearer token to the user it belongs to. An unauthenticated caller is a
//! recognized state, not an error.

use log::error;
use serde::{Deserialize, Serialize};

use crate::db::Database;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
}

/// Per-request caller context assembled by the HTTP layer.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: Option<User>,
    pub ip_address: String,
    pub user_agent: String,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self {
            user: None,
            ip_address: "unknown".to_string(),
            user_agent: "unknown".to_string(),
        }
    }

    pub fn for_user(user: User) -> Self {
        Self {
            user: Some(user),
            ..Self::anonymous()
        }
    }
}

#[derive(Clone)]
pub struct AuthProvider {
    db: Database,
}

impl AuthProvider {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Resolves the current caller. Store failures during lookup degrade to
    /// anonymous rather than surfacing to the request path.
    pub async fn current_user(&self, token: Option<&str>) -> Option<User> {
        let token = token?;
        match self.db.get_user_for_token(token).await {
            Ok(user) => user,
            Err(err) => {
                error!("session lookup failed: {err:#}");
                None
            }
        }
    }
}
