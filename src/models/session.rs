use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::User;

/// Fixed session lifetime. There is no refresh or renewal; after this the
/// user logs in again.
pub const SESSION_TTL_HOURS: i64 = 24;

/// The persisted pairing of user identity and bearer token with an expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(user: User, token: String, now: DateTime<Utc>) -> Self {
        Self {
            user,
            token,
            expires_at: now + Duration::hours(SESSION_TTL_HOURS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}
