//! Web session entity.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Server-side session carried by the session cookie.
///
/// A session without `user_id` is a guest session; it exists to hold the
/// CSRF token of an anonymous visitor.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub user_id: Option<Uuid>,
    pub csrf_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        id: String,
        csrf_token: String,
        lifetime_seconds: i64,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: None,
            csrf_token,
            ip_address,
            user_agent,
            created_at: now,
            last_activity: now,
            expires_at: now + Duration::seconds(lifetime_seconds),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Slide the expiry window forward
    pub fn touch(&mut self, lifetime_seconds: i64) {
        let now = Utc::now();
        self.last_activity = now;
        self.expires_at = now + Duration::seconds(lifetime_seconds);
    }
}
