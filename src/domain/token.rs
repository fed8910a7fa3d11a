//! JWT claims and the issued-token value object.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserRole;

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    /// Unique token id, the handle used for revocation
    pub jti: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }
}

/// A signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct JwtToken {
    token: String,
    claims: Claims,
}

impl JwtToken {
    pub fn new(token: String, claims: Claims) -> Self {
        Self { token, claims }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn into_string(self) -> String {
        self.token
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.claims.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.claims.exp
    }

    /// Seconds until expiry, zero once expired
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.claims.exp - now.timestamp()).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token_expiring_at(exp: DateTime<Utc>) -> JwtToken {
        JwtToken::new(
            "header.payload.signature".into(),
            Claims {
                sub: Uuid::new_v4(),
                email: "a@b.cz".into(),
                role: "editor".into(),
                jti: "id".into(),
                iss: "hdm-boot".into(),
                iat: Utc::now().timestamp(),
                exp: exp.timestamp(),
            },
        )
    }

    #[test]
    fn test_expiry_queries() {
        let now = Utc::now();
        let token = token_expiring_at(now + Duration::seconds(90));

        assert!(!token.is_expired(now));
        assert!(token.is_expired(now + Duration::seconds(90)));
        assert_eq!(token.remaining_seconds(now), 90);
        assert_eq!(token.remaining_seconds(now + Duration::hours(1)), 0);
        assert_eq!(token.expires_at().timestamp(), (now + Duration::seconds(90)).timestamp());
    }

    #[test]
    fn test_claims_role() {
        let token = token_expiring_at(Utc::now());
        assert_eq!(token.claims().role(), UserRole::Editor);
    }
}
