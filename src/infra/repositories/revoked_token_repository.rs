//! Denylist of revoked JWT ids.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use super::entities::revoked_token::{self, ActiveModel, Entity as RevokedTokenEntity};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RevokedTokenRepository: Send + Sync {
    /// Revoke a token id; revoking twice is a no-op
    async fn revoke(&self, jti: String, user_id: Uuid, expires_at: DateTime<Utc>) -> AppResult<()>;

    async fn is_revoked(&self, jti: &str) -> AppResult<bool>;

    /// Drop entries whose token has expired anyway
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

pub struct RevokedTokenStore {
    db: DatabaseConnection,
}

impl RevokedTokenStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RevokedTokenRepository for RevokedTokenStore {
    async fn revoke(&self, jti: String, user_id: Uuid, expires_at: DateTime<Utc>) -> AppResult<()> {
        let model = ActiveModel {
            jti: Set(jti),
            user_id: Set(user_id),
            expires_at: Set(expires_at),
            revoked_at: Set(Utc::now()),
        };
        RevokedTokenEntity::insert(model)
            .on_conflict(
                OnConflict::column(revoked_token::Column::Jti)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> AppResult<bool> {
        let count = RevokedTokenEntity::find()
            .filter(revoked_token::Column::Jti.eq(jti))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = RevokedTokenEntity::delete_many()
            .filter(revoked_token::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Database;
    use chrono::Duration;

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let db = Database::connect(&url).await.unwrap();
        let store = RevokedTokenStore::new(db.get_connection());
        let exp = Utc::now() + Duration::hours(1);

        assert!(!store.is_revoked("jti-1").await.unwrap());
        store.revoke("jti-1".into(), Uuid::new_v4(), exp).await.unwrap();
        store.revoke("jti-1".into(), Uuid::new_v4(), exp).await.unwrap();
        assert!(store.is_revoked("jti-1").await.unwrap());

        store
            .revoke("old".into(), Uuid::new_v4(), Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(store.delete_expired(Utc::now()).await.unwrap(), 1);
        assert!(store.is_revoked("jti-1").await.unwrap());
    }
}
