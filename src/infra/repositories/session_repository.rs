//! Session persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::entities::session::{self, ActiveModel, Entity as SessionEntity};
use crate::domain::Session;
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find(&self, id: &str) -> AppResult<Option<Session>>;

    /// Insert or overwrite by session id
    async fn save(&self, session: Session) -> AppResult<()>;

    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Drop every session bound to a user; returns rows removed
    async fn delete_for_user(&self, user_id: Uuid) -> AppResult<u64>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

pub struct SessionStore {
    db: DatabaseConnection,
}

impl SessionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionRepository for SessionStore {
    async fn find(&self, id: &str) -> AppResult<Option<Session>> {
        let result = SessionEntity::find_by_id(id.to_owned()).one(&self.db).await?;
        Ok(result.map(Session::from))
    }

    async fn save(&self, session: Session) -> AppResult<()> {
        SessionEntity::insert(ActiveModel::from(&session))
            .on_conflict(
                OnConflict::column(session::Column::Id)
                    .update_columns([
                        session::Column::UserId,
                        session::Column::CsrfToken,
                        session::Column::IpAddress,
                        session::Column::UserAgent,
                        session::Column::LastActivity,
                        session::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        SessionEntity::delete_by_id(id.to_owned()).exec(&self.db).await?;
        Ok(())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = SessionEntity::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = SessionEntity::delete_many()
            .filter(session::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserRole};
    use crate::infra::repositories::{UserRepository, UserStore};
    use crate::infra::Database;
    use chrono::Duration;

    async fn setup() -> (tempfile::TempDir, SessionStore, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let db = Database::connect(&url).await.unwrap();
        (
            dir,
            SessionStore::new(db.get_connection()),
            UserStore::new(db.get_connection()),
        )
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let (_dir, store, users) = setup().await;
        let user = users
            .create(User::new("a@b.cz".into(), "h".into(), "Al".into(), UserRole::User))
            .await
            .unwrap();

        let mut session = Session::new("sid".into(), "csrf".into(), 60, None, None);
        store.save(session.clone()).await.unwrap();
        assert!(!store.find("sid").await.unwrap().unwrap().is_authenticated());

        session.user_id = Some(user.id);
        store.save(session).await.unwrap();
        assert_eq!(store.find("sid").await.unwrap().unwrap().user_id, Some(user.id));

        assert_eq!(store.delete_for_user(user.id).await.unwrap(), 1);
        assert!(store.find("sid").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let (_dir, store, _) = setup().await;
        store
            .save(Session::new("live".into(), "c".into(), 3600, None, None))
            .await
            .unwrap();
        store
            .save(Session::new("dead".into(), "c".into(), -10, None, None))
            .await
            .unwrap();

        assert_eq!(store.delete_expired(Utc::now() + Duration::seconds(1)).await.unwrap(), 1);
        assert!(store.find("live").await.unwrap().is_some());
        store.delete("live").await.unwrap();
        assert!(store.find("live").await.unwrap().is_none());
    }
}
