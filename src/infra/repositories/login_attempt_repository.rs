//! Login attempt log backing the login throttle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::login_attempt::{self, ActiveModel, Entity as LoginAttemptEntity};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait LoginAttemptRepository: Send + Sync {
    /// Append one attempt
    async fn record(
        &self,
        email: String,
        ip_address: Option<String>,
        success: bool,
        attempted_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Timestamps of failed attempts for an email since `since`, oldest first
    async fn failures_for_email(&self, email: &str, since: DateTime<Utc>) -> AppResult<Vec<DateTime<Utc>>>;

    /// Timestamps of failed attempts from an IP since `since`, oldest first
    async fn failures_for_ip(&self, ip_address: &str, since: DateTime<Utc>) -> AppResult<Vec<DateTime<Utc>>>;

    /// Forget failed attempts for an email; returns rows removed
    async fn clear_failures(&self, email: &str) -> AppResult<u64>;

    /// Prune attempts older than the cutoff; returns rows removed
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

pub struct LoginAttemptStore {
    db: DatabaseConnection,
}

impl LoginAttemptStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn failure_times(
        &self,
        column: login_attempt::Column,
        value: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<DateTime<Utc>>> {
        let times: Vec<DateTime<Utc>> = LoginAttemptEntity::find()
            .select_only()
            .column(login_attempt::Column::AttemptedAt)
            .filter(column.eq(value))
            .filter(login_attempt::Column::Success.eq(false))
            .filter(login_attempt::Column::AttemptedAt.gte(since))
            .order_by_asc(login_attempt::Column::AttemptedAt)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(times)
    }
}

#[async_trait]
impl LoginAttemptRepository for LoginAttemptStore {
    async fn record(
        &self,
        email: String,
        ip_address: Option<String>,
        success: bool,
        attempted_at: DateTime<Utc>,
    ) -> AppResult<()> {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            ip_address: Set(ip_address),
            success: Set(success),
            attempted_at: Set(attempted_at),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    async fn failures_for_email(&self, email: &str, since: DateTime<Utc>) -> AppResult<Vec<DateTime<Utc>>> {
        self.failure_times(login_attempt::Column::Email, email, since).await
    }

    async fn failures_for_ip(&self, ip_address: &str, since: DateTime<Utc>) -> AppResult<Vec<DateTime<Utc>>> {
        self.failure_times(login_attempt::Column::IpAddress, ip_address, since)
            .await
    }

    async fn clear_failures(&self, email: &str) -> AppResult<u64> {
        let result = LoginAttemptEntity::delete_many()
            .filter(login_attempt::Column::Email.eq(email))
            .filter(login_attempt::Column::Success.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = LoginAttemptEntity::delete_many()
            .filter(login_attempt::Column::AttemptedAt.lt(cutoff))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
