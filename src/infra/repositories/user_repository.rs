//! User repository implementation.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::User;
use crate::errors::{AppError, AppResult};
use crate::types::{PaginationParams, UserFilter};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by normalized email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn exists_by_email(&self, email: &str) -> AppResult<bool>;

    /// Insert a new user; a taken email is a conflict
    async fn create(&self, user: User) -> AppResult<User>;

    /// Persist every field of an existing user
    async fn update(&self, user: User) -> AppResult<User>;

    /// Permanently delete user
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Filtered page of users, newest first, with the total match count
    async fn list(&self, filter: UserFilter, page: PaginationParams) -> AppResult<(Vec<User>, u64)>;

    async fn count(&self) -> AppResult<u64>;

    /// Number of users per role
    async fn count_by_role(&self) -> AppResult<Vec<(String, u64)>>;

    /// Number of users per status
    async fn count_by_status(&self) -> AppResult<Vec<(String, u64)>>;
}

/// SeaORM-backed implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn count_grouped_by(&self, column: user::Column) -> AppResult<Vec<(String, u64)>> {
        let rows: Vec<(String, i64)> = UserEntity::find()
            .select_only()
            .column(column)
            .column_as(Expr::col(user::Column::Id).count(), "count")
            .group_by(column)
            .order_by_asc(column)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(key, count)| (key, count.max(0) as u64))
            .collect())
    }
}

fn filter_condition(filter: &UserFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(role) = filter.role.as_deref().filter(|r| !r.is_empty()) {
        condition = condition.add(user::Column::Role.eq(role));
    }
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(user::Column::Status.eq(status));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(user::Column::Email.contains(search))
                .add(user::Column::Name.contains(search)),
        );
    }
    condition
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        let count = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let model = ActiveModel::from(&user)
            .insert(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AppError::conflict("Email is already registered")
                }
                _ => AppError::from(e),
            })?;

        Ok(User::from(model))
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let model = ActiveModel::from(&user)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => AppError::not_found("User"),
                other => AppError::from(other),
            })?;

        Ok(User::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = UserEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("User"));
        }

        Ok(())
    }

    async fn list(&self, filter: UserFilter, page: PaginationParams) -> AppResult<(Vec<User>, u64)> {
        let paginator = UserEntity::find()
            .filter(filter_condition(&filter))
            .order_by_desc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Email)
            .paginate(&self.db, page.limit());

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.page() - 1).await?;

        Ok((models.into_iter().map(User::from).collect(), total))
    }

    async fn count(&self) -> AppResult<u64> {
        UserEntity::find()
            .count(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn count_by_role(&self) -> AppResult<Vec<(String, u64)>> {
        self.count_grouped_by(user::Column::Role).await
    }

    async fn count_by_status(&self) -> AppResult<Vec<(String, u64)>> {
        self.count_grouped_by(user::Column::Status).await
    }
}
