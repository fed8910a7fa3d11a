//! User service - Handles user-related business logic.
//!
//! Every operation takes the acting user and enforces RBAC before touching
//! storage. Users may always read and rename themselves and change their own
//! password.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::authorization::{authorize, authorize_self_or};
use super::events::EventDispatcher;
use crate::config::{VALID_ROLES, VALID_STATUSES};
use crate::domain::user::{validate_email, validate_name};
use crate::domain::{DomainEvent, Password, Permission, User, UserRole, UserStatus};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams, UserFilter};

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: UserRole,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

/// User counts by role and status
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserStatistics {
    pub total: u64,
    pub by_role: BTreeMap<String, u64>,
    pub by_status: BTreeMap<String, u64>,
}

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Load by id without permission checks (authentication path)
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// Self, or `user.view`
    async fn view_user(&self, actor: &User, id: Uuid) -> AppResult<User>;

    /// `user.view`
    async fn list_users(&self, actor: &User, filter: UserFilter, page: PaginationParams) -> AppResult<Paginated<User>>;

    /// `user.create`; `actor` is `None` for console provisioning
    async fn create_user(&self, actor: Option<&User>, input: NewUser) -> AppResult<User>;

    /// Self (name only) or `user.edit`; role and status need `user.manage_roles`
    async fn update_user(&self, actor: &User, id: Uuid, changes: UserChanges) -> AppResult<User>;

    /// `user.delete`, never self
    async fn delete_user(&self, actor: &User, id: Uuid) -> AppResult<()>;

    /// Self with the current password, or `user.edit` without it
    async fn change_password(
        &self,
        actor: &User,
        id: Uuid,
        current_password: Option<String>,
        new_password: String,
    ) -> AppResult<()>;

    /// `user.view`
    async fn statistics(&self, actor: &User) -> AppResult<UserStatistics>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    events: Arc<EventDispatcher>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>, events: Arc<EventDispatcher>) -> Self {
        Self { uow, events }
    }

    async fn find(&self, id: Uuid) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_not_found("User")
    }
}

fn validate_filter(filter: &UserFilter) -> AppResult<()> {
    if let Some(role) = filter.role.as_deref().filter(|r| !r.is_empty()) {
        if !VALID_ROLES.contains(&role) {
            return Err(AppError::field("role", format!("Unknown role '{}'", role)));
        }
    }
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        if !VALID_STATUSES.contains(&status) {
            return Err(AppError::field("status", format!("Unknown status '{}'", status)));
        }
    }
    Ok(())
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.find(id).await
    }

    async fn view_user(&self, actor: &User, id: Uuid) -> AppResult<User> {
        authorize_self_or(actor, id, Permission::UserView)?;
        self.find(id).await
    }

    async fn list_users(&self, actor: &User, filter: UserFilter, page: PaginationParams) -> AppResult<Paginated<User>> {
        authorize(actor, Permission::UserView)?;
        validate_filter(&filter)?;

        let (users, total) = self.uow.users().list(filter, page.clone()).await?;
        Ok(Paginated::new(users, &page, total))
    }

    async fn create_user(&self, actor: Option<&User>, input: NewUser) -> AppResult<User> {
        if let Some(actor) = actor {
            authorize(actor, Permission::UserCreate)?;
            if input.role != UserRole::User {
                authorize(actor, Permission::UserManageRoles)?;
            }
        }

        let email = validate_email(&input.email)?;
        let name = validate_name(&input.name)?;
        let password_hash = Password::new(&input.password)?.into_string();

        if self.uow.users().exists_by_email(&email).await? {
            return Err(AppError::conflict("Email is already registered"));
        }

        let user = self
            .uow
            .users()
            .create(User::new(email, password_hash, name, input.role))
            .await?;

        let created_by = actor.map(|a| a.id).unwrap_or(user.id);
        tracing::info!(user_id = %user.id, created_by = %created_by, role = %user.role, "User created");
        self.events
            .dispatch(DomainEvent::UserCreated {
                user_id: user.id,
                created_by,
            })
            .await;

        Ok(user)
    }

    async fn update_user(&self, actor: &User, id: Uuid, changes: UserChanges) -> AppResult<User> {
        let is_self = actor.id == id;
        if !is_self {
            authorize(actor, Permission::UserEdit)?;
        }

        let mut user = self.find(id).await?;
        let mut fields = Vec::new();

        let role_change = changes.role.filter(|r| *r != user.role);
        let status_change = changes.status.filter(|s| *s != user.status);

        if role_change.is_some() || status_change.is_some() {
            authorize(actor, Permission::UserManageRoles)?;
            if is_self {
                return Err(AppError::conflict(
                    "You cannot change your own role or status",
                ));
            }
        }

        if let Some(name) = changes.name {
            let name = validate_name(&name)?;
            if name != user.name {
                user.name = name;
                fields.push("name".to_string());
            }
        }
        if let Some(role) = role_change {
            user.role = role;
            fields.push("role".to_string());
        }
        if let Some(status) = status_change {
            user.status = status;
            fields.push("status".to_string());
        }

        if fields.is_empty() {
            return Ok(user);
        }

        user.updated_at = Utc::now();
        let user = self.uow.users().update(user).await?;

        if status_change.is_some() && !user.is_active() {
            let ended = self.uow.sessions().delete_for_user(user.id).await?;
            tracing::info!(user_id = %user.id, sessions = ended, "Sessions ended for deactivated user");
        }

        tracing::info!(user_id = %user.id, updated_by = %actor.id, fields = ?fields, "User updated");
        self.events
            .dispatch(DomainEvent::UserUpdated {
                user_id: user.id,
                updated_by: actor.id,
                fields,
            })
            .await;

        Ok(user)
    }

    async fn delete_user(&self, actor: &User, id: Uuid) -> AppResult<()> {
        authorize(actor, Permission::UserDelete)?;
        if actor.id == id {
            return Err(AppError::conflict("You cannot delete your own account"));
        }

        let user = self.find(id).await?;
        self.uow.sessions().delete_for_user(user.id).await?;
        self.uow.users().delete(user.id).await?;

        tracing::info!(user_id = %user.id, deleted_by = %actor.id, "User deleted");
        self.events
            .dispatch(DomainEvent::UserDeleted {
                user_id: user.id,
                deleted_by: actor.id,
            })
            .await;

        Ok(())
    }

    async fn change_password(
        &self,
        actor: &User,
        id: Uuid,
        current_password: Option<String>,
        new_password: String,
    ) -> AppResult<()> {
        let is_self = actor.id == id;
        if !is_self {
            authorize(actor, Permission::UserEdit)?;
        }

        let mut user = self.find(id).await?;

        if is_self {
            let current = current_password.unwrap_or_default();
            if !Password::from_hash(user.password_hash.clone()).verify(&current) {
                return Err(AppError::field(
                    "current_password",
                    "Current password is incorrect",
                ));
            }
        }

        user.password_hash = Password::new(&new_password)?.into_string();
        user.updated_at = Utc::now();
        self.uow.users().update(user).await?;

        tracing::info!(user_id = %id, changed_by = %actor.id, "Password changed");
        self.events
            .dispatch(DomainEvent::PasswordChanged {
                user_id: id,
                changed_by: actor.id,
            })
            .await;

        Ok(())
    }

    async fn statistics(&self, actor: &User) -> AppResult<UserStatistics> {
        authorize(actor, Permission::UserView)?;

        let users = self.uow.users();
        let (total, roles, statuses) = futures::try_join!(
            users.count(),
            users.count_by_role(),
            users.count_by_status()
        )?;

        let mut by_role: BTreeMap<String, u64> =
            VALID_ROLES.iter().map(|r| (r.to_string(), 0)).collect();
        by_role.extend(roles);
        let mut by_status: BTreeMap<String, u64> =
            VALID_STATUSES.iter().map(|s| (s.to_string(), 0)).collect();
        by_status.extend(statuses);

        Ok(UserStatistics {
            total,
            by_role,
            by_status,
        })
    }
}
