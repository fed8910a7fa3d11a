//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{User, UserRole, UserStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub status: String,
    pub email_verified: bool,
    pub last_login_at: Option<DateTimeUtc>,
    pub login_count: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            email: model.email,
            password_hash: model.password_hash,
            name: model.name,
            role: UserRole::from(model.role.as_str()),
            status: UserStatus::from(model.status.as_str()),
            email_verified: model.email_verified,
            last_login_at: model.last_login_at,
            login_count: model.login_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Every column set, for inserts and full-row updates
impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            name: Set(user.name.clone()),
            role: Set(user.role.as_str().to_string()),
            status: Set(user.status.as_str().to_string()),
            email_verified: Set(user.email_verified),
            last_login_at: Set(user.last_login_at),
            login_count: Set(user.login_count),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
    }
}
