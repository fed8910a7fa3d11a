//! Web session entity.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::Session;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: Option<Uuid>,
    pub csrf_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTimeUtc,
    pub last_activity: DateTimeUtc,
    pub expires_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Session {
    fn from(model: Model) -> Self {
        Session {
            id: model.id,
            user_id: model.user_id,
            csrf_token: model.csrf_token,
            ip_address: model.ip_address,
            user_agent: model.user_agent,
            created_at: model.created_at,
            last_activity: model.last_activity,
            expires_at: model.expires_at,
        }
    }
}

impl From<&Session> for ActiveModel {
    fn from(session: &Session) -> Self {
        ActiveModel {
            id: Set(session.id.clone()),
            user_id: Set(session.user_id),
            csrf_token: Set(session.csrf_token.clone()),
            ip_address: Set(session.ip_address.clone()),
            user_agent: Set(session.user_agent.clone()),
            created_at: Set(session.created_at),
            last_activity: Set(session.last_activity),
            expires_at: Set(session.expires_at),
        }
    }
}
