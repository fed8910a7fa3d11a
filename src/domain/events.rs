//! Domain events published through the in-process dispatcher.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Something that happened in the domain
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    UserRegistered { user_id: Uuid, email: String },
    UserCreated { user_id: Uuid, created_by: Uuid },
    UserUpdated { user_id: Uuid, updated_by: Uuid, fields: Vec<String> },
    UserDeleted { user_id: Uuid, deleted_by: Uuid },
    PasswordChanged { user_id: Uuid, changed_by: Uuid },
    UserLoggedIn { user_id: Uuid, ip_address: Option<String> },
    LoginFailed { email: String, ip_address: Option<String>, reason: String },
    UserLoggedOut { user_id: Uuid },
}

impl DomainEvent {
    /// Dotted event name listeners subscribe to
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::UserRegistered { .. } => "user.registered",
            DomainEvent::UserCreated { .. } => "user.created",
            DomainEvent::UserUpdated { .. } => "user.updated",
            DomainEvent::UserDeleted { .. } => "user.deleted",
            DomainEvent::PasswordChanged { .. } => "user.password_changed",
            DomainEvent::UserLoggedIn { .. } => "security.login",
            DomainEvent::LoginFailed { .. } => "security.login_failed",
            DomainEvent::UserLoggedOut { .. } => "security.logout",
        }
    }

    /// Security events are counted separately by the metrics listener
    pub fn is_security_event(&self) -> bool {
        self.name().starts_with("security.")
    }
}

/// Event plus dispatch metadata
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: DomainEvent,
}

impl EventEnvelope {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event,
        }
    }
}
