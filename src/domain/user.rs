//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidateEmail;

use super::permission::Permission;
use crate::config::{
    ROLE_ADMIN, ROLE_EDITOR, ROLE_USER, STATUS_ACTIVE, STATUS_INACTIVE, STATUS_SUSPENDED,
};
use crate::errors::{AppError, AppResult};

/// User roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Editor,
    Admin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Whether the role grants a permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        permission.is_granted_to(*self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => ROLE_ADMIN,
            UserRole::Editor => ROLE_EDITOR,
            UserRole::User => ROLE_USER,
        }
    }

    /// Strict parse, used for untrusted input.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            ROLE_ADMIN => Ok(UserRole::Admin),
            ROLE_EDITOR => Ok(UserRole::Editor),
            ROLE_USER => Ok(UserRole::User),
            other => Err(AppError::field("role", format!("Unknown role '{}'", other))),
        }
    }
}

/// Lenient conversion for trusted storage values; unknown values fall back to `User`.
impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        Self::parse(s).unwrap_or(UserRole::User)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => STATUS_ACTIVE,
            UserStatus::Inactive => STATUS_INACTIVE,
            UserStatus::Suspended => STATUS_SUSPENDED,
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            STATUS_ACTIVE => Ok(UserStatus::Active),
            STATUS_INACTIVE => Ok(UserStatus::Inactive),
            STATUS_SUSPENDED => Ok(UserStatus::Suspended),
            other => Err(AppError::field("status", format!("Unknown status '{}'", other))),
        }
    }
}

impl From<&str> for UserStatus {
    fn from(s: &str) -> Self {
        Self::parse(s).unwrap_or(UserStatus::Inactive)
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub login_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user with the given role
    pub fn new(email: String, password_hash: String, name: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            name,
            role,
            status: UserStatus::Active,
            email_verified: false,
            last_login_at: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Only active accounts may authenticate
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    /// Record a successful login
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.login_count += 1;
        self.updated_at = now;
    }
}

/// Normalize an email for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email address, returning its normalized form.
pub fn validate_email(email: &str) -> AppResult<String> {
    let normalized = normalize_email(email);
    if !normalized.validate_email() {
        return Err(AppError::field("email", "Invalid email format"));
    }
    Ok(normalized)
}

/// Validate a display name, returning the trimmed value.
pub fn validate_name(name: &str) -> AppResult<String> {
    use crate::config::{MAX_NAME_LENGTH, MIN_NAME_LENGTH};

    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len < MIN_NAME_LENGTH || len > MAX_NAME_LENGTH {
        return Err(AppError::field(
            "name",
            format!(
                "Name must be between {} and {} characters",
                MIN_NAME_LENGTH, MAX_NAME_LENGTH
            ),
        ));
    }
    Ok(trimmed.to_string())
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    /// User email address
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User display name
    #[schema(example = "Jane Doe")]
    pub name: String,
    /// User role
    #[schema(example = "user")]
    pub role: String,
    /// Account status
    #[schema(example = "active")]
    pub status: String,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub login_count: i64,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role.to_string(),
            status: user.status.to_string(),
            email_verified: user.email_verified,
            last_login_at: user.last_login_at,
            login_count: user.login_count,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
