//! Permission checks shared by services and handlers.

use uuid::Uuid;

use crate::domain::{Permission, User};
use crate::errors::{AppError, AppResult};

/// Require a permission granted by the actor's role
pub fn authorize(actor: &User, permission: Permission) -> AppResult<()> {
    if actor.can(permission) {
        Ok(())
    } else {
        tracing::debug!(user_id = %actor.id, permission = permission.as_str(), "Permission denied");
        Err(AppError::forbidden(format!(
            "Missing permission '{}'",
            permission.as_str()
        )))
    }
}

/// Allow the actor on their own record, otherwise require the permission
pub fn authorize_self_or(actor: &User, target: Uuid, permission: Permission) -> AppResult<()> {
    if actor.id == target {
        Ok(())
    } else {
        authorize(actor, permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;

    fn user(role: UserRole) -> User {
        User::new("x@y.cz".into(), "h".into(), "Xy".into(), role)
    }

    #[test]
    fn test_authorize() {
        assert!(authorize(&user(UserRole::Admin), Permission::UserDelete).is_ok());
        assert!(authorize(&user(UserRole::Editor), Permission::UserView).is_ok());
        let err = authorize(&user(UserRole::User), Permission::UserView).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_self_access() {
        let actor = user(UserRole::User);
        assert!(authorize_self_or(&actor, actor.id, Permission::UserView).is_ok());
        assert!(authorize_self_or(&actor, Uuid::new_v4(), Permission::UserView).is_err());
    }
}
