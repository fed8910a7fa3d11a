//! Role-based access control.
//!
//! Permissions are static: each role carries a fixed grant set.

use serde::Serialize;

use super::user::UserRole;

/// Named capability checked by handlers and services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Permission {
    #[serde(rename = "user.view")]
    UserView,
    #[serde(rename = "user.create")]
    UserCreate,
    #[serde(rename = "user.edit")]
    UserEdit,
    #[serde(rename = "user.delete")]
    UserDelete,
    #[serde(rename = "user.manage_roles")]
    UserManageRoles,
    #[serde(rename = "blog.create")]
    BlogCreate,
    #[serde(rename = "monitoring.view")]
    MonitoringView,
    #[serde(rename = "theme.manage")]
    ThemeManage,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Permission::UserView,
        Permission::UserCreate,
        Permission::UserEdit,
        Permission::UserDelete,
        Permission::UserManageRoles,
        Permission::BlogCreate,
        Permission::MonitoringView,
        Permission::ThemeManage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UserView => "user.view",
            Permission::UserCreate => "user.create",
            Permission::UserEdit => "user.edit",
            Permission::UserDelete => "user.delete",
            Permission::UserManageRoles => "user.manage_roles",
            Permission::BlogCreate => "blog.create",
            Permission::MonitoringView => "monitoring.view",
            Permission::ThemeManage => "theme.manage",
        }
    }

    pub fn is_granted_to(&self, role: UserRole) -> bool {
        match role {
            UserRole::Admin => true,
            UserRole::Editor => matches!(self, Permission::UserView | Permission::BlogCreate),
            UserRole::User => false,
        }
    }

    /// Every permission the role holds
    pub fn granted_to(role: UserRole) -> Vec<Permission> {
        Self::ALL
            .iter()
            .copied()
            .filter(|p| p.is_granted_to(role))
            .collect()
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
