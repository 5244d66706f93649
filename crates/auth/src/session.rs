use serde::{Deserialize, Serialize};

use crate::Role;

/// Role flags of the current session.
///
/// Written at login, read on every authorization decision and cleared at
/// logout. `Default` is the logged-out state: not a superuser, no role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFlags {
    #[serde(rename = "isSuperUser")]
    pub is_super_user: bool,

    #[serde(rename = "userRole")]
    pub user_role: Option<Role>,
}

impl SessionFlags {
    pub fn new(is_super_user: bool, user_role: Option<Role>) -> Self {
        Self {
            is_super_user,
            user_role,
        }
    }

    pub fn superuser() -> Self {
        Self::new(true, None)
    }

    pub fn with_role(role: Role) -> Self {
        Self::new(false, Some(role))
    }

    pub fn is_admin_role(&self) -> bool {
        self.user_role.as_ref().is_some_and(Role::is_admin)
    }

    /// Superuser or Admin: the sessions that bypass codename checks.
    pub fn is_privileged(&self) -> bool {
        self.is_super_user || self.is_admin_role()
    }
}
