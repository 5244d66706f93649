use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role name assigned to a staff account (e.g. `"Admin"`, `"Editor"`).
///
/// Roles are opaque strings except for [`Role::ADMIN`], which bypasses
/// fine-grained permission checks. Comparison is exact (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN_NAME: &'static str = "Admin";

    pub const ADMIN: Role = Role(Cow::Borrowed(Self::ADMIN_NAME));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.as_str() == Self::ADMIN_NAME
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
