//! `backoffice-auth`: pure authorization decisions for the admin dashboard.
//!
//! This crate is intentionally decoupled from HTTP and storage: callers supply
//! a [`SessionFlags`] snapshot and the granted permission set.

pub mod authorize;
pub mod permissions;
pub mod roles;
pub mod routes;
pub mod session;

pub use authorize::{
    ADMIN_SENTINEL, AuthzError, SUPERUSER_SENTINEL, authorize, authorize_admin,
    explain_authorization, has_permissions,
};
pub use permissions::Permission;
pub use roles::Role;
pub use routes::{Locale, RouteAccess, RoutePermissionMap};
pub use session::SessionFlags;
