use serde::Serialize;
use thiserror::Error;

use crate::permissions::is_granted;
use crate::{Permission, SessionFlags};

/// Required codename that turns a check into "is this session superuser/Admin?".
pub const SUPERUSER_SENTINEL: &str = "isSuperUser";

/// Same meta-check as [`SUPERUSER_SENTINEL`], spelled as the role name.
pub const ADMIN_SENTINEL: &str = "Admin";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("forbidden: action is restricted to administrators")]
    AdminOnly,
}

fn is_sentinel(codename: &str) -> bool {
    codename == SUPERUSER_SENTINEL || codename == ADMIN_SENTINEL
}

/// Decide whether a session may perform an action requiring `required`.
///
/// Order of evaluation:
/// 1. a sentinel in `required` reduces the check to "superuser or Admin";
/// 2. superuser passes everything;
/// 3. the Admin role passes everything;
/// 4. otherwise every required codename must be granted (empty `required`
///    passes vacuously).
///
/// Pure: no IO, no panics.
pub fn has_permissions<R>(flags: &SessionFlags, granted: &[Permission], required: &[R]) -> bool
where
    R: AsRef<str>,
{
    if required.iter().any(|r| is_sentinel(r.as_ref())) {
        return flags.is_privileged();
    }

    if flags.is_super_user {
        return true;
    }

    if flags.is_admin_role() {
        return true;
    }

    required.iter().all(|r| is_granted(granted, r.as_ref()))
}

/// Single-permission form of [`has_permissions`] with a typed error.
///
/// An empty codename means "no check" and always passes.
pub fn authorize(
    flags: &SessionFlags,
    granted: &[Permission],
    required: &Permission,
) -> Result<(), AuthzError> {
    if required.is_empty() || has_permissions(flags, granted, &[required.codename()]) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.codename().to_string()))
    }
}

/// Gate for admin-only actions: superuser or the Admin role.
pub fn authorize_admin(flags: &SessionFlags) -> Result<(), AuthzError> {
    if flags.is_privileged() {
        Ok(())
    } else {
        Err(AuthzError::AdminOnly)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
///
/// Produced alongside (never instead of) [`has_permissions`] so a denied
/// request can be logged with enough context to debug a role setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub required: Vec<String>,
    pub granted: bool,
    pub reason: DecisionReason,
    pub is_super_user: bool,
    pub user_role: Option<String>,
    /// Required codenames absent from the granted set (only for codename checks).
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// A sentinel was required; decided on superuser/Admin alone.
    PrivilegeCheck,
    SuperuserBypass,
    AdminBypass,
    /// Nothing was required.
    NoRequirement,
    AllGranted,
    MissingPermission,
}

/// Explain the decision [`has_permissions`] makes for the same inputs.
pub fn explain_authorization<R>(
    flags: &SessionFlags,
    granted: &[Permission],
    required: &[R],
) -> AuthorizationExplanation
where
    R: AsRef<str>,
{
    let required_list: Vec<String> = required.iter().map(|r| r.as_ref().to_string()).collect();

    let (decision, reason, missing) = if required_list.iter().any(|r| is_sentinel(r)) {
        (flags.is_privileged(), DecisionReason::PrivilegeCheck, Vec::new())
    } else if flags.is_super_user {
        (true, DecisionReason::SuperuserBypass, Vec::new())
    } else if flags.is_admin_role() {
        (true, DecisionReason::AdminBypass, Vec::new())
    } else if required_list.is_empty() {
        (true, DecisionReason::NoRequirement, Vec::new())
    } else {
        let missing: Vec<String> = required_list
            .iter()
            .filter(|r| !is_granted(granted, r))
            .cloned()
            .collect();
        if missing.is_empty() {
            (true, DecisionReason::AllGranted, missing)
        } else {
            (false, DecisionReason::MissingPermission, missing)
        }
    };

    AuthorizationExplanation {
        required: required_list,
        granted: decision,
        reason,
        is_super_user: flags.is_super_user,
        user_role: flags.user_role.as_ref().map(|r| r.as_str().to_string()),
        missing,
    }
}
