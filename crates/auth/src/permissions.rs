use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission granted to (or required of) a session.
///
/// Permissions are identified by their codename (e.g. `"delete_post"`); two
/// permissions are the same permission iff their codenames are equal. The wire
/// shape matches what the backend returns at login: `{"codename": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    codename: Cow<'static, str>,
}

impl Permission {
    pub fn new(codename: impl Into<Cow<'static, str>>) -> Self {
        Self {
            codename: codename.into(),
        }
    }

    pub fn codename(&self) -> &str {
        &self.codename
    }

    /// An empty codename means "no check".
    pub fn is_empty(&self) -> bool {
        self.codename.is_empty()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.codename)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Returns true if `granted` contains a permission with the given codename.
pub fn is_granted(granted: &[Permission], codename: &str) -> bool {
    granted.iter().any(|p| p.codename() == codename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_shape() {
        let perms: Vec<Permission> =
            serde_json::from_str(r#"[{"codename":"view_post"},{"codename":"delete_post"}]"#)
                .unwrap();

        assert_eq!(perms.len(), 2);
        assert!(is_granted(&perms, "delete_post"));
        assert!(!is_granted(&perms, "add_post"));
    }

    #[test]
    fn serializes_with_codename_field() {
        let json = serde_json::to_value(Permission::new("view_coupon")).unwrap();
        assert_eq!(json, serde_json::json!({ "codename": "view_coupon" }));
    }
}
