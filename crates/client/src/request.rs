//! Outgoing request description and its authorization policy.

use backoffice_auth::Permission;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Authorization requirements attached to a request.
///
/// The default is "send the bearer token, no specific permission".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPolicy {
    pub requires_auth: bool,
    pub required_permission: Option<Permission>,
    pub admin_only: bool,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            requires_auth: true,
            required_permission: None,
            admin_only: false,
        }
    }
}

impl RequestPolicy {
    /// No bearer token (login, password reset, ...).
    pub fn anonymous() -> Self {
        Self {
            requires_auth: false,
            ..Self::default()
        }
    }

    pub fn requiring(codename: impl Into<Permission>) -> Self {
        Self {
            required_permission: Some(codename.into()),
            ..Self::default()
        }
    }

    pub fn admin() -> Self {
        Self {
            admin_only: true,
            ..Self::default()
        }
    }

    /// The permission to check, ignoring empty codenames.
    pub fn permission_to_check(&self) -> Option<&Permission> {
        self.required_permission.as_ref().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub request_id: Uuid,
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub policy: RequestPolicy,
    /// Set when the request could not be built (e.g. unserializable body);
    /// reported before anything is sent.
    pub(crate) setup_error: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            method,
            path: path.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            policy: RequestPolicy::default(),
            setup_error: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(value),
            Err(err) => self.setup_error = Some(format!("failed to serialize request body: {err}")),
        }
        self
    }

    pub fn policy(mut self, policy: RequestPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn require_permission(mut self, codename: impl Into<Permission>) -> Self {
        self.policy.required_permission = Some(codename.into());
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.policy.admin_only = true;
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.policy.requires_auth = false;
        self
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}
