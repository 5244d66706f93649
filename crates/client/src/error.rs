use serde_json::Value;
use thiserror::Error;

/// Failure of a call made through [`ApiClient`](crate::ApiClient).
///
/// Every variant is also surfaced to the user as a notification; the error is
/// returned regardless so callers can branch on it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// Required codename not granted; the request was not sent.
    #[error("permission denied: missing '{0}'")]
    PermissionDenied(String),

    /// Admin-only request from a non-admin session; not sent.
    #[error("action is restricted to administrators")]
    AdminOnly,

    /// 401: the server no longer accepts the session.
    #[error("session expired")]
    Unauthenticated,

    /// 403.
    #[error("access denied")]
    Forbidden,

    #[error("server returned {status}: {message}")]
    Server {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// No response received.
    #[error("network error: {0}")]
    Network(String),

    /// Failed before dispatch.
    #[error("client error: {0}")]
    Client(String),

    #[error("failed to decode response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status behind the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthenticated => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Denied locally, before anything reached the network.
    pub fn is_local_denial(&self) -> bool {
        matches!(self, ApiError::PermissionDenied(_) | ApiError::AdminOnly)
    }
}
