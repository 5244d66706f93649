//! Request/response interceptor: authorization before sending, uniform
//! failure handling after.
//!
//! Request side, per request:
//!
//! ```text
//! Building ──(permission missing / not admin)──▶ Denied   (notify, not sent)
//!    │
//!    ▼
//! Authorized (bearer attached) ──▶ Sent
//! ```
//!
//! Response side: 401 tears the session down (once per session generation)
//! and schedules a redirect to the login route; 403 only notifies; other
//! failures notify with the best message that can be extracted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use backoffice_auth::{authorize, authorize_admin, explain_authorization};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::config::{DEFAULT_LOGIN_ROUTE, DEFAULT_REDIRECT_DELAY};
use crate::error::ApiError;
use crate::navigate::Navigator;
use crate::notify::{Notification, Notifier};
use crate::request::ApiRequest;
use crate::session::{SessionContext, SessionSnapshot};
use crate::transport::{ApiResponse, PreparedRequest, TransportError};

pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to perform this action.";
pub const ADMIN_ONLY_MESSAGE: &str = "Only administrators can perform this action.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied. You are not allowed to access this resource.";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection and try again.";
pub const CLIENT_ERROR_MESSAGE: &str = "Something went wrong while preparing the request.";

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const NON_FIELD_ERRORS_PREFIX: &str = "non_field_errors: ";
const MESSAGE_FIELDS: [&str; 3] = ["message", "detail", "error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Building,
    Authorized,
    Denied,
    Sent,
}

/// Run the request-side stages against a snapshot. Pure: no notifications.
pub fn prepare(request: ApiRequest, snapshot: &SessionSnapshot) -> Result<PreparedRequest, ApiError> {
    let request_id = request.request_id;
    let mut stage = RequestStage::Building;
    tracing::debug!(%request_id, ?stage, "building request");

    let mut headers = request.headers;
    if !headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(CONTENT_TYPE.as_str())) {
        headers.push((CONTENT_TYPE.as_str().to_string(), "application/json".to_string()));
    }

    if let Some(required) = request.policy.permission_to_check() {
        if authorize(&snapshot.flags, &snapshot.permissions, required).is_err() {
            stage = RequestStage::Denied;
            let explanation =
                explain_authorization(&snapshot.flags, &snapshot.permissions, &[required.codename()]);
            tracing::warn!(%request_id, ?stage, ?explanation, "request denied: missing permission");
            return Err(ApiError::PermissionDenied(required.codename().to_string()));
        }
    }

    if request.policy.admin_only && authorize_admin(&snapshot.flags).is_err() {
        stage = RequestStage::Denied;
        tracing::warn!(%request_id, ?stage, "request denied: admin only");
        return Err(ApiError::AdminOnly);
    }

    stage = RequestStage::Authorized;
    tracing::debug!(%request_id, ?stage, "request authorized");

    if let Some(err) = request.setup_error {
        return Err(ApiError::Client(err));
    }

    let mut map = HeaderMap::with_capacity(headers.len() + 2);
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ApiError::Client(format!("invalid header name '{name}': {e}")))?;
        let header_value = HeaderValue::from_str(&value)
            .map_err(|e| ApiError::Client(format!("invalid value for header '{name}': {e}")))?;
        map.append(header_name, header_value);
    }

    if request.policy.requires_auth {
        if let Some(token) = snapshot.token.as_deref() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::Client("bearer token is not a valid header value".to_string()))?;
            value.set_sensitive(true);
            map.insert(AUTHORIZATION, value);
        }
    }

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        map.insert(REQUEST_ID_HEADER, value);
    }

    Ok(PreparedRequest {
        request_id,
        method: request.method,
        path: request.path,
        headers: map,
        query: request.query,
        body: request.body,
    })
}

/// Best human-readable message in an error response body.
///
/// Looks for `message`, `detail` or `error` (string, or list of strings) and
/// strips the `non_field_errors: ` prefix the backend uses for form errors.
pub fn extract_message(response: &ApiResponse) -> String {
    let found = match serde_json::from_slice::<Value>(&response.body) {
        Ok(Value::Object(map)) => MESSAGE_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(message_text)),
        Ok(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    };

    match found {
        Some(message) => message.replace(NON_FIELD_ERRORS_PREFIX, "").trim().to_string(),
        None => format!("Request failed with status {}", response.status),
    }
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        _ => None,
    }
}

/// Latches which session generation has been torn down.
#[derive(Debug, Default)]
pub struct TeardownLatch {
    next_generation: AtomicU64,
}

impl TeardownLatch {
    /// True for the first caller per generation.
    pub fn try_begin(&self, generation: u64) -> bool {
        self.next_generation
            .fetch_max(generation.saturating_add(1), Ordering::SeqCst)
            <= generation
    }
}

/// Side-effecting half of the interceptor.
pub struct Interceptor {
    session: Arc<dyn SessionContext>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    redirect_delay: Duration,
    teardown: TeardownLatch,
}

impl Interceptor {
    pub fn new(
        session: Arc<dyn SessionContext>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            notifier,
            navigator,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            teardown: TeardownLatch::default(),
        }
    }

    pub fn set_notifier(&mut self, notifier: Arc<dyn Notifier>) {
        self.notifier = notifier;
    }

    pub fn set_navigator(&mut self, navigator: Arc<dyn Navigator>) {
        self.navigator = navigator;
    }

    pub fn set_login_route(&mut self, route: impl Into<String>) {
        self.login_route = route.into();
    }

    pub fn set_redirect_delay(&mut self, delay: Duration) {
        self.redirect_delay = delay;
    }

    pub fn session(&self) -> &Arc<dyn SessionContext> {
        &self.session
    }

    /// Request side. On success returns the prepared request and the session
    /// generation it was authorized under.
    pub fn on_request(&self, request: ApiRequest) -> Result<(PreparedRequest, u64), ApiError> {
        let snapshot = self.session.snapshot();
        match prepare(request, &snapshot) {
            Ok(prepared) => Ok((prepared, snapshot.generation)),
            Err(err) => {
                let message = match &err {
                    ApiError::PermissionDenied(_) => PERMISSION_DENIED_MESSAGE,
                    ApiError::AdminOnly => ADMIN_ONLY_MESSAGE,
                    _ => {
                        tracing::error!(error = %err, "request setup failed");
                        CLIENT_ERROR_MESSAGE
                    }
                };
                self.notifier.notify(Notification::error(message));
                Err(err)
            }
        }
    }

    /// Response side.
    pub fn on_response(
        &self,
        result: Result<ApiResponse, TransportError>,
        generation: u64,
    ) -> Result<ApiResponse, ApiError> {
        let response = match result {
            Ok(response) if response.is_success() => return Ok(response),
            Ok(response) => response,
            Err(TransportError::Network(detail)) => {
                tracing::error!(error = %detail, "no response received");
                self.notifier.notify(Notification::error(NETWORK_ERROR_MESSAGE));
                return Err(ApiError::Network(detail));
            }
            Err(TransportError::Setup(detail)) => {
                tracing::error!(error = %detail, "request setup failed");
                self.notifier.notify(Notification::error(CLIENT_ERROR_MESSAGE));
                return Err(ApiError::Client(detail));
            }
        };

        match response.status {
            401 => {
                self.handle_unauthenticated(generation);
                Err(ApiError::Unauthenticated)
            }
            403 => {
                tracing::warn!("server denied access (403)");
                self.notifier.notify(Notification::warning(ACCESS_DENIED_MESSAGE));
                Err(ApiError::Forbidden)
            }
            status => {
                let message = extract_message(&response);
                tracing::error!(status, %message, "request failed");
                self.notifier.notify(Notification::error(message.clone()));
                Err(ApiError::Server {
                    status,
                    message,
                    body: response.json::<Value>().ok(),
                })
            }
        }
    }

    fn handle_unauthenticated(&self, generation: u64) {
        let current = self.session.generation();
        if current != generation {
            tracing::debug!(generation, current, "ignoring 401 from a previous session");
            return;
        }
        if !self.teardown.try_begin(generation) {
            tracing::debug!(generation, "session already torn down");
            return;
        }

        tracing::warn!(generation, "session expired; logging out");
        self.notifier.notify(Notification::warning(SESSION_EXPIRED_MESSAGE));
        self.session.logout();
        self.schedule_redirect();
    }

    fn schedule_redirect(&self) {
        let navigator = self.navigator.clone();
        let route = self.login_route.clone();
        let delay = self.redirect_delay;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.redirect(&route);
                });
            }
            Err(_) => navigator.redirect(&route),
        }
    }
}

impl core::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Interceptor")
            .field("login_route", &self.login_route)
            .field("redirect_delay", &self.redirect_delay)
            .field("teardown", &self.teardown)
            .finish_non_exhaustive()
    }
}
