//! HTTP client for the dashboard API with permission-gated requests.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::interceptor::{Interceptor, RequestStage};
use crate::navigate::{Navigator, TracingNavigator};
use crate::notify::{Notifier, TracingNotifier};
use crate::request::ApiRequest;
use crate::session::SessionContext;
use crate::transport::{ApiResponse, ReqwestTransport, Transport, TransportError};

/// Every request goes through the interceptor: a request that fails the
/// client-side checks never reaches the transport.
///
/// Client-side checks are a UX guard only; the server re-checks everything.
pub struct ApiClient<T = ReqwestTransport> {
    transport: T,
    interceptor: Interceptor,
}

impl ApiClient<ReqwestTransport> {
    pub fn from_config(
        config: &ClientConfig,
        session: Arc<dyn SessionContext>,
    ) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.api_url.clone())?;
        Ok(Self::new(transport, session)
            .with_login_route(config.login_route.clone())
            .with_redirect_delay(config.redirect_delay))
    }
}

impl<T: Transport> ApiClient<T> {
    /// Client with log-only notifications and redirects.
    pub fn new(transport: T, session: Arc<dyn SessionContext>) -> Self {
        Self {
            transport,
            interceptor: Interceptor::new(
                session,
                Arc::new(TracingNotifier),
                Arc::new(TracingNavigator),
            ),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.interceptor.set_notifier(notifier);
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.interceptor.set_navigator(navigator);
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.interceptor.set_login_route(route);
        self
    }

    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.interceptor.set_redirect_delay(delay);
        self
    }

    pub fn session(&self) -> &Arc<dyn SessionContext> {
        self.interceptor.session()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request and return the raw (successful) response.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let span = tracing::info_span!(
            "api_request",
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
        );

        async move {
            let (prepared, generation) = self.interceptor.on_request(request)?;
            tracing::debug!(stage = ?RequestStage::Sent, "sending request");
            let result = self.transport.send(prepared).await;
            let response = self.interceptor.on_response(result, generation)?;
            tracing::debug!(status = response.status, "request succeeded");
            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// Send a request and decode its JSON body. An empty body decodes as `null`.
    pub async fn send_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        let response = self.send(request).await?;
        let decoded = if response.body.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_value(serde_json::Value::Null)
        } else {
            response.json()
        };
        decoded.map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl<T> core::fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiClient")
            .field("interceptor", &self.interceptor)
            .finish_non_exhaustive()
    }
}
