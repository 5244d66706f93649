//! Transport layer: moves an authorized request over the wire.

use std::future::Future;

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Request that passed the interceptor; headers are final.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub request_id: Uuid,
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_body(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be built; nothing was sent.
    #[error("request setup failed: {0}")]
    Setup(String),

    /// Sent (or attempted) but no response came back.
    #[error("no response received: {0}")]
    Network(String),
}

pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: PreparedRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send;
}

/// HTTP transport over `reqwest`. Timeouts are reqwest's defaults.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path);

        let mut builder = self
            .client
            .request(request.method, &url)
            .headers(request.headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_builder() {
                TransportError::Setup(e.to_string())
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_join_handles_slashes() {
        let t = ReqwestTransport::new("http://localhost:8000/api/").unwrap();
        assert_eq!(t.url_for("/orders/"), "http://localhost:8000/api/orders/");

        let t = ReqwestTransport::new("http://localhost:8000/api").unwrap();
        assert_eq!(t.base_url(), "http://localhost:8000/api");
        assert_eq!(t.url_for("orders"), "http://localhost:8000/api/orders");
    }

    #[test]
    fn response_helpers() {
        let resp = ApiResponse::json_body(201, &serde_json::json!({ "id": 7 }));
        assert!(resp.is_success());
        assert_eq!(resp.json::<Value>().unwrap()["id"], 7);
        assert!(!ApiResponse::new(404, "").is_success());
    }
}
