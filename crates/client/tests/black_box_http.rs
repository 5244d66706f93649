use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use backoffice_auth::{Permission, Role};
use backoffice_client::interceptor::{ACCESS_DENIED_MESSAGE, REQUEST_ID_HEADER, SESSION_EXPIRED_MESSAGE};
use backoffice_client::{
    ApiClient, ApiError, ApiRequest, ClientConfig, ClientSession, LoginOutcome, MemoryNavigator,
    MemoryNotifier, SessionCipher, SessionContext,
};
use serde_json::{Value, json};

const GOOD_TOKEN: &str = "good-token";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let app = Router::new()
            .route("/api/me/", get(me))
            .route("/api/staff/", get(|| async { StatusCode::FORBIDDEN }))
            .route("/api/coupons/", post(create_coupon))
            .route("/api/ping/", get(|| async { StatusCode::NO_CONTENT }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn me(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if bearer != Some(GOOD_TOKEN) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Ok(Json(json!({ "username": "ops", "requestId": request_id })))
}

async fn create_coupon(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let code = body.get("code").and_then(Value::as_str).unwrap_or_default();
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "detail": [format!("non_field_errors: Coupon {code} already exists.")] })),
    )
}

fn session_with_token(token: &str) -> Arc<ClientSession> {
    let session = ClientSession::in_memory(SessionCipher::new("black-box-secret").unwrap());
    session
        .login(LoginOutcome {
            access_token: token.to_string(),
            refresh_token: Some("refresh".to_string()),
            permissions: vec![Permission::new("view_staff"), Permission::new("add_coupon")],
            is_super_user: false,
            user_role: Some(Role::new("Support")),
        })
        .unwrap();
    Arc::new(session)
}

struct Wired {
    client: ApiClient,
    notifier: Arc<MemoryNotifier>,
    navigator: Arc<MemoryNavigator>,
}

fn wire(base_url: &str, session: Arc<ClientSession>) -> Wired {
    let config = ClientConfig::new(base_url, "black-box-secret")
        .with_redirect_delay(Duration::from_millis(10));
    let notifier = Arc::new(MemoryNotifier::new());
    let navigator = Arc::new(MemoryNavigator::new());
    let client = ApiClient::from_config(&config, session)
        .unwrap()
        .with_notifier(notifier.clone())
        .with_navigator(navigator.clone());
    Wired {
        client,
        notifier,
        navigator,
    }
}

#[tokio::test]
async fn bearer_token_and_request_id_reach_the_server() {
    let srv = TestServer::spawn().await;
    let w = wire(&srv.base_url, session_with_token(GOOD_TOKEN));

    let request = ApiRequest::get("/me/");
    let request_id = request.request_id.to_string();
    let body: Value = w.client.send_json(request).await.unwrap();

    assert_eq!(body["username"], "ops");
    assert_eq!(body["requestId"], request_id);
    assert!(w.notifier.notifications().is_empty());
}

#[tokio::test]
async fn expired_token_logs_out_and_redirects() {
    let srv = TestServer::spawn().await;
    let session = session_with_token("stale-token");
    let w = wire(&srv.base_url, session.clone());

    let err = w.client.send(ApiRequest::get("/me/")).await.unwrap_err();
    assert_eq!(err, ApiError::Unauthenticated);
    assert_eq!(w.client.session().token(), None);

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(w.navigator.redirects(), vec!["/en/login".to_string()]);
    assert_eq!(w.notifier.messages(), vec![SESSION_EXPIRED_MESSAGE.to_string()]);
    assert!(!session.is_authenticated());
    assert!(session.user_permissions().is_empty());
}

#[tokio::test]
async fn forbidden_keeps_the_session() {
    let srv = TestServer::spawn().await;
    let session = session_with_token(GOOD_TOKEN);
    let w = wire(&srv.base_url, session.clone());

    let err = w
        .client
        .send(ApiRequest::get("/staff/").require_permission("view_staff"))
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::Forbidden);
    assert!(session.is_authenticated());
    assert_eq!(w.notifier.messages(), vec![ACCESS_DENIED_MESSAGE.to_string()]);
}

#[tokio::test]
async fn validation_error_detail_is_surfaced() {
    let srv = TestServer::spawn().await;
    let w = wire(&srv.base_url, session_with_token(GOOD_TOKEN));

    let err = w
        .client
        .send(
            ApiRequest::post("/coupons/")
                .require_permission("add_coupon")
                .json(&json!({ "code": "SPRING" })),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(w.notifier.messages(), vec!["Coupon SPRING already exists.".to_string()]);
}

#[tokio::test]
async fn empty_success_body_decodes_as_null() {
    let srv = TestServer::spawn().await;
    let w = wire(&srv.base_url, session_with_token(GOOD_TOKEN));

    let body: Value = w.client.send_json(ApiRequest::get("/ping/")).await.unwrap();

    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let w = wire(&format!("http://{addr}"), session_with_token(GOOD_TOKEN));
    let err = w.client.send(ApiRequest::get("/me/")).await.unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
    assert!(w.navigator.redirects().is_empty());
}
