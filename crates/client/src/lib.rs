//! `backoffice-client`
//!
//! **Responsibility:** permission-gated access to the dashboard API.
//!
//! This crate provides:
//! - Obfuscated local storage for session role flags
//! - A session context (token, granted permissions, role flags)
//! - An HTTP client whose interceptor refuses requests the session is not
//!   allowed to make and handles 401/403/other failures uniformly
//!
//! Authorization decisions themselves live in `backoffice-auth`.

pub mod cipher;
pub mod client;
pub mod config;
pub mod cookies;
pub mod error;
pub mod interceptor;
pub mod navigate;
pub mod notify;
pub mod request;
pub mod session;
pub mod session_store;
pub mod storage;
pub mod transport;

pub use cipher::{CipherError, SessionCipher};
pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use cookies::CookieJar;
pub use error::ApiError;
pub use interceptor::RequestStage;
pub use navigate::{MemoryNavigator, Navigator, TracingNavigator};
pub use notify::{MemoryNotifier, Notification, Notifier, Severity, TracingNotifier};
pub use request::{ApiRequest, RequestPolicy};
pub use session::{ClientSession, LoginOutcome, SessionContext, SessionSnapshot};
pub use session_store::{EncryptedSessionStore, StoredValue};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use transport::{ApiResponse, PreparedRequest, ReqwestTransport, Transport, TransportError};
