//! Session context shared by every request the client makes.
//!
//! The interceptor only reads from it (one snapshot per request); login and
//! logout are the only writers. A snapshot never mixes state from two logins.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use backoffice_auth::{Permission, Role, SessionFlags};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cipher::SessionCipher;
use crate::cookies::CookieJar;
use crate::session_store::EncryptedSessionStore;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

pub const LOCAL_STORAGE_FILE: &str = "local_storage.json";
pub const COOKIES_FILE: &str = "cookies.json";

/// Session state as seen by one request.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub permissions: Vec<Permission>,
    pub flags: SessionFlags,
    pub generation: u64,
}

/// What the interceptor needs from the session.
pub trait SessionContext: Send + Sync {
    /// Bearer token, if logged in.
    fn token(&self) -> Option<String>;

    fn user_permissions(&self) -> Vec<Permission>;

    fn flags(&self) -> SessionFlags;

    /// Bumped on every login. Used to tear a session down at most once.
    fn generation(&self) -> u64;

    /// End the session: auth cookies, role flags and granted permissions.
    fn logout(&self);

    /// Everything one request is authorized against. Implementations whose
    /// state can change mid-read should override this to read atomically.
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: self.token(),
            permissions: self.user_permissions(),
            flags: self.flags(),
            generation: self.generation(),
        }
    }
}

/// Login response as returned by the backend's auth endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub is_super_user: bool,
    #[serde(default)]
    pub user_role: Option<Role>,
}

/// Session backed by the obfuscated local store and the cookie jar.
#[derive(Debug)]
pub struct ClientSession {
    local: EncryptedSessionStore,
    cookies: CookieJar,
    permissions: RwLock<Vec<Permission>>,
    generation: AtomicU64,
    logged_in_at: RwLock<Option<DateTime<Utc>>>,
    /// Held for writing by login/logout, for reading by snapshots.
    transition: RwLock<()>,
}

impl ClientSession {
    pub fn new(local: EncryptedSessionStore, cookies: CookieJar) -> Self {
        Self {
            local,
            cookies,
            permissions: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
            logged_in_at: RwLock::new(None),
            transition: RwLock::new(()),
        }
    }

    /// Session that lives only as long as the process.
    pub fn in_memory(cipher: SessionCipher) -> Self {
        let local: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let cookies: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        Self::new(EncryptedSessionStore::new(local, cipher), CookieJar::new(cookies))
    }

    /// Session persisted under `dir`. Role flags and cookies from an earlier
    /// run are picked up; granted permissions are not persisted and must be
    /// re-fetched with [`set_permissions`](Self::set_permissions).
    pub fn open(dir: &Path, cipher: SessionCipher) -> Result<Self, StorageError> {
        let local: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.join(LOCAL_STORAGE_FILE))?);
        let cookies: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.join(COOKIES_FILE))?);
        Ok(Self::new(
            EncryptedSessionStore::new(local, cipher),
            CookieJar::new(cookies),
        ))
    }

    pub fn local_store(&self) -> &EncryptedSessionStore {
        &self.local
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Persist a successful login and start a new session generation.
    ///
    /// The previous identity is dropped before anything new is stored and the
    /// tokens are stored last. If storing fails the session ends up logged
    /// out, never with the new token next to the old role flags.
    pub fn login(&self, outcome: LoginOutcome) -> Result<(), StorageError> {
        let _transition = self.transition.write().unwrap_or_else(PoisonError::into_inner);

        self.set_permissions(Vec::new());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let flags = SessionFlags::new(outcome.is_super_user, outcome.user_role);
        let stored = self
            .local
            .clear_flags()
            .and_then(|()| self.local.write_flags(&flags))
            .and_then(|()| {
                self.cookies
                    .set_tokens(&outcome.access_token, outcome.refresh_token.as_deref())
            });
        if let Err(err) = stored {
            tracing::error!(generation, error = %err, "failed to persist login; logging out");
            self.clear_session();
            return Err(err);
        }

        let granted = outcome.permissions.len();
        self.set_permissions(outcome.permissions);
        *self.logged_in_at.write().unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());

        tracing::info!(generation, granted, "session logged in");
        Ok(())
    }

    pub fn set_permissions(&self, permissions: Vec<Permission>) {
        *self.permissions.write().unwrap_or_else(PoisonError::into_inner) = permissions;
    }

    pub fn is_authenticated(&self) -> bool {
        self.cookies.access_token().is_some()
    }

    pub fn logged_in_at(&self) -> Option<DateTime<Utc>> {
        *self.logged_in_at.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Caller holds `transition` for writing.
    fn clear_session(&self) {
        if let Err(err) = self.cookies.clear_auth() {
            tracing::error!(error = %err, "failed to clear auth cookies");
        }
        if let Err(err) = self.local.clear_flags() {
            tracing::error!(error = %err, "failed to clear session flags");
        }
        self.set_permissions(Vec::new());
        *self.logged_in_at.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl SessionContext for ClientSession {
    fn token(&self) -> Option<String> {
        self.cookies.access_token()
    }

    fn user_permissions(&self) -> Vec<Permission> {
        self.permissions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn flags(&self) -> SessionFlags {
        self.local.flags()
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn logout(&self) {
        let _transition = self.transition.write().unwrap_or_else(PoisonError::into_inner);
        self.clear_session();
        tracing::info!(generation = self.generation(), "session logged out");
    }

    fn snapshot(&self) -> SessionSnapshot {
        let _transition = self.transition.read().unwrap_or_else(PoisonError::into_inner);
        SessionSnapshot {
            token: self.token(),
            permissions: self.user_permissions(),
            flags: self.flags(),
            generation: self.generation(),
        }
    }
}
