use std::sync::Arc;

use crate::storage::{KeyValueStore, StorageError};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Auth cookies (bearer and refresh tokens), stored unobfuscated.
#[derive(Clone)]
pub struct CookieJar {
    store: Arc<dyn KeyValueStore>,
}

impl CookieJar {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn read(&self, name: &str) -> Option<String> {
        match self.store.get(name) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                tracing::error!(cookie = name, error = %err, "failed to read cookie");
                None
            }
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_COOKIE)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_COOKIE)
    }

    pub fn set_tokens(&self, access: &str, refresh: Option<&str>) -> Result<(), StorageError> {
        self.store.set(ACCESS_TOKEN_COOKIE, access)?;
        match refresh {
            Some(refresh) => self.store.set(REFRESH_TOKEN_COOKIE, refresh),
            None => self.store.remove(REFRESH_TOKEN_COOKIE),
        }
    }

    /// Remove both auth cookies.
    pub fn clear_auth(&self) -> Result<(), StorageError> {
        self.store.remove(ACCESS_TOKEN_COOKIE)?;
        self.store.remove(REFRESH_TOKEN_COOKIE)
    }
}

impl core::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CookieJar")
            .field("has_access_token", &self.access_token().is_some())
            .finish()
    }
}
