//! Obfuscated local storage for session role flags.

use std::sync::Arc;

use backoffice_auth::{Role, SessionFlags};
use serde::Serialize;
use serde_json::Value;

use crate::cipher::SessionCipher;
use crate::storage::{KeyValueStore, StorageError};

pub const IS_SUPER_USER_KEY: &str = "isSuperUser";
pub const USER_ROLE_KEY: &str = "userRole";

/// Result of a decrypting read.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Decrypted(Value),
    /// Present but not decryptable; the still-encoded text as stored.
    Raw(String),
}

impl StoredValue {
    pub fn decrypted(&self) -> Option<&Value> {
        match self {
            StoredValue::Decrypted(v) => Some(v),
            StoredValue::Raw(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct EncryptedSessionStore {
    store: Arc<dyn KeyValueStore>,
    cipher: SessionCipher,
}

impl EncryptedSessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, cipher: SessionCipher) -> Self {
        Self { store, cipher }
    }

    /// Read and deobfuscate `key`.
    ///
    /// `None` if the key was never written (or storage is unreadable). A value
    /// that fails to deobfuscate comes back as [`StoredValue::Raw`].
    pub fn get_decrypted(&self, key: &str) -> Option<StoredValue> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::error!(key, error = %err, "failed to read session storage");
                return None;
            }
        };

        match self.cipher.try_decipher::<Value>(&raw) {
            Ok(value) => Some(StoredValue::Decrypted(value)),
            Err(err) => {
                tracing::warn!(key, error = %err, "session value is not decryptable; returning raw value");
                Some(StoredValue::Raw(raw))
            }
        }
    }

    pub fn set_encrypted<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.store.set(key, &self.cipher.cipher(value))
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key)
    }

    /// Current role flags.
    ///
    /// Anything that is missing, raw or of the wrong shape reads as the
    /// unprivileged default for that flag.
    pub fn flags(&self) -> SessionFlags {
        let is_super_user = match self.get_decrypted(IS_SUPER_USER_KEY) {
            Some(StoredValue::Decrypted(Value::Bool(b))) => b,
            Some(StoredValue::Decrypted(other)) => {
                tracing::warn!(value = %other, "ignoring non-boolean isSuperUser flag");
                false
            }
            Some(StoredValue::Raw(_)) | None => false,
        };

        let user_role = self
            .get_decrypted(USER_ROLE_KEY)
            .as_ref()
            .and_then(StoredValue::decrypted)
            .and_then(Value::as_str)
            .filter(|role| !role.is_empty())
            .map(|role| Role::new(role.to_string()));

        SessionFlags::new(is_super_user, user_role)
    }

    pub fn write_flags(&self, flags: &SessionFlags) -> Result<(), StorageError> {
        self.set_encrypted(IS_SUPER_USER_KEY, &flags.is_super_user)?;
        match &flags.user_role {
            Some(role) => self.set_encrypted(USER_ROLE_KEY, role.as_str()),
            None => self.remove(USER_ROLE_KEY),
        }
    }

    pub fn clear_flags(&self) -> Result<(), StorageError> {
        self.remove(IS_SUPER_USER_KEY)?;
        self.remove(USER_ROLE_KEY)
    }
}

impl core::fmt::Debug for EncryptedSessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EncryptedSessionStore")
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn store() -> (Arc<MemoryStore>, EncryptedSessionStore) {
        let backing = Arc::new(MemoryStore::new());
        let cipher = SessionCipher::new("test-secret").unwrap();
        let store = EncryptedSessionStore::new(backing.clone(), cipher);
        (backing, store)
    }

    #[test]
    fn unwritten_key_reads_none() {
        let (_, store) = store();
        assert_eq!(store.get_decrypted("never-written"), None);
    }

    #[test]
    fn written_key_reads_original_value() {
        let (backing, store) = store();
        store.set_encrypted("prefs", &json!({ "locale": "ar" })).unwrap();

        assert_ne!(backing.get("prefs").unwrap().as_deref(), Some(r#"{"locale":"ar"}"#));
        assert_eq!(
            store.get_decrypted("prefs"),
            Some(StoredValue::Decrypted(json!({ "locale": "ar" })))
        );
    }

    #[test]
    fn undecryptable_value_is_returned_raw() {
        let (backing, store) = store();
        backing.set(USER_ROLE_KEY, "Admin").unwrap();

        let value = store.get_decrypted(USER_ROLE_KEY).unwrap();
        assert_eq!(value, StoredValue::Raw("Admin".to_string()));
        assert_eq!(value.decrypted(), None);
    }

    #[test]
    fn flags_round_trip() {
        let (_, store) = store();
        let flags = SessionFlags::new(true, Some(Role::new("Editor")));

        store.write_flags(&flags).unwrap();
        assert_eq!(store.flags(), flags);

        store.clear_flags().unwrap();
        assert_eq!(store.flags(), SessionFlags::default());
    }

    #[test]
    fn tampered_flags_fail_closed() {
        let (backing, store) = store();
        // Plain-text values planted without the secret.
        backing.set(IS_SUPER_USER_KEY, "true").unwrap();
        backing.set(USER_ROLE_KEY, "Admin").unwrap();

        let flags = store.flags();
        assert!(!flags.is_super_user);
        assert_eq!(flags.user_role, None);
        assert!(!flags.is_privileged());
    }

    #[test]
    fn writing_no_role_removes_stale_role() {
        let (_, store) = store();
        store.write_flags(&SessionFlags::with_role(Role::ADMIN)).unwrap();
        store.write_flags(&SessionFlags::default()).unwrap();

        assert_eq!(store.get_decrypted(USER_ROLE_KEY), None);
        assert_eq!(store.flags(), SessionFlags::default());
    }
}
