//! Reversible obfuscation for session values kept in local storage.
//!
//! JSON → XOR against a repeating secret → base64. This only keeps values
//! from being readable at a glance; the key ships with the client and the
//! scheme offers neither confidentiality nor integrity.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("obfuscation secret is empty")]
    EmptySecret,

    #[error("failed to serialize value: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("value is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("deobfuscated bytes are not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("deobfuscated text is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
}

#[derive(Clone)]
pub struct SessionCipher {
    key: Vec<u8>,
}

impl SessionCipher {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, CipherError> {
        let key = secret.as_ref().to_vec();
        if key.is_empty() {
            return Err(CipherError::EmptySecret);
        }
        Ok(Self { key })
    }

    fn xor(&self, bytes: &mut [u8]) {
        for (i, b) in bytes.iter_mut().enumerate() {
            *b ^= self.key[i % self.key.len()];
        }
    }

    pub fn try_cipher<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, CipherError> {
        let mut bytes = serde_json::to_vec(data).map_err(CipherError::Serialize)?;
        self.xor(&mut bytes);
        Ok(STANDARD.encode(bytes))
    }

    pub fn try_decipher<T: DeserializeOwned>(&self, cipher_text: &str) -> Result<T, CipherError> {
        let mut bytes = STANDARD.decode(cipher_text.trim())?;
        self.xor(&mut bytes);
        let text = String::from_utf8(bytes)?;
        serde_json::from_str(&text).map_err(CipherError::Json)
    }

    /// Obfuscate a value. Returns an empty string (and logs) if it cannot be
    /// serialized.
    pub fn cipher<T: Serialize + ?Sized>(&self, data: &T) -> String {
        self.try_cipher(data).unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to obfuscate session value");
            String::new()
        })
    }

    /// Reverse [`cipher`](Self::cipher). Returns `None` (and logs) on
    /// malformed input.
    pub fn decipher(&self, cipher_text: &str) -> Option<Value> {
        match self.try_decipher(cipher_text) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(error = %err, "failed to deobfuscate session value");
                None
            }
        }
    }
}

impl core::fmt::Debug for SessionCipher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionCipher")
            .field("key_len", &self.key.len())
            .finish()
    }
}
