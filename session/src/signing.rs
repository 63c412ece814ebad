//! Session cookie signing.
//!
//! Cookie values have the form `<session-id>.<signature>`, where the
//! signature is HMAC-SHA256 over the session id, encoded as unpadded
//! URL-safe base64. Anything that fails verification is treated as if no
//! cookie had been sent.

use crate::error::{Result, SessionError};
use crate::state::SessionId;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies session cookie values.
#[derive(Clone)]
pub struct CookieSigner {
    mac: HmacSha256,
}

impl CookieSigner {
    /// Create a signer keyed with `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidKey`] if the secret is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SessionError::InvalidKey("secret must not be empty".into()));
        }

        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| SessionError::InvalidKey(e.to_string()))?;

        Ok(Self { mac })
    }

    /// Produce the cookie value for `id`.
    #[must_use]
    pub fn sign(&self, id: SessionId) -> String {
        let id = id.to_string();
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{id}.{signature}")
    }

    /// Recover the session id from a cookie value.
    ///
    /// Returns `None` for malformed values and bad signatures. The signature
    /// comparison is constant time.
    #[must_use]
    pub fn verify(&self, value: &str) -> Option<SessionId> {
        let (id, signature) = value.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;

        id.parse().ok()
    }
}

impl fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieSigner").finish_non_exhaustive()
    }
}
