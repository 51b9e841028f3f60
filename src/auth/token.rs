//! Opaque token generation for CSRF tokens and session identifiers.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

const ENTROPY_BYTES: usize = 32;

/// Salted digest over OS randomness.
pub struct TokenGenerator {
    salt: SecretString,
}

impl TokenGenerator {
    #[must_use]
    pub fn new(salt: SecretString) -> Self {
        Self { salt }
    }

    /// Fresh CSRF token: hex SHA-256 of `salt || 32 random bytes`.
    ///
    /// # Errors
    /// Returns an error if the OS random source fails.
    pub fn generate(&self) -> Result<String> {
        let mut seed = [0u8; ENTROPY_BYTES];
        OsRng
            .try_fill_bytes(&mut seed)
            .context("failed to generate csrf token")?;
        Ok(self.digest(&seed))
    }

    /// Salted digest of a caller-supplied seed.
    #[must_use]
    pub fn digest(&self, seed: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.expose_secret().as_bytes());
        hasher.update(seed);
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGenerator")
            .field("salt", &"***")
            .finish()
    }
}

/// New session identifier for the cookie: 32 random bytes, base64url without padding.
///
/// # Errors
/// Returns an error if the OS random source fails.
pub fn generate_session_id() -> Result<String> {
    let mut bytes = [0u8; ENTROPY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session id")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}
