//! Password hashing and verification.
//!
//! Stored hashes come in two shapes:
//! - argon2 PHC strings (`$argon2id$v=19$...`), salted and slow;
//! - legacy unsalted SHA-1 hex digests. The digest of the candidate is compared
//!   to the stored value ignoring letter case, so `D033E2...` and `d033e2...`
//!   both match. Only the digest is case-folded, never the plaintext.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use rand::rngs::OsRng;
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;
use tracing::warn;

const PHC_PREFIX: &str = "$argon2";

/// Argon2id with the crate defaults (m=19456 KiB, t=2, p=1); cheap parameters in tests.
fn argon2_instance() -> Argon2<'static> {
    #[cfg(test)]
    {
        #[allow(clippy::expect_used)]
        let params = argon2::Params::new(1024, 1, 1, None).expect("valid Argon2 params for tests");
        Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
    }

    #[cfg(not(test))]
    {
        Argon2::default()
    }
}

#[must_use]
pub fn is_phc(stored: &str) -> bool {
    stored.starts_with(PHC_PREFIX)
}

/// Produce an argon2id PHC string for the `users` section of the configuration.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    argon2_instance()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Unsalted SHA-1 hex digest, the format older configuration files carry.
#[must_use]
pub fn legacy_digest(plaintext: &str) -> String {
    hex::encode(Sha1::digest(plaintext.as_bytes()))
}

/// Check `candidate` against a stored hash of either format.
#[must_use]
pub fn verify(candidate: &str, stored: &str) -> bool {
    if is_phc(stored) {
        let Ok(parsed) = PasswordHash::new(stored) else {
            warn!("Stored password hash is not a valid PHC string");
            return false;
        };
        return argon2_instance()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok();
    }

    let digest = legacy_digest(candidate);
    let stored = stored.trim().to_ascii_lowercase();
    digest.as_bytes().ct_eq(stored.as_bytes()).into()
}
