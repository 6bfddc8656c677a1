//! Password verification using Argon2id, with a shim for legacy
//! plaintext records.

use argon2::{Argon2, PasswordVerifier};
use tracing::warn;

use crate::error::AuthError;

/// PHC prefix shared by every Argon2 variant.
const ARGON2_PREFIX: &str = "$argon2";

/// Outcome of checking a password against a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Match,
    /// Matched a stored plaintext value; the caller should re-hash it.
    LegacyPlaintext,
    Mismatch,
}

impl PasswordCheck {
    pub fn is_valid(&self) -> bool {
        !matches!(self, PasswordCheck::Mismatch)
    }
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// If `pepper` is provided it is prepended to the password before
/// verification; this must match the pepper used during hashing.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    let argon2 = Argon2::default();
    match argon2.verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// Check `password` against whatever is stored for the account.
///
/// Stored values without the Argon2 PHC prefix are treated as legacy
/// plaintext and compared directly.
pub fn verify_stored_password(
    password: &str,
    stored: &str,
    pepper: Option<&str>,
) -> Result<PasswordCheck, AuthError> {
    if stored.starts_with(ARGON2_PREFIX) {
        return Ok(if verify_password(password, stored, pepper)? {
            PasswordCheck::Match
        } else {
            PasswordCheck::Mismatch
        });
    }

    if !stored.is_empty() && constant_time_eq(password.as_bytes(), stored.as_bytes()) {
        warn!("Accepted legacy plaintext credential; it will be re-hashed");
        Ok(PasswordCheck::LegacyPlaintext)
    } else {
        Ok(PasswordCheck::Mismatch)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
