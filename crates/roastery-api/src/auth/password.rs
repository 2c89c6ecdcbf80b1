/// Salted password hashing and verification using HMAC-SHA512
///
/// - Salt: 32 random bytes from the OS RNG, standard base64
/// - Hash: HMAC-SHA512 keyed by the decoded salt over the UTF-8 password
/// - Output: standard base64 of the 64-byte MAC
///
/// Verification recomputes the MAC and compares in constant time.
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha512;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

/// Salt length in bytes before encoding
pub const SALT_LEN: usize = 32;

/// Well-formed salt and hash that no password is expected to match
const DUMMY_SALT: &str = "OSygmZn5NX7ENaxPbCLqkhHazMHsgC+6HBbEzJELCQ8=";
const DUMMY_HASH: &str =
    "vHLzYWFNo8PGs7E4aQFDC99YYJ/BaejIqNS4v2h632ARtzaFSMmDYBUBHWKrn6duZVHQXD8wNHSeEUbOzTLQLg==";

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid salt encoding: {0}")]
    InvalidSalt(#[from] base64::DecodeError),

    #[error("Failed to initialise HMAC: {0}")]
    InvalidKey(String),
}

/// Generate a fresh random salt
///
/// # Example
///
/// ```no_run
/// use roastery_api::auth::password::{generate_salt, hash_password};
///
/// let salt = generate_salt();
/// let hash = hash_password("password123", &salt).expect("salt is valid base64");
/// ```
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

/// Hash a plaintext password with a base64 salt
///
/// Only fails when the salt does not decode, which cannot happen with a salt
/// produced by [`generate_salt`].
pub fn hash_password(password: &str, salt: &str) -> Result<String, PasswordError> {
    let key = STANDARD.decode(salt)?;
    let mac = compute_mac(password, &key)?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verify a plaintext password against a stored hash and salt
///
/// Never errors: any malformed input is logged and reported as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str, stored_salt: &str) -> bool {
    if stored_hash.is_empty() || stored_salt.is_empty() {
        tracing::warn!("Password verification attempted with empty hash or salt");
        return false;
    }

    let key = match STANDARD.decode(stored_salt) {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password salt is not valid base64");
            return false;
        }
    };

    let expected = match STANDARD.decode(stored_hash) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is not valid base64");
            return false;
        }
    };

    match compute_mac(password, &key) {
        Ok(mac) => mac.verify_slice(&expected).is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Password verification failed");
            false
        }
    }
}

/// Run a full verification against a fixed salt and hash
///
/// Used where no stored credentials exist so the failure costs one MAC,
/// the same as a wrong password.
pub fn verify_dummy_password(password: &str) {
    let _ = verify_password(password, DUMMY_HASH, DUMMY_SALT);
}

fn compute_mac(password: &str, key: &[u8]) -> Result<HmacSha512, PasswordError> {
    let mut mac =
        HmacSha512::new_from_slice(key).map_err(|e| PasswordError::InvalidKey(e.to_string()))?;
    mac.update(password.as_bytes());
    Ok(mac)
}
