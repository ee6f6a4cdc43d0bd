//! One-way salted password hashing (PBKDF2-HMAC-SHA256, PHC string format).

use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand::RngCore;

use crate::error::StoreError;

/// Default iteration count; tens of milliseconds per hash in release builds.
pub const DEFAULT_HASH_ROUNDS: u32 = 100_000;
/// Lowest iteration count the config accepts.
pub const MIN_HASH_ROUNDS: u32 = 1_000;

const SALT_LEN: usize = 16;
const OUTPUT_LEN: usize = 32;

/// Hashes new secrets and checks candidates against stored hashes.
///
/// Stored hashes embed their own salt and round count, so changing `rounds`
/// only affects hashes created afterwards.
#[derive(Debug, Clone, Copy)]
pub struct SecretHasher {
    rounds: u32,
}

impl SecretHasher {
    pub fn new(rounds: u32) -> Self {
        Self { rounds }
    }

    /// Hash `password` with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, StoreError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| StoreError::Storage(format!("salt encoding failed: {}", e)))?;

        let hash = Pbkdf2
            .hash_password_customized(password.as_bytes(), None, None, self.params(), &salt)
            .map_err(|e| StoreError::Storage(format!("password hashing failed: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Spend the same work as [`verify`](Self::verify) when there is no
    /// stored hash to check against. Never matches.
    pub fn verify_absent(&self, password: &str) -> bool {
        if let Ok(salt) = SaltString::encode_b64(&[0u8; SALT_LEN]) {
            let _ = Pbkdf2.hash_password_customized(
                password.as_bytes(),
                None,
                None,
                self.params(),
                &salt,
            );
        }
        false
    }

    fn params(&self) -> Params {
        Params {
            rounds: self.rounds,
            output_length: OUTPUT_LEN,
        }
    }

    /// Whether `password` matches `stored`. A malformed hash never matches.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                false
            }
        }
    }
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_ROUNDS)
    }
}
