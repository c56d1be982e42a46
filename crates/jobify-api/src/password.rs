//! Password hashing with Argon2id.
//!
//! Hashing is CPU bound, so both operations run on the blocking pool.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use uuid::Uuid;

use crate::config::ConfigError;
use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct Passwords {
    params: Params,
}

impl Passwords {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, ConfigError> {
        let params = Params::new(memory_kib, iterations, 1, None).map_err(|e| ConfigError::Invalid {
            name: "PASSWORD_MEMORY_KIB/PASSWORD_ITERATIONS",
            value: e.to_string(),
        })?;
        Ok(Self { params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password into a PHC string.
    pub async fn hash(&self, password: &str) -> ApiResult<String> {
        let hasher = self.hasher();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
                .map_err(|e| ApiError::internal(format!("Failed to build salt: {}", e)))?;
            hasher
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
        })
        .await
        .map_err(|e| ApiError::internal(format!("Hashing task failed: {}", e)))?
    }

    /// Check a plaintext password against a stored PHC string.
    ///
    /// An unparseable stored hash is an internal error, not a mismatch.
    pub async fn verify(&self, password: &str, stored: &str) -> ApiResult<bool> {
        let hasher = self.hasher();
        let password = password.to_owned();
        let stored = stored.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&stored)
                .map_err(|e| ApiError::internal(format!("Stored password hash is invalid: {}", e)))?;
            Ok(hasher.verify_password(password.as_bytes(), &parsed).is_ok())
        })
        .await
        .map_err(|e| ApiError::internal(format!("Hashing task failed: {}", e)))?
    }
}
