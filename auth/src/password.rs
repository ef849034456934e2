//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=...`), so the cost
//! parameters travel with each hash and can be raised without invalidating
//! existing accounts.

use crate::config::PasswordConfig;
use crate::error::{AuthError, Result};
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version};
use eventhub_core::validation::validate_password;

/// Enforce the password length policy.
///
/// # Errors
///
/// Returns [`AuthError::WeakPassword`] describing the violated bound.
pub fn check_strength(password: &str) -> Result<()> {
    validate_password(password).map_err(|e| AuthError::WeakPassword(e.to_string()))
}

/// Hashes and verifies passwords.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    config: PasswordConfig,
}

impl PasswordHasher {
    /// Create a hasher with the given cost parameters.
    #[must_use]
    pub const fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.config.memory_kib,
            self.config.iterations,
            self.config.parallelism,
            None,
        )
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash `password` with a random 128-bit salt.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Hashing`] if the configured parameters are invalid.
    pub fn hash(&self, password: &str) -> Result<String> {
        use argon2::PasswordHasher as _;

        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check `password` against a stored PHC string.
    ///
    /// Returns `Ok(false)` on mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Hashing`] if `stored` is not a valid PHC string.
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored).map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(self
            .argon2()?
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Burn roughly the same time as a real verification.
    ///
    /// Used when the email is unknown so login latency does not reveal
    /// which accounts exist.
    pub fn verify_dummy(&self, password: &str) {
        if let Ok(hash) = self.hash("dummy-password-for-timing") {
            let _ = self.verify(password, &hash);
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(PasswordConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(PasswordConfig::insecure_fast())
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hasher().hash("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher().verify("correct horse battery", &hash).unwrap());
        assert!(!hasher().verify("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hasher().hash("same password").unwrap();
        let b = hasher().hash("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_corrupt_hash_is_error() {
        assert!(matches!(
            hasher().verify("pw", "not-a-phc-string"),
            Err(AuthError::Hashing(_))
        ));
    }

    #[test]
    fn test_check_strength() {
        assert!(check_strength("longenough").is_ok());
        assert!(matches!(check_strength("short"), Err(AuthError::WeakPassword(_))));
    }

    #[test]
    fn test_invalid_params_is_error() {
        let bad = PasswordHasher::new(PasswordConfig::insecure_fast().with_iterations(0));
        assert!(bad.hash("password").is_err());
    }
}
