use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;
use tracing::warn;

use crate::shared::AppError;

/// Hashes a plaintext password with Argon2id and a random salt.
/// The salt is embedded in the returned PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            warn!(error = %e, "Failed to hash password");
            AppError::Internal
        })
}

/// Returns whether `password` matches the stored hash.
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(password_hash) {
        Ok(hash) => hash,
        Err(e) => {
            warn!(error = %e, "Stored password hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Verifies against a fixed hash and always returns false.
/// Used when no account matches, so a miss costs one full verification.
pub fn verify_dummy_password(password: &str) -> bool {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    if let Some(hash) = DUMMY_HASH.get_or_init(|| hash_password("no-such-account").ok()) {
        verify_password(password, hash);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("mySecurePassword123").unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("mySecurePassword123").unwrap();
        assert!(verify_password("mySecurePassword123", &hash));
        assert!(!verify_password("wrongPassword", &hash));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hash1 = hash_password("mySecurePassword123").unwrap();
        let hash2 = hash_password("mySecurePassword123").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_dummy_verification_never_matches() {
        assert!(!verify_dummy_password("no-such-account"));
        assert!(!verify_dummy_password("anything"));
    }
}
