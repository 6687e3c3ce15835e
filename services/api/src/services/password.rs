//! services/api/src/services/password.rs
//!
//! Argon2 password hashing. Hashes are stored in PHC string format.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use bookshelf_core::ports::{PortError, PortResult};
use tracing::error;
use zeroize::Zeroizing;

/// Hashes `password` with a fresh random salt. The plaintext is wiped when it
/// goes out of scope.
pub fn hash_password(password: Zeroizing<String>) -> PortResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            PortError::Unexpected("failed to hash password".to_string())
        })
}

/// Checks `password` against a stored PHC hash.
///
/// A malformed stored hash is an internal error, not a failed login.
pub fn verify_password(password: &str, hashed: &str) -> PortResult<bool> {
    let parsed = PasswordHash::new(hashed).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        PortError::Unexpected("stored password hash is malformed".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroize::Zeroize;

    fn secret(value: &str) -> Zeroizing<String> {
        Zeroizing::new(value.to_string())
    }

    #[test]
    fn zeroize_wipes_plaintext_buffer() {
        let mut plaintext = String::from("correct horse");
        plaintext.zeroize();
        assert!(plaintext.is_empty());

        let wrapped = secret("correct horse");
        let hashed = hash_password(wrapped.clone()).unwrap();
        assert!(verify_password(&wrapped, &hashed).unwrap());
    }

    #[test]
    fn hash_verifies_only_the_same_password() {
        let hashed = hash_password(secret("correct horse")).unwrap();
        assert!(hashed.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hashed).unwrap());
        assert!(!verify_password("wrong horse", &hashed).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password(secret("password1")).unwrap();
        let b = hash_password(secret("password1")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_is_unexpected() {
        assert!(matches!(
            verify_password("whatever", "not-a-phc-string"),
            Err(PortError::Unexpected(_))
        ));
    }
}
