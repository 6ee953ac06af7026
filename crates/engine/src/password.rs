//! Password hashing with bcrypt.
//!
//! Stored hashes are the modular crypt strings produced by `bcrypt`
//! (`$2b$<cost>$<salt+digest>`), so the cost travels with each hash.

use crate::{EngineError, ResultEngine};

/// Hashes `password` with a fresh random salt.
pub(crate) fn hash_password(password: &str) -> ResultEngine<String> {
    if password.is_empty() {
        return Err(EngineError::InvalidInput(
            "password must not be empty".to_string(),
        ));
    }
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|err| EngineError::InvalidInput(format!("cannot hash password: {err}")))
}

/// Returns `true` if `password` matches `stored`. Malformed hashes never
/// match.
pub(crate) fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let stored = hash_password("demo").unwrap();
        assert!(stored.starts_with("$2b$"));
        assert!(verify_password("demo", &stored));
        assert!(!verify_password("Demo", &stored));
    }

    #[test]
    fn hash_carries_the_default_cost() {
        let stored = hash_password("demo").unwrap();
        let cost = format!("${:02}$", bcrypt::DEFAULT_COST);
        assert_eq!(&stored[3..7], cost);
    }

    #[test]
    fn same_password_gets_different_salts() {
        assert_ne!(hash_password("demo").unwrap(), hash_password("demo").unwrap());
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("demo", "demo"));
        assert!(!verify_password("demo", "$2b$12$short"));
        assert!(!verify_password("demo", "hmac-sha256$00$00"));
    }

    #[test]
    fn empty_password_is_rejected() {
        assert!(hash_password("").is_err());
    }
}
