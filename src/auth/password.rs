use std::sync::OnceLock;

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

// Hash checked when the login email is unknown, at the same cost as stored hashes
static ABSENT_USER_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, BcryptError> {
    hash(password, cost)
}

/// Verify a plaintext password against a stored hash.
///
/// An unparseable stored hash counts as a mismatch.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    match verify(password, hashed) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Stored password hash could not be verified: {}", e);
            false
        }
    }
}

/// Run a full bcrypt check for a login whose email matched no user.
///
/// Always `false`; the work done matches `verify_password` on a real hash.
pub fn verify_absent_user(password: &str) -> bool {
    let hashed = ABSENT_USER_HASH.get_or_init(|| hash_password("absent-user-placeholder").ok());
    if let Some(hashed) = hashed {
        let _ = verify(password, hashed);
    }
    false
}
