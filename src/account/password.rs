/// Password hashing and password policy
use crate::error::{CatalogError, CatalogResult};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use validator::ValidationError;

const MIN_LENGTH: usize = 8;
const SPECIAL_CHARS: &str = "!$#()[]{}?+*~@^&-_";

/// Hash a password into an Argon2id PHC string
pub fn hash_password(password: &str) -> CatalogResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CatalogError::internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored PHC string
pub fn verify_password(password: &str, hash: &str) -> CatalogResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| CatalogError::internal(format!("Stored password hash is invalid: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CatalogError::internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Password policy used by request validation
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_LENGTH {
        return Err(policy_error(format!(
            "password must be at least {} characters long",
            MIN_LENGTH
        )));
    }

    let required: [(&str, fn(char) -> bool); 4] = [
        ("lowercase character", |c| c.is_ascii_lowercase()),
        ("uppercase character", |c| c.is_ascii_uppercase()),
        ("digit", |c| c.is_ascii_digit()),
        ("special character", |c| SPECIAL_CHARS.contains(c)),
    ];

    for (name, predicate) in required {
        if !password.chars().any(predicate) {
            return Err(policy_error(format!(
                "password must contain at least one {}",
                name
            )));
        }
    }

    Ok(())
}

fn policy_error(message: String) -> ValidationError {
    ValidationError::new("password").with_message(message.into())
}
