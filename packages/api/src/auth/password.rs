//! # Password hashing and verification — Argon2id
//!
//! - [`hash_password`] generates a random salt via [`OsRng`], hashes the plaintext with
//!   the default Argon2id parameters and returns a PHC-format string
//!   (`$argon2id$v=19$m=19456,t=2,p=1$...`), stored in `users.password_hash`.
//! - [`verify_password`] parses a PHC string and checks a plaintext against it:
//!   `Ok(true)` on match, `Ok(false)` on mismatch, `Err` if the stored hash is malformed.
//!
//! Hashing is deliberately slow, so handlers call the `_blocking` variants, which run
//! the work on Tokio's blocking pool instead of an executor thread.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{ApiError, ApiResult};

/// A well-formed hash with the default parameters that no password matches. Checking
/// against it costs the same as checking a real user's hash.
const UNKNOWN_USER_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$GkaABVh+PE1/woQwcHMYGA$\
    pIUSVQFPYskx8jKrosxmXaqtJcsnwJAfCLB1oZ/iUPI";

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("Invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn hash_password_blocking(password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

pub async fn verify_password_blocking(password: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

/// Runs a full verification for a sign-in whose user does not exist, so the response
/// takes as long as a wrong password would. Always `false`.
pub async fn verify_unknown_user_blocking(password: String) -> ApiResult<bool> {
    verify_password_blocking(password, UNKNOWN_USER_HASH.to_string()).await
}
