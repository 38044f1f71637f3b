//! Argon2id password hashing and verification.
//!
//! Hashes are stored as PHC strings, so the cost parameters travel with each
//! hash and verification keeps working after the configured cost changes.

use crate::config::HashCost;
use crate::error::{AppError, AppResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

/// Minimum length accepted when a student sets a new password through a
/// reset link.
pub const MIN_RESET_PASSWORD_LEN: usize = 6;

fn hash_err(e: argon2::password_hash::Error) -> AppError {
    AppError::PasswordHash(e.to_string())
}

fn hasher(cost: HashCost) -> AppResult<Argon2<'static>> {
    let params = Params::new(cost.memory_kib, cost.iterations, 1, None)
        .map_err(|e| AppError::PasswordHash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn hash_password(password: &str, cost: HashCost) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher(cost)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(hash_err)?;
    Ok(hash.to_string())
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(hash_err)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(hash_err(e)),
    }
}

pub fn validate_reset_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_RESET_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_RESET_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
