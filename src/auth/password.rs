//! Password hashing using Argon2id.
//!
//! The cost is fixed: 19 MiB of memory, 2 iterations, 1 lane, with a random
//! 16-byte salt per hash. Hashes are stored as PHC strings so the parameters
//! travel with the digest. Verification is constant-time in the digest
//! comparison.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::OnceLock;
use thiserror::Error;

const MEMORY_COST_KIB: u32 = 19_456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

/// Hashed once and reused when the looked-up user does not exist, so a
/// missing account costs the same as a wrong password.
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),

    #[error("stored password hash is unreadable: {0}")]
    Parse(argon2::password_hash::Error),

    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(PasswordError::Params)?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id.
///
/// # Errors
/// Returns an error if the hasher cannot be built or hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(PasswordError::Hash)?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// # Errors
/// Returns an error only if the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(PasswordError::Parse)?;

    Ok(hasher()?
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// A valid hash of a throwaway value, computed with the production cost.
///
/// # Errors
/// Returns an error if the first computation fails; later calls are cached.
pub fn dummy_hash() -> Result<&'static str, PasswordError> {
    if let Some(hash) = DUMMY_HASH.get() {
        return Ok(hash);
    }

    let hash = hash_password("sso-dummy-password")?;

    Ok(DUMMY_HASH.get_or_init(|| hash))
}
