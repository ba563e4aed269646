//! Password policy and salted key derivation (Argon2id).

use argon2::password_hash::Output;
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes.
pub const HASH_LEN: usize = 32;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("key derivation failed: {0}")]
pub struct KdfError(String);

impl From<argon2::Error> for KdfError {
    fn from(e: argon2::Error) -> Self {
        Self(e.to_string())
    }
}

/// Password policy: at least 8 characters with one uppercase letter, one
/// lowercase letter and one digit. No other character class is required.
pub fn meets_password_policy(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(char::is_uppercase)
        && password.chars().any(char::is_lowercase)
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Argon2id cost parameters.
///
/// Construct through [`KdfParams::new`] so invalid combinations are rejected up
/// front and derivation only fails on programming errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    memory_kib: u32,
    iterations: u32,
    lanes: u32,
}

impl Default for KdfParams {
    /// Argon2id with 19 MiB, 2 passes, 1 lane.
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            lanes: Params::DEFAULT_P_COST,
        }
    }
}

impl KdfParams {
    pub fn new(memory_kib: u32, iterations: u32, lanes: u32) -> Result<Self, KdfError> {
        let candidate = Self {
            memory_kib,
            iterations,
            lanes,
        };
        candidate.argon2_params()?;
        Ok(candidate)
    }

    /// Minimal cost, for tests and benchmarks only.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            lanes: Params::MIN_P_COST,
        }
    }

    pub fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn lanes(&self) -> u32 {
        self.lanes
    }

    fn argon2_params(&self) -> Result<Params, KdfError> {
        Ok(Params::new(
            self.memory_kib,
            self.iterations,
            self.lanes,
            Some(HASH_LEN),
        )?)
    }

    /// Derive the password hash for `salt`.
    pub fn derive(&self, password: &str, salt: &[u8]) -> Result<[u8; HASH_LEN], KdfError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.argon2_params()?);
        let mut key = [0u8; HASH_LEN];
        argon2.hash_password_into(password.as_bytes(), salt, &mut key)?;
        Ok(key)
    }
}

/// Fresh random salt from the OS CSPRNG.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Compare two derived keys in constant time.
///
/// `Output` equality is constant-time in the key bytes; keys with a malformed
/// length never match.
pub fn hashes_match(candidate: &[u8], stored: &[u8]) -> bool {
    match (Output::new(candidate), Output::new(stored)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
