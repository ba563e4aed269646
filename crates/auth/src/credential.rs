use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::password::{HASH_LEN, SALT_LEN};

/// Why a persisted credential was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("username must not be blank")]
    BlankUsername,

    #[error("credential for '{0}' has a malformed salt")]
    InvalidSalt(String),

    #[error("credential for '{0}' has a malformed password hash")]
    InvalidHash(String),

    #[error("duplicate credential for '{0}'")]
    DuplicateUsername(String),
}

/// Stored login secret for one username.
///
/// The username is the immutable identity key. `consecutive_failures` is the
/// only field that changes after registration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    username: String,
    salt: Vec<u8>,
    password_hash: Vec<u8>,
    consecutive_failures: u32,
}

impl Credential {
    pub(crate) fn new(username: String, salt: [u8; SALT_LEN], password_hash: [u8; HASH_LEN]) -> Self {
        Self {
            username,
            salt: salt.to_vec(),
            password_hash: password_hash.to_vec(),
            consecutive_failures: 0,
        }
    }

    /// Rebuild a persisted credential, checking the secret lengths.
    pub fn from_parts(
        username: String,
        salt: Vec<u8>,
        password_hash: Vec<u8>,
        consecutive_failures: u32,
    ) -> Result<Self, CredentialError> {
        let credential = Self {
            username,
            salt,
            password_hash,
            consecutive_failures,
        };
        credential.validate()?;
        Ok(credential)
    }

    /// Check shape invariants (used after deserialization).
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.username.trim().is_empty() {
            return Err(CredentialError::BlankUsername);
        }
        if self.salt.len() != SALT_LEN {
            return Err(CredentialError::InvalidSalt(self.username.clone()));
        }
        if self.password_hash.len() != HASH_LEN {
            return Err(CredentialError::InvalidHash(self.username.clone()));
        }
        Ok(())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn password_hash(&self) -> &[u8] {
        &self.password_hash
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub(crate) fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    pub(crate) fn reset_failures(&mut self) {
        self.consecutive_failures = 0;
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("salt", &"<redacted>")
            .field("password_hash", &"<redacted>")
            .field("consecutive_failures", &self.consecutive_failures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Credential {
        Credential::new("alice".to_string(), [1; SALT_LEN], [2; HASH_LEN])
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", sample());
        assert!(rendered.contains("alice"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("[1, 1"));
    }

    #[test]
    fn failure_counter_saturates_and_resets() {
        let mut c = Credential::from_parts("bob".into(), vec![0; SALT_LEN], vec![0; HASH_LEN], u32::MAX)
            .unwrap();
        c.record_failure();
        assert_eq!(c.consecutive_failures(), u32::MAX);
        c.reset_failures();
        assert_eq!(c.consecutive_failures(), 0);
    }

    #[test]
    fn from_parts_checks_lengths() {
        assert_eq!(
            Credential::from_parts("a".into(), vec![0; 3], vec![0; HASH_LEN], 0),
            Err(CredentialError::InvalidSalt("a".into()))
        );
        assert_eq!(
            Credential::from_parts("a".into(), vec![0; SALT_LEN], vec![0; 5], 0),
            Err(CredentialError::InvalidHash("a".into()))
        );
        assert_eq!(
            Credential::from_parts("  ".into(), vec![0; SALT_LEN], vec![0; HASH_LEN], 0),
            Err(CredentialError::BlankUsername)
        );
    }

    #[test]
    fn serde_round_trip_keeps_secrets() {
        let json = serde_json::to_string(&sample()).unwrap();
        let back: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }
}
