//! In-memory credential store with lockout.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::credential::{Credential, CredentialError};
use crate::identity::Identity;
use crate::password::{self, KdfError, KdfParams, SALT_LEN, meets_password_policy};

/// Consecutive failed logins after which a username is locked.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Salt for the throwaway derivation run on unknown usernames.
const UNKNOWN_USER_SALT: [u8; SALT_LEN] = [0u8; SALT_LEN];

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("username must not be blank")]
    InvalidUsername,

    #[error("username is already taken")]
    UsernameTaken,

    #[error("password must be at least 8 characters with upper case, lower case and a digit")]
    WeakPassword,

    #[error(transparent)]
    Kdf(#[from] KdfError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("account locked after too many failed attempts")]
    AccountLocked,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Kdf(#[from] KdfError),
}

/// Credential store configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthConfig {
    pub max_attempts: u32,
    pub kdf: KdfParams,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            kdf: KdfParams::default(),
        }
    }
}

type CredentialSlot = Arc<Mutex<Credential>>;

/// Username → credential map.
///
/// The map itself sits behind a `RwLock`; each credential has its own mutex so
/// a login's check-verify-update sequence is one atomic step per username
/// while logins for different usernames proceed in parallel.
///
/// Every store gets a process-unique generation that is stamped into the
/// identities it issues.
#[derive(Debug)]
pub struct CredentialStore {
    config: AuthConfig,
    generation: u64,
    credentials: RwLock<HashMap<String, CredentialSlot>>,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(AuthConfig::default())
    }
}

impl CredentialStore {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            generation: next_generation(),
            credentials: RwLock::new(HashMap::new()),
        }
    }

    /// Build a store from persisted credentials (all-or-nothing).
    pub fn from_credentials(
        config: AuthConfig,
        credentials: impl IntoIterator<Item = Credential>,
    ) -> Result<Self, CredentialError> {
        let mut map = HashMap::new();
        for credential in credentials {
            credential.validate()?;
            match map.entry(credential.username().to_string()) {
                Entry::Occupied(e) => return Err(CredentialError::DuplicateUsername(e.key().clone())),
                Entry::Vacant(e) => {
                    e.insert(Arc::new(Mutex::new(credential)));
                }
            }
        }
        Ok(Self {
            config,
            generation: next_generation(),
            credentials: RwLock::new(map),
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a new username.
    ///
    /// Checks run in order: blank username, duplicate username, password
    /// policy. The slow derivation runs without holding the map lock.
    pub fn register(&self, username: &str, password: &str) -> Result<Identity, RegisterError> {
        if username.trim().is_empty() {
            return Err(RegisterError::InvalidUsername);
        }
        if self.contains(username) {
            return Err(RegisterError::UsernameTaken);
        }
        if !meets_password_policy(password) {
            return Err(RegisterError::WeakPassword);
        }

        let salt = password::generate_salt();
        let hash = self.config.kdf.derive(password, &salt)?;

        let mut map = self.write_map();
        match map.entry(username.to_string()) {
            // Lost a race with a concurrent registration of the same name.
            Entry::Occupied(_) => Err(RegisterError::UsernameTaken),
            Entry::Vacant(e) => {
                e.insert(Arc::new(Mutex::new(Credential::new(username.to_string(), salt, hash))));
                info!(username, "credential registered");
                Ok(Identity::new(username, self.generation))
            }
        }
    }

    /// Authenticate `username`.
    ///
    /// A locked username is refused before the password is looked at, whether
    /// or not it is correct, and its counter is left untouched. Unknown
    /// usernames never create state but still pay for one derivation, so they
    /// take as long to reject as a wrong password.
    pub fn login(&self, username: &str, password: &str) -> Result<Identity, LoginError> {
        let Some(slot) = self.slot(username) else {
            let _ = self.config.kdf.derive(password, &UNKNOWN_USER_SALT);
            warn!(username, "login for unknown username");
            return Err(LoginError::InvalidCredentials);
        };
        let mut credential = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if credential.consecutive_failures() >= self.config.max_attempts {
            warn!(username, "login refused: account locked");
            return Err(LoginError::AccountLocked);
        }

        let candidate = self.config.kdf.derive(password, credential.salt())?;
        if password::hashes_match(&candidate, credential.password_hash()) {
            credential.reset_failures();
            info!(username, "login succeeded");
            Ok(Identity::new(username, self.generation))
        } else {
            credential.record_failure();
            warn!(
                username,
                failures = credential.consecutive_failures(),
                "login failed: wrong password"
            );
            Err(LoginError::InvalidCredentials)
        }
    }

    /// Whether `identity` came from this store and its username still exists.
    pub fn issued(&self, identity: &Identity) -> bool {
        identity.issuer() == self.generation && self.contains(identity.username())
    }

    /// Non-authenticating existence check.
    pub fn contains(&self, username: &str) -> bool {
        self.read_map().contains_key(username)
    }

    pub fn failed_attempts(&self, username: &str) -> Option<u32> {
        self.slot(username).map(|slot| {
            slot.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .consecutive_failures()
        })
    }

    pub fn is_locked(&self, username: &str) -> bool {
        self.failed_attempts(username)
            .is_some_and(|failures| failures >= self.config.max_attempts)
    }

    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every credential, sorted by username.
    pub fn export(&self) -> Vec<Credential> {
        let map = self.read_map();
        let mut out: Vec<Credential> = map
            .values()
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .collect();
        out.sort_by(|a, b| a.username().cmp(b.username()));
        debug!(count = out.len(), "credentials exported");
        out
    }

    fn slot(&self, username: &str) -> Option<CredentialSlot> {
        self.read_map().get(username).cloned()
    }

    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, CredentialSlot>> {
        self.credentials.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, CredentialSlot>> {
        self.credentials.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}
