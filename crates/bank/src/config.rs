//! Bank configuration.

use std::str::FromStr;

use tracing::warn;

use ledgerly_accounts::INTEREST_SCALE;
use ledgerly_auth::{AuthConfig, DEFAULT_MAX_ATTEMPTS, KdfParams};

pub const ENV_MAX_LOGIN_ATTEMPTS: &str = "LEDGERLY_MAX_LOGIN_ATTEMPTS";
pub const ENV_KDF_MEMORY_KIB: &str = "LEDGERLY_KDF_MEMORY_KIB";
pub const ENV_KDF_ITERATIONS: &str = "LEDGERLY_KDF_ITERATIONS";
pub const ENV_KDF_LANES: &str = "LEDGERLY_KDF_LANES";
pub const ENV_INTEREST_SCALE: &str = "LEDGERLY_INTEREST_SCALE";

/// Tunables for one [`Bank`](crate::Bank) instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankConfig {
    /// Consecutive failed logins before a username is locked.
    pub max_login_attempts: u32,
    /// Password key-derivation cost.
    pub kdf: KdfParams,
    /// Decimal places savings interest is rounded to.
    pub interest_scale: u32,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: DEFAULT_MAX_ATTEMPTS,
            kdf: KdfParams::default(),
            interest_scale: INTEREST_SCALE,
        }
    }
}

impl BankConfig {
    pub fn with_max_login_attempts(mut self, attempts: u32) -> Self {
        self.max_login_attempts = attempts;
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn with_interest_scale(mut self, scale: u32) -> Self {
        self.interest_scale = scale;
        self
    }

    /// Defaults overridden by `LEDGERLY_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns per variable name.
    ///
    /// Values that do not parse (or a KDF combination Argon2 rejects) are
    /// ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(attempts) = parse_var(&lookup, ENV_MAX_LOGIN_ATTEMPTS) {
            config.max_login_attempts = attempts;
        }
        if let Some(scale) = parse_var(&lookup, ENV_INTEREST_SCALE) {
            config.interest_scale = scale;
        }

        let memory = parse_var(&lookup, ENV_KDF_MEMORY_KIB).unwrap_or(config.kdf.memory_kib());
        let iterations = parse_var(&lookup, ENV_KDF_ITERATIONS).unwrap_or(config.kdf.iterations());
        let lanes = parse_var(&lookup, ENV_KDF_LANES).unwrap_or(config.kdf.lanes());
        match KdfParams::new(memory, iterations, lanes) {
            Ok(kdf) => config.kdf = kdf,
            Err(e) => warn!(memory, iterations, lanes, error = %e, "ignoring KDF overrides"),
        }

        config
    }

    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            max_attempts: self.max_login_attempts,
            kdf: self.kdf,
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable configuration value");
            None
        }
    }
}
