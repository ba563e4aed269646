/// The identity a caller acts as after authenticating.
///
/// Only a successful `register` or `login` hands these out. Each one carries
/// the generation of the store that issued it, so an identity stops being
/// honored once that store is replaced (see [`CredentialStore::issued`]).
///
/// [`CredentialStore::issued`]: crate::CredentialStore::issued
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    username: String,
    issuer: u64,
}

impl Identity {
    pub(crate) fn new(username: impl Into<String>, issuer: u64) -> Self {
        Self {
            username: username.into(),
            issuer,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn issuer(&self) -> u64 {
        self.issuer
    }
}

impl core::fmt::Display for Identity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.username)
    }
}
