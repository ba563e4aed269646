use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledgerly_accounts::AccountHandle;
use ledgerly_core::AccountId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("display name must not be blank")]
    BlankDisplayName,

    #[error("contact address must not be blank when given")]
    BlankContactAddress,
}

/// Display details attached to a customer.
///
/// The contact address is optional; when present only non-blankness is
/// checked, never its syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    display_name: String,
    contact_address: Option<String>,
}

impl CustomerProfile {
    pub fn new(display_name: &str, contact_address: Option<&str>) -> Result<Self, ProfileError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ProfileError::BlankDisplayName);
        }
        let contact_address = match contact_address.map(str::trim) {
            Some("") => return Err(ProfileError::BlankContactAddress),
            other => other.map(str::to_string),
        };
        Ok(Self {
            display_name: display_name.to_string(),
            contact_address,
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn contact_address(&self) -> Option<&str> {
        self.contact_address.as_deref()
    }
}

/// A customer: one credential (by username), a profile and owned accounts.
///
/// Accounts keep insertion order. Cloning a customer shares the account
/// handles, not the account data.
#[derive(Debug, Clone)]
pub struct Customer {
    username: String,
    profile: CustomerProfile,
    accounts: Vec<AccountHandle>,
}

impl Customer {
    pub fn new(username: impl Into<String>, profile: CustomerProfile) -> Self {
        Self::with_accounts(username, profile, Vec::new())
    }

    /// Customer already holding `accounts`; ownership is checked when it is
    /// added to a directory.
    pub fn with_accounts(
        username: impl Into<String>,
        profile: CustomerProfile,
        accounts: Vec<AccountHandle>,
    ) -> Self {
        Self {
            username: username.into(),
            profile,
            accounts,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn profile(&self) -> &CustomerProfile {
        &self.profile
    }

    pub fn accounts(&self) -> &[AccountHandle] {
        &self.accounts
    }

    pub fn account(&self, id: AccountId) -> Option<&AccountHandle> {
        self.accounts.iter().find(|handle| handle.id() == id)
    }

    pub(crate) fn push_account(&mut self, handle: AccountHandle) {
        self.accounts.push(handle);
    }
}
