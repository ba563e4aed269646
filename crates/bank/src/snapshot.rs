//! Snapshot codec: the full in-memory state as one self-consistent value.
//!
//! A snapshot is handed to an external store as an opaque blob. Encoding is
//! versioned JSON; decoding only checks the shape; every invariant is checked
//! again when a snapshot is restored, and a restore either builds the whole
//! state or nothing.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledgerly_accounts::{Account, AccountHandle, AccountKind, RestoreError, Transaction};
use ledgerly_auth::{AuthConfig, Credential, CredentialError, CredentialStore};
use ledgerly_core::AccountId;
use ledgerly_customers::{AccountAlreadyOwned, Customer, CustomerDirectory, CustomerProfile, ProfileError};

/// Current snapshot format.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("unsupported snapshot format version {0}")]
    UnsupportedVersion(u32),

    #[error(transparent)]
    InvalidCredential(#[from] CredentialError),

    #[error("customer '{username}' has no credential")]
    MissingCredential { username: String },

    #[error("customer '{0}' appears more than once")]
    DuplicateCustomer(String),

    #[error("customer '{username}' has an invalid profile: {source}")]
    InvalidProfile { username: String, source: ProfileError },

    #[error("account {0} appears more than once")]
    DuplicateAccount(AccountId),

    #[error("account {account_id} has an inconsistent history: {source}")]
    InconsistentHistory { account_id: AccountId, source: RestoreError },

    #[error("snapshot could not be encoded: {0}")]
    Encode(String),

    #[error("snapshot could not be decoded: {0}")]
    Decode(String),
}

/// Point-in-time copy of credentials, customers, accounts and histories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub taken_at: DateTime<Utc>,
    /// Sorted by username.
    pub credentials: Vec<Credential>,
    /// Sorted by username.
    pub customers: Vec<CustomerRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub username: String,
    pub profile: CustomerProfile,
    /// In opening order.
    pub accounts: Vec<AccountRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub kind: AccountKind,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub history: Vec<Transaction>,
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id(),
            kind: account.kind(),
            balance: account.balance(),
            created_at: account.created_at(),
            history: account.history().to_vec(),
        }
    }
}

impl AccountRecord {
    fn restore(self) -> Result<Account, SnapshotError> {
        let account_id = self.id;
        Account::from_parts(self.id, self.kind, self.balance, self.history, self.created_at)
            .map_err(|source| SnapshotError::InconsistentHistory { account_id, source })
    }
}

impl Snapshot {
    /// Snapshot of nothing.
    pub fn empty() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            taken_at: Utc::now(),
            credentials: Vec::new(),
            customers: Vec::new(),
        }
    }

    /// Copy the live stores.
    ///
    /// Callers must exclude concurrent mutation for the copy to be a single
    /// point in time; each account is locked only while it is copied.
    pub(crate) fn capture(credentials: &CredentialStore, directory: &CustomerDirectory) -> Self {
        let customers = directory
            .customers()
            .into_iter()
            .map(|customer| CustomerRecord {
                username: customer.username().to_string(),
                profile: customer.profile().clone(),
                accounts: customer
                    .accounts()
                    .iter()
                    .map(|handle| AccountRecord::from(&*handle.lock()))
                    .collect(),
            })
            .collect();

        Self {
            format_version: FORMAT_VERSION,
            taken_at: Utc::now(),
            credentials: credentials.export(),
            customers,
        }
    }

    pub fn account_count(&self) -> usize {
        self.customers.iter().map(|c| c.accounts.len()).sum()
    }

    pub fn encode(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn decode(blob: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(blob).map_err(|e| SnapshotError::Decode(e.to_string()))
    }

    /// Validate everything and build fresh stores from this snapshot.
    pub(crate) fn restore(self, auth: AuthConfig) -> Result<(CredentialStore, CustomerDirectory), SnapshotError> {
        if self.format_version != FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.format_version));
        }

        let credentials = CredentialStore::from_credentials(auth, self.credentials)?;

        let mut usernames = HashSet::with_capacity(self.customers.len());
        let mut account_ids = HashSet::new();
        let mut customers = Vec::with_capacity(self.customers.len());

        for record in self.customers {
            if !usernames.insert(record.username.clone()) {
                return Err(SnapshotError::DuplicateCustomer(record.username));
            }
            if !credentials.contains(&record.username) {
                return Err(SnapshotError::MissingCredential { username: record.username });
            }
            // Profiles are revalidated: deserialization skips the constructor.
            let profile = CustomerProfile::new(
                record.profile.display_name(),
                record.profile.contact_address(),
            )
            .map_err(|source| SnapshotError::InvalidProfile {
                username: record.username.clone(),
                source,
            })?;

            let mut accounts = Vec::with_capacity(record.accounts.len());
            for account in record.accounts {
                if !account_ids.insert(account.id) {
                    return Err(SnapshotError::DuplicateAccount(account.id));
                }
                accounts.push(AccountHandle::new(account.restore()?));
            }

            customers.push(Customer::with_accounts(record.username, profile, accounts));
        }

        let directory = CustomerDirectory::from_customers(customers)
            .map_err(|AccountAlreadyOwned(id)| SnapshotError::DuplicateAccount(id))?;
        Ok((credentials, directory))
    }
}
