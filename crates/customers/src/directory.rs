use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::{info, warn};

use ledgerly_accounts::{Account, AccountHandle, AccountKind, LedgerError};
use ledgerly_core::AccountId;

use crate::customer::Customer;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("no customer registered for '{0}'")]
    CustomerNotFound(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// An account offered to a customer is already held by another owner.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("account {0} already has an owner")]
pub struct AccountAlreadyOwned(pub AccountId);

/// Username → customer map.
///
/// Adding customers and attaching accounts take the write lock; enumeration
/// takes the read lock, so a reader never sees a half-added account.
#[derive(Debug, Default)]
pub struct CustomerDirectory {
    inner: RwLock<HashMap<String, Customer>>,
}

impl CustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `customer`, replacing any customer with the same username.
    ///
    /// Last write wins: the superseded customer (and its accounts) is dropped
    /// from the directory and returned.
    ///
    /// Every account has exactly one owner. A customer that brings an account
    /// already held by a different username, or the same account twice, is
    /// refused and the directory is left as it was.
    pub fn add_customer(&self, customer: Customer) -> Result<Option<Customer>, AccountAlreadyOwned> {
        let username = customer.username().to_string();
        let mut map = self.write();

        let mut incoming = HashSet::with_capacity(customer.accounts().len());
        for handle in customer.accounts() {
            let id = handle.id();
            let owned_elsewhere = map
                .values()
                .any(|other| other.username() != username && other.account(id).is_some());
            if !incoming.insert(id) || owned_elsewhere {
                warn!(username = %username, account_id = %id, "customer refused: account already owned");
                return Err(AccountAlreadyOwned(id));
            }
        }

        let previous = map.insert(username.clone(), customer);
        if let Some(old) = &previous {
            warn!(
                username = %username,
                dropped_accounts = old.accounts().len(),
                "customer profile superseded"
            );
        }
        Ok(previous)
    }

    /// Directory holding `customers`, added in order.
    pub fn from_customers(customers: impl IntoIterator<Item = Customer>) -> Result<Self, AccountAlreadyOwned> {
        let directory = Self::new();
        for customer in customers {
            directory.add_customer(customer)?;
        }
        Ok(directory)
    }

    pub fn find_by_username(&self, username: &str) -> Option<Customer> {
        self.read().get(username).cloned()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.read().contains_key(username)
    }

    /// Accounts owned by `username` in opening order; empty when unknown.
    pub fn accounts_of(&self, username: &str) -> Vec<AccountHandle> {
        self.read()
            .get(username)
            .map(|customer| customer.accounts().to_vec())
            .unwrap_or_default()
    }

    /// Open a new zero-balance account owned by `username`.
    pub fn open_account(&self, username: &str, kind: AccountKind) -> Result<AccountHandle, DirectoryError> {
        let mut map = self.write();
        let customer = map
            .get_mut(username)
            .ok_or_else(|| DirectoryError::CustomerNotFound(username.to_string()))?;

        let handle = AccountHandle::new(Account::open(kind)?);
        customer.push_account(handle.clone());
        info!(username, account_id = %handle.id(), kind = kind.as_str(), "account opened");
        Ok(handle)
    }

    /// Resolve `account_id` among the accounts owned by `username` only.
    pub fn find_account(&self, username: &str, account_id: AccountId) -> Option<AccountHandle> {
        self.read()
            .get(username)
            .and_then(|customer| customer.account(account_id).cloned())
    }

    /// Every customer, sorted by username.
    pub fn customers(&self) -> Vec<Customer> {
        let mut out: Vec<Customer> = self.read().values().cloned().collect();
        out.sort_by(|a, b| a.username().cmp(b.username()));
        out
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Customer>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Customer>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
