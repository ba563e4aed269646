//! Shared, individually locked account handles.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ledgerly_core::{AccountId, Money};

use crate::account::{Account, LedgerError};

/// Cloneable reference to one account behind its own lock.
///
/// The id is immutable, so it is cached outside the lock and can be compared
/// without contention. Every clone refers to the same account.
#[derive(Debug, Clone)]
pub struct AccountHandle {
    id: AccountId,
    inner: Arc<Mutex<Account>>,
}

impl AccountHandle {
    pub fn new(account: Account) -> Self {
        Self {
            id: account.id(),
            inner: Arc::new(Mutex::new(account)),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Exclusive access to the account.
    ///
    /// A poisoned lock is recovered: mutations validate before they write and
    /// cannot panic half-way, so the guarded account is always consistent.
    pub fn lock(&self) -> MutexGuard<'_, Account> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn deposit(&self, amount: Money) -> Result<Money, LedgerError> {
        self.lock().deposit(amount)
    }

    pub fn withdraw(&self, amount: Money) -> Result<Money, LedgerError> {
        self.lock().withdraw(amount)
    }

    pub fn apply_interest(&self) -> Result<Option<Money>, LedgerError> {
        self.lock().apply_interest()
    }

    pub fn balance(&self) -> Money {
        self.lock().balance()
    }

    /// Deep copy of the account as of now.
    pub fn snapshot(&self) -> Account {
        self.lock().clone()
    }

    /// Whether both handles refer to the same underlying account.
    pub fn same_account(&self, other: &AccountHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Lock two distinct accounts in ascending id order.
///
/// Guards are returned in argument order. Acquiring in id order gives every
/// caller the same global order, so opposite-direction transfers between the
/// same pair cannot deadlock.
///
/// Callers must pass two different accounts; locking one account twice would
/// block forever.
pub fn lock_ordered<'a>(
    first: &'a AccountHandle,
    second: &'a AccountHandle,
) -> (MutexGuard<'a, Account>, MutexGuard<'a, Account>) {
    debug_assert!(!first.same_account(second), "lock_ordered on a single account");

    if first.id() <= second.id() {
        let a = first.lock();
        let b = second.lock();
        (a, b)
    } else {
        let b = second.lock();
        let a = first.lock();
        (a, b)
    }
}
