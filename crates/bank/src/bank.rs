//! The `Bank` context object.
//!
//! All state lives in one explicit value instead of process-wide maps, so
//! tests can run any number of isolated banks side by side.
//!
//! ## Locking
//!
//! - A store-wide `RwLock` guards the credential store and directory as a
//!   pair. Every operation holds its read side; `export` and `import` hold
//!   the write side, which gives point-in-time exports and all-or-nothing
//!   imports.
//! - Underneath, each account has its own mutex and each credential its own
//!   counter lock, so unrelated operations do not contend.
//! - Notifications are published after every account lock is released.
//!
//! ## Identities
//!
//! Account operations only honor an [`Identity`] issued by the current
//! credential store through `register` or `login`. Identities from another
//! bank, or from before an `import`, resolve to nothing.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use ledgerly_accounts::{Account, AccountHandle, AccountKind, Transaction, TransactionKind};
use ledgerly_auth::{CredentialStore, Identity, LoginError};
use ledgerly_core::{AccountId, Money};
use ledgerly_customers::{Customer, CustomerDirectory, CustomerProfile};
use ledgerly_events::{AccountNotification, EventBus, InMemoryEventBus, MovementKind, Subscription};

use crate::config::BankConfig;
use crate::error::{BankError, OnboardingError};
use crate::snapshot::{Snapshot, SnapshotError};
use crate::transfer::{self, TransferError};

#[derive(Debug)]
struct BankState {
    credentials: CredentialStore,
    directory: CustomerDirectory,
}

impl BankState {
    fn empty(config: &BankConfig) -> Self {
        Self {
            credentials: CredentialStore::new(config.auth()),
            directory: CustomerDirectory::new(),
        }
    }

    /// `owner` was issued by this state's credential store.
    fn honors(&self, owner: &Identity) -> bool {
        let issued = self.credentials.issued(owner);
        if !issued {
            warn!(owner = owner.username(), "identity not issued by the current credential store");
        }
        issued
    }

    fn resolve(&self, owner: &Identity, account_id: AccountId) -> Option<AccountHandle> {
        if !self.honors(owner) {
            return None;
        }
        self.directory.find_account(owner.username(), account_id)
    }
}

/// In-memory banking core.
///
/// Generic over the notification bus; defaults to the in-process
/// [`InMemoryEventBus`].
#[derive(Debug)]
pub struct Bank<B = InMemoryEventBus<AccountNotification>> {
    config: BankConfig,
    state: RwLock<BankState>,
    bus: B,
}

impl Bank {
    pub fn new(config: BankConfig) -> Self {
        Self::with_bus(config, InMemoryEventBus::new())
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::new(BankConfig::default())
    }
}

impl<B> Bank<B>
where
    B: EventBus<AccountNotification>,
{
    pub fn with_bus(config: BankConfig, bus: B) -> Self {
        Self {
            state: RwLock::new(BankState::empty(&config)),
            config,
            bus,
        }
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// Receive a notification for every committed balance change from now on.
    pub fn subscribe(&self) -> Subscription<AccountNotification> {
        self.bus.subscribe()
    }

    // ---- onboarding and authentication -------------------------------------

    /// Register a username with a customer profile.
    ///
    /// The profile is validated before the credential is created, so a
    /// rejected registration leaves nothing behind. The returned identity is
    /// already authenticated.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
        contact_address: Option<&str>,
    ) -> Result<Identity, OnboardingError> {
        let profile = CustomerProfile::new(display_name, contact_address)?;

        let state = self.read();
        let identity = state.credentials.register(username, password)?;
        state
            .directory
            .add_customer(Customer::new(identity.username(), profile))?;

        info!(username = identity.username(), "customer registered");
        Ok(identity)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<Identity, LoginError> {
        self.read().credentials.login(username, password)
    }

    /// Whether `username` is registered. Grants nothing.
    pub fn lookup(&self, username: &str) -> bool {
        self.read().credentials.contains(username)
    }

    pub fn profile(&self, owner: &Identity) -> Option<CustomerProfile> {
        let state = self.read();
        if !state.honors(owner) {
            return None;
        }
        state
            .directory
            .find_by_username(owner.username())
            .map(|customer| customer.profile().clone())
    }

    // ---- accounts -----------------------------------------------------------

    pub fn open_account(&self, owner: &Identity, kind: AccountKind) -> Result<AccountId, BankError> {
        let state = self.read();
        if !state.honors(owner) {
            return Err(BankError::CustomerNotFound(owner.username().to_string()));
        }
        let handle = state.directory.open_account(owner.username(), kind)?;
        Ok(handle.id())
    }

    /// Copies of the owner's accounts in opening order; empty when unknown.
    pub fn accounts_of(&self, owner: &Identity) -> Vec<Account> {
        let state = self.read();
        if !state.honors(owner) {
            return Vec::new();
        }
        state
            .directory
            .accounts_of(owner.username())
            .iter()
            .map(AccountHandle::snapshot)
            .collect()
    }

    /// Copy of one of the owner's accounts.
    pub fn account(&self, owner: &Identity, account_id: AccountId) -> Result<Account, BankError> {
        Ok(self.handle(owner, account_id)?.snapshot())
    }

    pub fn deposit(&self, owner: &Identity, account_id: AccountId, amount: Money) -> Result<Money, BankError> {
        let (balance, record) = {
            let state = self.read();
            let handle = resolve(&state, owner, account_id)?;
            let mut account = handle.lock();
            let balance = account.deposit(amount)?;
            (balance, account.last_transaction().cloned())
        };

        debug!(owner = owner.username(), account_id = %account_id, amount = %amount, "deposit committed");
        self.notify(owner, account_id, record.as_ref());
        Ok(balance)
    }

    pub fn withdraw(&self, owner: &Identity, account_id: AccountId, amount: Money) -> Result<Money, BankError> {
        let (balance, record) = {
            let state = self.read();
            let handle = resolve(&state, owner, account_id)?;
            let mut account = handle.lock();
            let balance = account.withdraw(amount)?;
            (balance, account.last_transaction().cloned())
        };

        debug!(owner = owner.username(), account_id = %account_id, amount = %amount, "withdrawal committed");
        self.notify(owner, account_id, record.as_ref());
        Ok(balance)
    }

    /// Credit savings interest; `Ok(None)` when there was nothing to credit.
    pub fn apply_interest(&self, owner: &Identity, account_id: AccountId) -> Result<Option<Money>, BankError> {
        let (balance, record) = {
            let state = self.read();
            let handle = resolve(&state, owner, account_id)?;
            let mut account = handle.lock();
            match account.apply_interest_with_scale(self.config.interest_scale)? {
                Some(balance) => (Some(balance), account.last_transaction().cloned()),
                None => (None, None),
            }
        };

        if balance.is_some() {
            debug!(owner = owner.username(), account_id = %account_id, "interest credited");
            self.notify(owner, account_id, record.as_ref());
        }
        Ok(balance)
    }

    /// Move `amount` between two accounts of the same owner.
    pub fn transfer(
        &self,
        owner: &Identity,
        from: AccountId,
        to: AccountId,
        amount: Money,
    ) -> Result<(), TransferError> {
        transfer::precheck(from, to, amount)?;

        let legs = {
            let state = self.read();
            let source = state
                .resolve(owner, from)
                .ok_or(TransferError::AccountNotFound(from))?;
            let destination = state
                .resolve(owner, to)
                .ok_or(TransferError::AccountNotFound(to))?;
            transfer::execute(&source, &destination, amount)?
        };

        info!(owner = owner.username(), from = %from, to = %to, amount = %amount, "transfer completed");
        self.notify(owner, from, Some(&legs.withdrawal));
        self.notify(owner, to, Some(&legs.deposit));
        Ok(())
    }

    // ---- snapshots ----------------------------------------------------------

    /// Consistent copy of the whole state.
    pub fn export(&self) -> Snapshot {
        let state = self.write();
        let snapshot = Snapshot::capture(&state.credentials, &state.directory);
        info!(
            customers = snapshot.customers.len(),
            accounts = snapshot.account_count(),
            "snapshot exported"
        );
        snapshot
    }

    /// Replace the whole state with `snapshot`; `None` resets to empty.
    ///
    /// The snapshot is validated in full before the swap. On error the live
    /// state is untouched.
    pub fn import(&self, snapshot: Option<Snapshot>) -> Result<(), SnapshotError> {
        let Some(snapshot) = snapshot else {
            *self.write() = BankState::empty(&self.config);
            info!("state reset by empty import");
            return Ok(());
        };

        let accounts = snapshot.account_count();
        let (credentials, directory) = snapshot.restore(self.config.auth())?;
        let customers = directory.len();
        *self.write() = BankState {
            credentials,
            directory,
        };

        info!(customers, accounts, "snapshot imported");
        Ok(())
    }

    // ---- internals ----------------------------------------------------------

    fn handle(&self, owner: &Identity, account_id: AccountId) -> Result<AccountHandle, BankError> {
        resolve(&self.read(), owner, account_id)
    }

    fn notify(&self, owner: &Identity, account_id: AccountId, record: Option<&Transaction>) {
        let Some(tx) = record else {
            return;
        };
        let notification = AccountNotification {
            account_id,
            owner: owner.username().to_string(),
            kind: match tx.kind() {
                TransactionKind::Deposit => MovementKind::Deposit,
                TransactionKind::Withdrawal => MovementKind::Withdrawal,
            },
            amount: tx.amount(),
            resulting_balance: tx.resulting_balance(),
            occurred_at: tx.timestamp(),
        };
        if let Err(e) = self.bus.publish(notification) {
            warn!(account_id = %account_id, error = %e, "notification publish failed");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BankState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BankState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn resolve(state: &BankState, owner: &Identity, account_id: AccountId) -> Result<AccountHandle, BankError> {
    state
        .resolve(owner, account_id)
        .ok_or(BankError::AccountNotFound(account_id))
}
