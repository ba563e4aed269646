//! Account ledger: balances, withdrawal policy and append-only history.
//!
//! Pure domain logic only: no IO, no persistence concerns. Cross-thread
//! exclusivity is provided by [`AccountHandle`], one lock per account.

pub mod account;
pub mod handle;
pub mod kind;
pub mod transaction;

pub use account::{Account, INTEREST_SCALE, LedgerError, ReplayError, RestoreError};
pub use handle::{AccountHandle, lock_ordered};
pub use kind::AccountKind;
pub use transaction::{Transaction, TransactionKind};
