//! Transfer engine: one withdraw leg and one deposit leg as a single step.
//!
//! ```text
//! validate amount / distinct ids
//!   ↓
//! lock both accounts in ascending id order
//!   ↓
//! preview withdraw (source) + preview deposit (destination)
//!   ↓
//! commit withdraw, commit deposit
//!   ↓
//! release locks, then notify
//! ```
//!
//! Both legs are checked before either is committed, so a rejected transfer
//! leaves both accounts untouched and a committed withdraw is always followed
//! by its deposit.

use thiserror::Error;
use tracing::{debug, error};

use ledgerly_accounts::{AccountHandle, LedgerError, Transaction, lock_ordered};
use ledgerly_core::{AccountId, Money, is_positive_amount};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("transfer amount must be positive")]
    InvalidAmount,

    #[error("source and destination are the same account")]
    SameAccount,

    /// Either account is missing or not owned by the caller.
    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    /// The failing leg's ledger error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Checks that need no account state.
pub(crate) fn precheck(from: AccountId, to: AccountId, amount: Money) -> Result<(), TransferError> {
    if !is_positive_amount(amount) {
        return Err(TransferError::InvalidAmount);
    }
    if from == to {
        return Err(TransferError::SameAccount);
    }
    Ok(())
}

/// The two transaction records a committed transfer produced.
#[derive(Debug, Clone)]
pub(crate) struct TransferLegs {
    pub withdrawal: Transaction,
    pub deposit: Transaction,
}

/// Move `amount` from `from` to `to` holding both account locks throughout.
pub(crate) fn execute(
    from: &AccountHandle,
    to: &AccountHandle,
    amount: Money,
) -> Result<TransferLegs, TransferError> {
    precheck(from.id(), to.id(), amount)?;

    let (mut source, mut destination) = lock_ordered(from, to);

    source.preview_withdraw(amount)?;
    destination.preview_deposit(amount)?;

    source.withdraw(amount)?;
    if let Err(e) = destination.deposit(amount) {
        // The withdraw leg is already committed; continuing would leave the
        // pair inconsistent.
        error!(
            from = %from.id(),
            to = %to.id(),
            amount = %amount,
            error = %e,
            "transfer deposit leg failed after committed withdraw"
        );
        std::process::abort();
    }

    let (Some(withdrawal), Some(deposit)) = (source.last_transaction(), destination.last_transaction()) else {
        error!(from = %from.id(), to = %to.id(), "transfer committed without transaction records");
        std::process::abort();
    };

    debug!(
        from = %from.id(),
        to = %to.id(),
        amount = %amount,
        "transfer committed"
    );

    Ok(TransferLegs {
        withdrawal: withdrawal.clone(),
        deposit: deposit.clone(),
    })
}
