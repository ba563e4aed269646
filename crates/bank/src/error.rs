use thiserror::Error;

use ledgerly_accounts::LedgerError;
use ledgerly_auth::RegisterError;
use ledgerly_core::AccountId;
use ledgerly_customers::{AccountAlreadyOwned, DirectoryError, ProfileError};

/// Why registering a new customer failed. Nothing is created on error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OnboardingError {
    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Register(#[from] RegisterError),

    #[error(transparent)]
    Ownership(#[from] AccountAlreadyOwned),
}

/// Account-scoped operation failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("no customer profile for '{0}'")]
    CustomerNotFound(String),

    /// The account does not exist or is not owned by the caller.
    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<DirectoryError> for BankError {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::CustomerNotFound(username) => BankError::CustomerNotFound(username),
            DirectoryError::Ledger(e) => BankError::Ledger(e),
        }
    }
}
