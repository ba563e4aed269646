//! Customer directory: profiles and the accounts each customer owns.
//!
//! Business rules only (no IO, no storage). Account state itself lives behind
//! per-account locks in `ledgerly-accounts`; the directory only maps owners to
//! handles.

pub mod customer;
pub mod directory;

pub use customer::{Customer, CustomerProfile, ProfileError};
pub use directory::{AccountAlreadyOwned, CustomerDirectory, DirectoryError};
