//! Banking context: wires credentials, customers and accounts together.
//!
//! `Bank` is the explicit store object every caller goes through. It owns
//! the transfer engine, the snapshot codec and the notification hook; the
//! crates it composes stay free of cross-cutting concerns.

pub mod bank;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod transfer;


pub use bank::Bank;
pub use config::BankConfig;
pub use error::{BankError, OnboardingError};
pub use snapshot::{AccountRecord, CustomerRecord, FORMAT_VERSION, Snapshot, SnapshotError};
pub use transfer::TransferError;
