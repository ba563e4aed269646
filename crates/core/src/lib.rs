//! `ledgerly-core`: shared banking primitives.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod money;

pub use error::DomainError;
pub use id::{AccountId, TransactionId};
pub use money::{Money, is_positive_amount};
