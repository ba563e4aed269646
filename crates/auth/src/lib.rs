//! `ledgerly-auth`: credential store for registration, salted password
//! hashing and brute-force lockout.
//!
//! This crate is intentionally decoupled from any front end and from storage.

pub mod credential;
pub mod identity;
pub mod password;
pub mod store;

pub use credential::{Credential, CredentialError};
pub use identity::Identity;
pub use password::{HASH_LEN, KdfError, KdfParams, SALT_LEN, meets_password_policy};
pub use store::{AuthConfig, CredentialStore, DEFAULT_MAX_ATTEMPTS, LoginError, RegisterError};
