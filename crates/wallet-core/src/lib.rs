//! Shared domain types for the wallet authentication subsystem.
//!
//! This crate holds the vocabulary every other crate in the workspace
//! speaks: account and key identifiers, token pairs, the active keybox,
//! f8e environment selection, and the logging bootstrap. It has no
//! network or storage behavior of its own.

pub mod logging;
mod types;

pub use types::{
    AccountAuthTokens, AccountId, AppVariant, AuthKeySet, AuthTokenScope, F8eEnvironment, Keybox,
    PublicKey, Signature,
};
