//! Authentication error taxonomy.
//!
//! Deliberately coarse but actionable: callers match exhaustively and
//! each variant prescribes a different recovery. Lower-level transport,
//! storage, and signing errors are wrapped here at the point they cross
//! into this subsystem's public operations; no raw `reqwest` or storage
//! error reaches a caller.

use crate::f8e_client::F8eError;
use thiserror::Error;
use wallet_storage::StorageError;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Transport-level failure talking to f8e; retry unchanged.
    #[error("network error: {0}")]
    Network(#[source] F8eError),

    /// Local signing/crypto failure; the key material could not produce
    /// a valid response and must not be blindly retried.
    #[error("auth protocol error: {0}")]
    Protocol(String),

    /// The server does not recognize the submitted key for this account.
    #[error("server rejected the authentication key")]
    SignatureMismatch,

    /// Storage error; retry unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// No active, onboarding, or recovering account to authenticate as.
    #[error("no account available to authenticate")]
    AccountMissing,

    /// Anything outside the taxonomy above.
    #[error("unhandled auth error: {0}")]
    Unhandled(String),
}

impl AuthError {
    /// True when retrying the same operation unchanged is reasonable.
    ///
    /// `Protocol` and `SignatureMismatch` mean the key material itself
    /// is invalid for the account, so a retry with the same key cannot
    /// succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, AuthError::Network(_) | AuthError::Storage(_))
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
