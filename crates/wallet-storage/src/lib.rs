//! Durable token storage for the wallet auth subsystem.
//!
//! The encrypted key-value backend itself belongs to the surrounding
//! app; this crate defines the [`SecureStorage`] seam, the storage key
//! schema, and the [`AuthTokenStore`] that reads and writes
//! access/refresh token pairs per `(account, scope)` — including the
//! legacy unscoped read path for tokens issued before scoping existed.

mod keys;
mod token_store;
mod traits;

pub use keys::StorageKeys;
pub use token_store::AuthTokenStore;
pub use traits::SecureStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Platform-specific storage error
    #[error("platform storage error: {0}")]
    Platform(String),

    /// Key not found
    #[error("key not found: {0}")]
    NotFound(String),

    /// Encoding/decoding error
    #[error("encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
