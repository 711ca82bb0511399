//! Crash-resumable auth key rotation.
//!
//! ## Non-negotiable principles
//!
//! - **SQLite is the only durable store** for the attempt record; the
//!   watch value observers subscribe to is derived after commit
//! - **Candidate keys are persisted before the server hears about
//!   them** — a crash never loses a key set that might already be live
//! - **The server's synchronous rotate answer is never trusted**;
//!   whether keys are live is decided by authenticating with them
//! - **Recovery emits nothing** — reopening the store notifies nobody
//!
//! ## Protocol
//!
//! ```text
//! Start ──► persist keys ──► submit (best effort) ──► validate new keys
//! Resume ─────────────────────────────────────────────┘         │
//!                                                      valid    │ invalid
//!                                                        │      ▼
//!                                                        │   validate old keys
//!                                                        ▼      │ valid: AccountLocked
//!                                                    finalize   │ invalid: Unexpected
//!                                                        │
//!                                                     Success
//! ```

mod attempt_store;
mod collaborators;
mod coordinator;
mod types;

#[cfg(test)]
mod tests;

pub use attempt_store::RotationAttemptStore;
pub use collaborators::{
    continue_on_ignorable, AppAuthKeyGenerator, BackupError, CloudBackupUploader,
    EndorsementError, KeyboxStore, KeygenError, TrustedContactEndorser,
};
pub use coordinator::KeyRotationCoordinator;
pub use types::{
    PendingAuthKeyRotationAttempt, RotationAttemptState, RotationOutcome, RotationRequest,
};

/// Errors that can occur in the rotation attempt store.
#[derive(Debug, thiserror::Error)]
pub enum RotationStoreError {
    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Key-set (de)serialization error.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The persisted record is unreadable.
    #[error("corrupt rotation attempt record: {0}")]
    Corrupt(String),
}
