//! Collaborator seams consumed during rotation finalize.
//!
//! Implementations live in the surrounding app; this crate only depends
//! on the contracts. Everything called from finalize must be idempotent,
//! because a failed finalize is retried wholesale via `Resume`.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;
use wallet_core::{AuthKeySet, Keybox, PublicKey};
use wallet_storage::StorageResult;

/// Persists the account's active keybox locally.
pub trait KeyboxStore: Send + Sync {
    /// Replace the active keybox. Re-writing an identical keybox is a
    /// safe no-op.
    fn set_active_keybox(&self, keybox: &Keybox) -> StorageResult<()>;
}

/// Error type for app auth key generation.
#[derive(Error, Debug)]
#[error("key generation failed: {0}")]
pub struct KeygenError(pub String);

/// Generates a fresh pair of app auth keys.
///
/// Backed by the app's keystore; the private halves never pass through
/// this subsystem.
pub trait AppAuthKeyGenerator: Send + Sync {
    fn generate_auth_keys(&self) -> Result<AuthKeySet, KeygenError>;
}

/// Error type for endorsement regeneration.
#[derive(Error, Debug)]
#[error("endorsement regeneration failed: {0}")]
pub struct EndorsementError(pub String);

/// Re-issues endorsement certificates for the account's trusted
/// contacts after an auth key rotation.
#[async_trait]
pub trait TrustedContactEndorser: Send + Sync {
    /// Re-derive endorsement certificates for every existing trusted
    /// contact, binding them to the rotated keybox. Must be idempotent:
    /// endorsing an already-endorsed contact set again is a no-op.
    async fn regenerate_endorsements(
        &self,
        keybox: &Keybox,
        old_global_auth_key: &PublicKey,
    ) -> Result<(), EndorsementError>;
}

/// Cloud backup upload failure.
///
/// The split is load-bearing: finalize continues past `Ignorable`
/// failures and aborts on `Fatal` ones.
#[derive(Error, Debug)]
pub enum BackupError {
    /// A failure the rotation may proceed past, e.g. the cloud account
    /// is signed out on this device and backup will catch up later.
    #[error("ignorable backup failure: {0}")]
    Ignorable(String),

    /// Any other failure.
    #[error("backup failure: {0}")]
    Fatal(String),
}

impl BackupError {
    /// True when finalize may log this failure and continue.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, BackupError::Ignorable(_))
    }
}

/// Serializes and uploads a cloud backup of the account.
#[async_trait]
pub trait CloudBackupUploader: Send + Sync {
    async fn create_and_upload(&self, keybox: &Keybox) -> Result<(), BackupError>;
}

/// Swallow ignorable backup failures, propagate fatal ones.
pub fn continue_on_ignorable(result: Result<(), BackupError>) -> Result<(), BackupError> {
    match result {
        Err(err) if err.is_ignorable() => {
            warn!(error = %err, "continuing past ignorable backup failure");
            Ok(())
        }
        other => other,
    }
}
