//! End-to-end orchestration of the auth key rotation protocol.

use crate::attempt_store::RotationAttemptStore;
use crate::collaborators::{
    continue_on_ignorable, AppAuthKeyGenerator, BackupError, CloudBackupUploader, EndorsementError,
    KeyboxStore, TrustedContactEndorser,
};
use crate::types::{
    PendingAuthKeyRotationAttempt, RotationAttemptState, RotationOutcome, RotationRequest,
};
use crate::RotationStoreError;
use futures_util::stream::{self, Stream};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use wallet_auth::{
    AuthError, AuthenticationService, ChallengeAuthenticator, RotateAuthKeysRequest,
};
use wallet_core::{AccountId, AuthKeySet, AuthTokenScope, F8eEnvironment, Keybox, PublicKey};
use wallet_storage::StorageError;

/// Failure inside the finalize phase. Private: every variant surfaces to
/// callers as `RotationOutcome::Unexpected`.
#[derive(Debug, thiserror::Error)]
enum FinalizeError {
    #[error("keybox persistence failed: {0}")]
    Keybox(#[from] StorageError),

    #[error(transparent)]
    Endorsement(#[from] EndorsementError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error("attempt record cleanup failed: {0}")]
    Store(#[from] RotationStoreError),
}

/// Orchestrates the multi-phase, crash-resumable auth key rotation
/// protocol.
///
/// Durability comes first at every step: candidate keys are persisted
/// before the server hears about them, so a crash anywhere in the
/// protocol resumes from [`RotationAttemptStore`] as a
/// [`RotationRequest::Resume`]. The server's synchronous answer to the
/// rotate call is never trusted; whether keys are live is decided by
/// authenticating with them.
pub struct KeyRotationCoordinator {
    attempt_store: Arc<RotationAttemptStore>,
    service: Arc<dyn AuthenticationService>,
    authenticator: Arc<ChallengeAuthenticator>,
    key_generator: Arc<dyn AppAuthKeyGenerator>,
    keybox_store: Arc<dyn KeyboxStore>,
    endorser: Arc<dyn TrustedContactEndorser>,
    backup: Arc<dyn CloudBackupUploader>,
    /// One guard per account: two concurrent rotation runs for the same
    /// account would race on the persisted candidate key set.
    account_locks: std::sync::Mutex<HashMap<AccountId, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyRotationCoordinator {
    /// Create a coordinator over the given store and collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        attempt_store: Arc<RotationAttemptStore>,
        service: Arc<dyn AuthenticationService>,
        authenticator: Arc<ChallengeAuthenticator>,
        key_generator: Arc<dyn AppAuthKeyGenerator>,
        keybox_store: Arc<dyn KeyboxStore>,
        endorser: Arc<dyn TrustedContactEndorser>,
        backup: Arc<dyn CloudBackupUploader>,
    ) -> Self {
        Self {
            attempt_store,
            service,
            authenticator,
            key_generator,
            keybox_store,
            endorser,
            backup,
            account_locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Record that a rotation should be offered to the user.
    pub fn recommend_key_rotation(&self) -> Result<(), RotationStoreError> {
        self.attempt_store.set_proposal()
    }

    /// Drop a proposed (not yet started) rotation.
    pub fn dismiss_proposed_rotation_attempt(&self) -> Result<(), RotationStoreError> {
        self.attempt_store.clear_proposal()
    }

    /// Observe the pending rotation attempt until it resolves.
    ///
    /// Emits the current view immediately, then re-reads after each
    /// committed store change rather than polling. The stream terminates
    /// after emitting `None` (attempt finalized, dismissed, or never
    /// existed). The underlying signal is last-value-wins: a subscriber
    /// that misses an intermediate value sees the current one on its
    /// next check.
    pub fn observe_pending_until_null(
        &self,
    ) -> impl Stream<Item = Option<PendingAuthKeyRotationAttempt>> {
        let rx = self.attempt_store.observe();

        stream::unfold((rx, true, false), |(mut rx, first, done)| async move {
            if done {
                return None;
            }
            if !first && rx.changed().await.is_err() {
                // Store dropped; nothing further can be observed.
                return None;
            }

            let pending = rx.borrow_and_update().pending();
            let done = pending.is_none();
            Some((pending, (rx, false, done)))
        })
    }

    /// Run the rotation protocol to a terminal classification.
    ///
    /// Holds the account's rotation guard for the whole run.
    pub async fn start_or_resume(
        &self,
        keybox: &Keybox,
        request: RotationRequest,
    ) -> RotationOutcome {
        let guard = self.account_lock(&keybox.account_id);
        let _held = guard.lock().await;

        info!(account_id = %keybox.account_id, "starting or resuming auth key rotation");

        // Phase 1: make sure the candidate keys are durably recorded and
        // the server has been told about them.
        let new_keys = match self.ensure_submitted(keybox, request).await {
            Ok(Some(new_keys)) => new_keys,
            Ok(None) => return RotationOutcome::Acceptable,
            Err(outcome) => return outcome,
        };

        // Phase 2: the keys are live iff they authenticate.
        let new_keys_valid = match self
            .keys_authenticate(
                &keybox.environment,
                &new_keys.global_auth_public_key,
                &new_keys.recovery_auth_public_key,
            )
            .await
        {
            Ok(valid) => valid,
            Err(err) => {
                warn!(error = %err, "could not validate new auth keys");
                return RotationOutcome::Unexpected {
                    retry: RotationRequest::Resume { new_keys },
                };
            }
        };

        if !new_keys_valid {
            return self.classify_rejected_keys(keybox, new_keys).await;
        }

        // Phase 4: the new keys are live; finish locally.
        match self.finalize(keybox, &new_keys).await {
            Ok(()) => RotationOutcome::Success,
            Err(err) => {
                warn!(error = %err, "rotation finalize failed");
                RotationOutcome::Unexpected {
                    retry: RotationRequest::Resume { new_keys },
                }
            }
        }
    }

    /// Phase 1. Returns the candidate key set to validate, `None` when
    /// the attempt turns out to be already resolved, or a terminal
    /// outcome on failure.
    async fn ensure_submitted(
        &self,
        keybox: &Keybox,
        request: RotationRequest,
    ) -> Result<Option<AuthKeySet>, RotationOutcome> {
        match request {
            RotationRequest::Start {
                hw_signed_account_id,
                hw_factor_proof_of_possession,
            } => {
                let new_keys = match self.key_generator.generate_auth_keys() {
                    Ok(keys) => keys,
                    Err(err) => {
                        warn!(error = %err, "app auth key generation failed");
                        return Err(RotationOutcome::Unexpected {
                            retry: RotationRequest::Start {
                                hw_signed_account_id,
                                hw_factor_proof_of_possession,
                            },
                        });
                    }
                };

                // Durability before the network: a crash from here on
                // resumes as an incomplete attempt instead of losing a
                // key set the server may already honor.
                if let Err(err) = self.attempt_store.set_keys_written(&new_keys) {
                    warn!(error = %err, "failed to persist candidate key set");
                    return Err(RotationOutcome::Unexpected {
                        retry: RotationRequest::Start {
                            hw_signed_account_id,
                            hw_factor_proof_of_possession,
                        },
                    });
                }

                let rotate_request = RotateAuthKeysRequest {
                    new_auth_keys: new_keys.clone(),
                    old_global_auth_public_key: keybox.auth_keys.global_auth_public_key.clone(),
                    hw_auth_public_key: keybox.hw_auth_public_key.clone(),
                    hw_signed_account_id,
                    hw_factor_proof_of_possession,
                };

                // Best effort: validation below decides what actually
                // happened server-side.
                if let Err(err) = self
                    .service
                    .rotate_auth_keys(&keybox.environment, &keybox.account_id, &rotate_request)
                    .await
                {
                    warn!(error = %err, "server rotate call failed, proceeding to validation");
                }

                Ok(Some(new_keys))
            }
            RotationRequest::Resume { new_keys } => {
                match self.attempt_store.pending_attempt() {
                    Ok(RotationAttemptState::KeysWritten(recorded)) if recorded == new_keys => {
                        Ok(Some(new_keys))
                    }
                    Ok(_) => {
                        // Finalized or dismissed by an earlier pass.
                        info!("no matching pending attempt; rotation already resolved");
                        Ok(None)
                    }
                    Err(err) => {
                        warn!(error = %err, "could not read pending attempt record");
                        Err(RotationOutcome::Unexpected {
                            retry: RotationRequest::Resume { new_keys },
                        })
                    }
                }
            }
        }
    }

    /// Phase 3: the new keys were rejected; what the old keys do decides
    /// between a locked account and a transient failure.
    async fn classify_rejected_keys(
        &self,
        keybox: &Keybox,
        new_keys: AuthKeySet,
    ) -> RotationOutcome {
        let old_keys_valid = match self
            .keys_authenticate(
                &keybox.environment,
                &keybox.auth_keys.global_auth_public_key,
                &keybox.auth_keys.recovery_auth_public_key,
            )
            .await
        {
            Ok(valid) => valid,
            Err(err) => {
                warn!(error = %err, "could not validate old auth keys");
                return RotationOutcome::Unexpected {
                    retry: RotationRequest::Resume { new_keys },
                };
            }
        };

        if old_keys_valid {
            // The server still honors the old keys but rejected the new
            // ones. Nothing this device can safely retry on its own;
            // clear the record so nobody auto-resumes into the same
            // wall.
            warn!(account_id = %keybox.account_id, "server rejected new keys but honors old keys");
            if let Err(err) = self.attempt_store.clear() {
                warn!(error = %err, "failed to clear attempt record");
            }
            RotationOutcome::AccountLocked {
                retry: RotationRequest::Resume { new_keys },
            }
        } else {
            RotationOutcome::Unexpected {
                retry: RotationRequest::Resume { new_keys },
            }
        }
    }

    /// Authenticate with both keys of a set, each at its own scope.
    ///
    /// `Ok(false)` means the server (or local signing) rejected the key
    /// material itself; transport and storage failures propagate.
    async fn keys_authenticate(
        &self,
        environment: &F8eEnvironment,
        global: &PublicKey,
        recovery: &PublicKey,
    ) -> Result<bool, AuthError> {
        let checks = [
            (global, AuthTokenScope::Global),
            (recovery, AuthTokenScope::Recovery),
        ];

        for (key, scope) in checks {
            match self
                .authenticator
                .authenticate_with_key(environment, key, scope)
                .await
            {
                Ok(_) => {}
                Err(AuthError::SignatureMismatch) | Err(AuthError::Protocol(_)) => {
                    return Ok(false)
                }
                Err(other) => return Err(other),
            }
        }

        Ok(true)
    }

    /// Phase 4: persist the rotated keybox, re-endorse trusted contacts,
    /// best-effort backup, clear the attempt record.
    ///
    /// Not atomic across sub-steps; every sub-step is idempotent so a
    /// failed run is safely repeated via `Resume`.
    async fn finalize(&self, keybox: &Keybox, new_keys: &AuthKeySet) -> Result<(), FinalizeError> {
        let rotated = keybox.with_auth_keys(new_keys.clone());

        self.keybox_store.set_active_keybox(&rotated)?;

        self.endorser
            .regenerate_endorsements(&rotated, &keybox.auth_keys.global_auth_public_key)
            .await?;

        continue_on_ignorable(self.backup.create_and_upload(&rotated).await)?;

        self.attempt_store.clear()?;

        info!(account_id = %keybox.account_id, "auth key rotation finalized");
        Ok(())
    }

    fn account_lock(&self, account_id: &AccountId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.account_locks.lock().expect("lock poisoned");
        locks.entry(account_id.clone()).or_default().clone()
    }
}
