//! Rotation protocol types.

use wallet_core::{AuthKeySet, Signature};

/// Durable record of an in-progress key-rotation attempt.
///
/// This is the single source of truth for resuming a rotation after a
/// process restart; in-memory state is never authoritative.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RotationAttemptState {
    /// No rotation in progress.
    NoAttempt,
    /// A rotation has been recommended; no keys generated yet.
    ProposalWritten,
    /// New keys are durably recorded. The rotation may or may not have
    /// reached the server.
    KeysWritten(AuthKeySet),
}

impl RotationAttemptState {
    /// Read-only view for external observers; `None` when no attempt
    /// exists.
    pub fn pending(&self) -> Option<PendingAuthKeyRotationAttempt> {
        match self {
            RotationAttemptState::NoAttempt => None,
            RotationAttemptState::ProposalWritten => Some(PendingAuthKeyRotationAttempt::Proposed),
            RotationAttemptState::KeysWritten(keys) => {
                Some(PendingAuthKeyRotationAttempt::Incomplete(keys.clone()))
            }
        }
    }
}

/// Externally observable pending rotation attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PendingAuthKeyRotationAttempt {
    /// A rotation has been recommended but not started.
    Proposed,
    /// A rotation was started with these keys and has not finished.
    Incomplete(AuthKeySet),
}

/// Input driving one run of the rotation protocol.
#[derive(Clone, Debug)]
pub enum RotationRequest {
    /// Begin a fresh rotation: generate new app auth keys, record them
    /// durably, and submit them to the server. The hardware proof
    /// materials come from the hardware session that approved the
    /// rotation and cannot be re-derived after a restart.
    Start {
        /// Hardware signature over the account id.
        hw_signed_account_id: Signature,
        /// Proof of possession of the hardware key.
        hw_factor_proof_of_possession: Signature,
    },
    /// Continue an attempt whose keys are already durably recorded.
    Resume {
        new_keys: AuthKeySet,
    },
}

/// Terminal classification of one rotation run.
///
/// Retry payloads exist only on the retryable variants, so terminal
/// outcomes cannot be fed back into the coordinator by mistake.
#[must_use]
#[derive(Debug)]
pub enum RotationOutcome {
    /// The new keys are live on the server and finalized locally.
    Success,
    /// This attempt failed, but the rotation is already resolved
    /// (finalized or dismissed by an earlier pass); safe to drop.
    Acceptable,
    /// Transient failure; retry with the same request.
    Unexpected { retry: RotationRequest },
    /// The server rejected the new keys but still honors the old ones.
    /// A terminal business condition, not a bug: rotation cannot proceed
    /// from this device, and the caller must surface it for explicit
    /// acknowledgment rather than auto-retry.
    AccountLocked { retry: RotationRequest },
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_core::PublicKey;

    fn keys() -> AuthKeySet {
        AuthKeySet {
            global_auth_public_key: PublicKey::from("new-global"),
            recovery_auth_public_key: PublicKey::from("new-recovery"),
            hw_signed_global_key: None,
        }
    }

    #[test]
    fn no_attempt_has_no_pending_view() {
        assert_eq!(RotationAttemptState::NoAttempt.pending(), None);
    }

    #[test]
    fn proposal_maps_to_proposed() {
        assert_eq!(
            RotationAttemptState::ProposalWritten.pending(),
            Some(PendingAuthKeyRotationAttempt::Proposed)
        );
    }

    #[test]
    fn keys_written_maps_to_incomplete_with_keys() {
        assert_eq!(
            RotationAttemptState::KeysWritten(keys()).pending(),
            Some(PendingAuthKeyRotationAttempt::Incomplete(keys()))
        );
    }
}
