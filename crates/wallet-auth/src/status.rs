//! Shared auth-signature health status.
//!
//! A single handle is created at session start, injected into the token
//! manager (writer) and the availability-detection layer (reader), and
//! reset on sign-out. It is deliberately not a process-global.

use std::sync::Arc;
use tokio::sync::watch;

/// Whether the account's app auth signature currently authenticates
/// against f8e.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthSignatureStatus {
    Authenticated,
    Unauthenticated,
}

/// Cloneable handle around a `watch` channel holding the current status.
///
/// Writes are deduplicated: readers are only woken when the value
/// actually changes.
#[derive(Clone)]
pub struct AuthSignatureStatusHandle {
    tx: Arc<watch::Sender<AuthSignatureStatus>>,
}

impl AuthSignatureStatusHandle {
    /// Create a handle starting in the `Authenticated` state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthSignatureStatus::Authenticated);
        Self { tx: Arc::new(tx) }
    }

    /// Publish a new status.
    pub fn set(&self, status: AuthSignatureStatus) {
        self.tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                tracing::info!(?status, "auth signature status changed");
                *current = status;
                true
            }
        });
    }

    /// Current status.
    pub fn get(&self) -> AuthSignatureStatus {
        *self.tx.borrow()
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthSignatureStatus> {
        self.tx.subscribe()
    }

    /// Reset to the initial `Authenticated` state (sign-out path).
    pub fn reset(&self) {
        self.set(AuthSignatureStatus::Authenticated);
    }
}

impl Default for AuthSignatureStatusHandle {
    fn default() -> Self {
        Self::new()
    }
}
