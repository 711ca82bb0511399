//! Message signing seam.

use thiserror::Error;
use wallet_core::{PublicKey, Signature};

/// Error type for signing operations.
#[derive(Error, Debug)]
pub enum SignerError {
    /// No private key is available for the given public key
    #[error("no private key available for {0}")]
    KeyNotFound(PublicKey),

    /// The signing operation itself failed
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Produces signatures with the private key matching a given public key.
///
/// Implementations live outside this subsystem (app keystore, secure
/// hardware session); which private key is used — global vs recovery —
/// is selected by the public key handed in.
pub trait MessageSigner: Send + Sync {
    /// Sign `message` with the private key matching `public_key`.
    fn sign(&self, public_key: &PublicKey, message: &[u8]) -> Result<Signature, SignerError>;
}
