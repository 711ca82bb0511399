//! Authentication core for the wallet.
//!
//! This crate provides:
//! - REST client for the f8e authentication API
//! - App-key challenge/response login and key validation
//! - Cached token access with two-tier refresh (refresh token first,
//!   full re-authentication as fallback)
//! - Auth-signature health publishing for availability detection
//! - Collaborator seams for signing and account/recovery discovery

mod authenticator;
mod discovery;
mod error;
mod f8e_client;
mod signer;
mod status;
#[cfg(test)]
mod testing;
mod token_manager;

pub use authenticator::{AuthenticatedAccount, ChallengeAuthenticator};
pub use discovery::AuthKeyDiscovery;
pub use error::{AuthError, AuthResult};
pub use f8e_client::{
    AuthenticationService, F8eClient, F8eError, InitiatedAuthChallenge, RotateAuthKeysRequest,
    StatusCode,
};
pub use signer::{MessageSigner, SignerError};
pub use status::{AuthSignatureStatus, AuthSignatureStatusHandle};
pub use token_manager::AuthTokenManager;
