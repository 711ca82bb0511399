//! App-key challenge/response login against f8e.

use crate::error::{AuthError, AuthResult};
use crate::f8e_client::AuthenticationService;
use crate::signer::MessageSigner;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;
use tracing::{debug, info};
use wallet_core::{AccountAuthTokens, AccountId, AuthTokenScope, F8eEnvironment, PublicKey, Signature};

/// Result of a successful challenge authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    /// Account the server resolved from the submitted key.
    pub account_id: AccountId,
    /// Freshly issued token pair for the requested scope.
    pub tokens: AccountAuthTokens,
}

/// Performs the app-key challenge/response protocol.
///
/// Also the narrow primitive used to *validate* that a key pair still
/// authenticates — a successful run proves the server honors the key;
/// `SignatureMismatch` proves it does not. This type never writes
/// tokens; callers persist the result.
pub struct ChallengeAuthenticator {
    service: Arc<dyn AuthenticationService>,
    signer: Arc<dyn MessageSigner>,
}

impl ChallengeAuthenticator {
    /// Create an authenticator over the given service and signer.
    pub fn new(service: Arc<dyn AuthenticationService>, signer: Arc<dyn MessageSigner>) -> Self {
        Self { service, signer }
    }

    /// Authenticate with an app auth key at the given scope.
    ///
    /// Protocol: initiate a challenge for the key, sign the challenge
    /// bytes with the matching private key, complete the challenge for
    /// a fresh token pair. An HTTP 404 on initiation means the server
    /// does not recognize this key for any account and maps to
    /// [`AuthError::SignatureMismatch`]; signing failures map to
    /// [`AuthError::Protocol`]; everything else is
    /// [`AuthError::Network`].
    pub async fn authenticate_with_key(
        &self,
        environment: &F8eEnvironment,
        auth_public_key: &PublicKey,
        scope: AuthTokenScope,
    ) -> AuthResult<AuthenticatedAccount> {
        debug!(key = %auth_public_key, %scope, "initiating auth challenge");

        let initiated = self
            .service
            .initiate_auth_challenge(environment, auth_public_key, scope)
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    AuthError::SignatureMismatch
                } else {
                    AuthError::Network(err)
                }
            })?;

        let challenge_bytes = BASE64
            .decode(initiated.challenge.as_bytes())
            .map_err(|err| AuthError::Protocol(format!("challenge is not valid base64: {err}")))?;

        let signature = self
            .signer
            .sign(auth_public_key, &challenge_bytes)
            .map_err(|err| AuthError::Protocol(err.to_string()))?;

        let tokens = self
            .service
            .complete_auth_challenge(environment, &initiated.username, &signature, &initiated.session)
            .await
            .map_err(AuthError::Network)?;

        info!(account_id = %initiated.account_id, %scope, "auth challenge completed");

        Ok(AuthenticatedAccount {
            account_id: initiated.account_id,
            tokens,
        })
    }

    /// Complete a challenge with a signature produced out-of-band.
    ///
    /// Used when the device already holds a signature over the challenge
    /// (e.g. produced by embedded secure hardware); skips initiation and
    /// signing. The account id doubles as the challenge username.
    pub async fn authenticate_with_signature(
        &self,
        environment: &F8eEnvironment,
        account_id: &AccountId,
        session: &str,
        signature: &Signature,
    ) -> AuthResult<AccountAuthTokens> {
        debug!(account_id = %account_id, "completing auth challenge with external signature");

        self.service
            .complete_auth_challenge(environment, account_id.as_str(), signature, session)
            .await
            .map_err(AuthError::Network)
    }
}
