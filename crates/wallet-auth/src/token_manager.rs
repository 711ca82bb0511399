//! Cached token access and the two-tier refresh path.

use crate::authenticator::ChallengeAuthenticator;
use crate::discovery::AuthKeyDiscovery;
use crate::error::{AuthError, AuthResult};
use crate::f8e_client::AuthenticationService;
use crate::status::{AuthSignatureStatus, AuthSignatureStatusHandle};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wallet_core::{AccountAuthTokens, AccountId, AppVariant, AuthTokenScope, F8eEnvironment};
use wallet_storage::{AuthTokenStore, StorageError};

/// Manages the lifecycle of per-scope auth token pairs.
///
/// Reads serve from [`AuthTokenStore`]; [`AuthTokenManager::refresh`]
/// exchanges the cached refresh token first and only falls back to the
/// full challenge protocol when the exchange is rejected. Refresh tokens
/// expire independently of the signing key's validity, so
/// unconditionally re-authenticating would be needlessly expensive and
/// would mask server-side refresh bugs.
pub struct AuthTokenManager {
    token_store: AuthTokenStore,
    service: Arc<dyn AuthenticationService>,
    authenticator: ChallengeAuthenticator,
    discovery: Arc<dyn AuthKeyDiscovery>,
    status: AuthSignatureStatusHandle,
    app_variant: AppVariant,
}

impl AuthTokenManager {
    /// Create a token manager.
    ///
    /// `status` is the session-wide auth-signature health handle; the
    /// manager is its sole writer.
    pub fn new(
        token_store: AuthTokenStore,
        service: Arc<dyn AuthenticationService>,
        authenticator: ChallengeAuthenticator,
        discovery: Arc<dyn AuthKeyDiscovery>,
        status: AuthSignatureStatusHandle,
        app_variant: AppVariant,
    ) -> Self {
        Self {
            token_store,
            service,
            authenticator,
            discovery,
            status,
            app_variant,
        }
    }

    /// Cached token pair for `(account, scope)`, if any.
    pub fn get_tokens(
        &self,
        account_id: &AccountId,
        scope: AuthTokenScope,
    ) -> AuthResult<Option<AccountAuthTokens>> {
        Ok(self.token_store.get(account_id, scope)?)
    }

    /// Persist a token pair obtained elsewhere (e.g. onboarding).
    pub fn set_tokens(
        &self,
        account_id: &AccountId,
        scope: AuthTokenScope,
        tokens: &AccountAuthTokens,
    ) -> AuthResult<()> {
        Ok(self.token_store.set(account_id, scope, tokens)?)
    }

    /// Obtain a fresh token pair for `(account, scope)`.
    ///
    /// Tier one exchanges the cached refresh token. On rejection, tier
    /// two re-runs the full challenge protocol with the key resolved by
    /// discovery — and publishes auth-signature health: `Authenticated`
    /// when the key still signs in, `Unauthenticated` when the server
    /// rejects it. With no resolvable key the fallback is impossible and
    /// the result is [`AuthError::AccountMissing`].
    pub async fn refresh(
        &self,
        environment: &F8eEnvironment,
        account_id: &AccountId,
        scope: AuthTokenScope,
    ) -> AuthResult<AccountAuthTokens> {
        // Discovery absence is tolerated here: a refresh token can still
        // be valid without locally resolvable account state.
        let app_auth_key = self.discovery.auth_public_key(account_id, scope)?;

        let cached = self.token_store.get(account_id, scope)?.ok_or_else(|| {
            AuthError::Storage(StorageError::NotFound(format!(
                "no cached tokens for {account_id} ({scope})"
            )))
        })?;

        match self
            .service
            .refresh_auth_tokens(environment, &cached.refresh_token)
            .await
        {
            Ok(tokens) => {
                debug!(account_id = %account_id, %scope, "refresh token exchange succeeded");
                self.token_store.set(account_id, scope, &tokens)?;
                Ok(tokens)
            }
            Err(err) => {
                warn!(
                    account_id = %account_id,
                    %scope,
                    error = %err,
                    "refresh token rejected, falling back to key authentication"
                );

                let Some(key) = app_auth_key else {
                    return Err(AuthError::AccountMissing);
                };

                match self
                    .authenticator
                    .authenticate_with_key(environment, &key, scope)
                    .await
                {
                    Ok(authenticated) => {
                        self.status.set(AuthSignatureStatus::Authenticated);
                        if authenticated.account_id != *account_id {
                            warn!(
                                requested = %account_id,
                                resolved = %authenticated.account_id,
                                "server resolved a different account for the auth key"
                            );
                        }
                        self.token_store.set(account_id, scope, &authenticated.tokens)?;
                        info!(account_id = %account_id, %scope, "re-authenticated with app key");
                        Ok(authenticated.tokens)
                    }
                    Err(AuthError::SignatureMismatch) => {
                        self.status.set(AuthSignatureStatus::Unauthenticated);
                        Err(AuthError::SignatureMismatch)
                    }
                    Err(other) => Err(other),
                }
            }
        }
    }

    /// Wipe every stored token for the account.
    ///
    /// Only available outside customer builds.
    pub fn clear(&self, account_id: &AccountId) -> AuthResult<()> {
        if !self.app_variant.allows_wipe() {
            return Err(AuthError::Unhandled(
                "token wipe is not available in customer builds".to_string(),
            ));
        }

        self.token_store.clear(account_id)?;
        info!(account_id = %account_id, "stored tokens wiped");
        Ok(())
    }
}
