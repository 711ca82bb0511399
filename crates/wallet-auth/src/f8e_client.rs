//! REST client for the f8e authentication API.
//!
//! This module owns the wire-level operations the rest of the subsystem
//! consumes through the [`AuthenticationService`] trait:
//! challenge initiation and completion, refresh-token exchange, and
//! server-side auth key rotation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;
use wallet_core::{
    AccountAuthTokens, AccountId, AuthKeySet, AuthTokenScope, F8eEnvironment, PublicKey, Signature,
};

pub use reqwest::StatusCode;

/// Response bodies may echo request secrets, so errors and logs carry a
/// length+digest summary instead of the body itself.
fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Error type for f8e API operations.
#[derive(Error, Debug)]
pub enum F8eError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("f8e returned {status} ({body_summary})")]
    UnexpectedStatus {
        status: StatusCode,
        body_summary: String,
    },
}

impl F8eError {
    /// True when the server answered 404.
    ///
    /// On challenge initiation this means the submitted public key is
    /// not recognized for any account — a semantically distinct failure
    /// the authenticator maps to `SignatureMismatch`.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            F8eError::UnexpectedStatus { status, .. } if *status == StatusCode::NOT_FOUND
        )
    }
}

/// Server state returned by challenge initiation.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatedAuthChallenge {
    /// Challenge username to echo back on completion.
    pub username: String,
    /// Account the server resolved from the submitted public key.
    pub account_id: AccountId,
    /// Base64-encoded challenge bytes the caller must sign.
    pub challenge: String,
    /// Opaque server session for this challenge.
    pub session: String,
}

/// Request body for server-side auth key rotation.
#[derive(Debug, Clone, Serialize)]
pub struct RotateAuthKeysRequest {
    /// The candidate key set replacing the active one.
    pub new_auth_keys: AuthKeySet,
    /// The currently active global key being rotated out.
    pub old_global_auth_public_key: PublicKey,
    /// Hardware auth key of the account.
    pub hw_auth_public_key: PublicKey,
    /// Hardware signature over the account id.
    pub hw_signed_account_id: Signature,
    /// Proof of possession of the hardware key.
    pub hw_factor_proof_of_possession: Signature,
}

#[derive(Debug, Serialize)]
struct InitiateAuthRequest<'a> {
    public_key: &'a PublicKey,
    scope: AuthTokenScope,
}

#[derive(Debug, Serialize)]
struct CompleteAuthRequest<'a> {
    username: &'a str,
    challenge_response: &'a str,
    session: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshTokensRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthTokensResponse {
    access_token: String,
    refresh_token: String,
}

impl From<AuthTokensResponse> for AccountAuthTokens {
    fn from(response: AuthTokensResponse) -> Self {
        AccountAuthTokens {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        }
    }
}

/// The network operations this subsystem needs from f8e.
///
/// [`F8eClient`] is the production implementation; tests substitute
/// programmable fakes.
#[async_trait]
pub trait AuthenticationService: Send + Sync {
    /// Start an app-key challenge for `auth_public_key` at `scope`.
    async fn initiate_auth_challenge(
        &self,
        environment: &F8eEnvironment,
        auth_public_key: &PublicKey,
        scope: AuthTokenScope,
    ) -> Result<InitiatedAuthChallenge, F8eError>;

    /// Complete a challenge with the signature over its challenge bytes.
    async fn complete_auth_challenge(
        &self,
        environment: &F8eEnvironment,
        username: &str,
        signature: &Signature,
        session: &str,
    ) -> Result<AccountAuthTokens, F8eError>;

    /// Exchange a refresh token for a fresh token pair.
    async fn refresh_auth_tokens(
        &self,
        environment: &F8eEnvironment,
        refresh_token: &str,
    ) -> Result<AccountAuthTokens, F8eError>;

    /// Submit a rotated auth key set for the account.
    async fn rotate_auth_keys(
        &self,
        environment: &F8eEnvironment,
        account_id: &AccountId,
        request: &RotateAuthKeysRequest,
    ) -> Result<(), F8eError>;
}

/// REST client for the f8e authentication API.
#[derive(Clone, Default)]
pub struct F8eClient {
    http_client: reqwest::Client,
}

impl F8eClient {
    /// Create a new client. Environments are selected per call.
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }

    fn api_url(environment: &F8eEnvironment, path: &str) -> String {
        format!("{}{}", environment.base_url(), path)
    }

    async fn check_status(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<reqwest::Response, F8eError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let body_summary = summarize_response_body(&body);
        tracing::warn!(%status, %body_summary, operation, "f8e request failed");
        Err(F8eError::UnexpectedStatus {
            status,
            body_summary,
        })
    }
}

#[async_trait]
impl AuthenticationService for F8eClient {
    async fn initiate_auth_challenge(
        &self,
        environment: &F8eEnvironment,
        auth_public_key: &PublicKey,
        scope: AuthTokenScope,
    ) -> Result<InitiatedAuthChallenge, F8eError> {
        let url = Self::api_url(environment, "/api/authenticate");
        tracing::debug!(%url, %scope, "initiating auth challenge");

        let response = self
            .http_client
            .post(&url)
            .json(&InitiateAuthRequest {
                public_key: auth_public_key,
                scope,
            })
            .send()
            .await?;

        let response = Self::check_status(response, "initiate_auth_challenge").await?;
        Ok(response.json().await?)
    }

    async fn complete_auth_challenge(
        &self,
        environment: &F8eEnvironment,
        username: &str,
        signature: &Signature,
        session: &str,
    ) -> Result<AccountAuthTokens, F8eError> {
        let url = Self::api_url(environment, "/api/authenticate/tokens");
        tracing::debug!(%url, "completing auth challenge");

        let response = self
            .http_client
            .post(&url)
            .json(&CompleteAuthRequest {
                username,
                challenge_response: signature.as_str(),
                session,
            })
            .send()
            .await?;

        let response = Self::check_status(response, "complete_auth_challenge").await?;
        let tokens: AuthTokensResponse = response.json().await?;
        Ok(tokens.into())
    }

    async fn refresh_auth_tokens(
        &self,
        environment: &F8eEnvironment,
        refresh_token: &str,
    ) -> Result<AccountAuthTokens, F8eError> {
        let url = Self::api_url(environment, "/api/authenticate/tokens");
        tracing::debug!(%url, "refreshing auth tokens");

        let response = self
            .http_client
            .post(&url)
            .json(&RefreshTokensRequest { refresh_token })
            .send()
            .await?;

        let response = Self::check_status(response, "refresh_auth_tokens").await?;
        let tokens: AuthTokensResponse = response.json().await?;
        Ok(tokens.into())
    }

    async fn rotate_auth_keys(
        &self,
        environment: &F8eEnvironment,
        account_id: &AccountId,
        request: &RotateAuthKeysRequest,
    ) -> Result<(), F8eError> {
        let url = Self::api_url(
            environment,
            &format!("/api/accounts/{}/authentication-keys", account_id),
        );
        tracing::debug!(%url, account_id = %account_id, "submitting rotated auth keys");

        let response = self.http_client.post(&url).json(request).send().await?;

        Self::check_status(response, "rotate_auth_keys").await?;
        Ok(())
    }
}
