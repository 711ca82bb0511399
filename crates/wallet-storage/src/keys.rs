//! Storage key schema for auth tokens.

use wallet_core::{AccountId, AuthTokenScope};

/// Storage keys used by the token store.
///
/// Scope-qualified keys are the current schema. The unscoped legacy keys
/// predate token scoping and are read (never written) so that tokens
/// issued before the schema change keep working without a forced
/// re-authentication.
pub struct StorageKeys;

impl StorageKeys {
    /// Scope-qualified access token key: `accessToken.<account>.<scope>`
    pub fn access_token(account_id: &AccountId, scope: AuthTokenScope) -> String {
        format!("accessToken.{}.{}", account_id, scope.key_segment())
    }

    /// Scope-qualified refresh token key: `refreshToken.<account>.<scope>`
    pub fn refresh_token(account_id: &AccountId, scope: AuthTokenScope) -> String {
        format!("refreshToken.{}.{}", account_id, scope.key_segment())
    }

    /// Legacy unscoped access token key: `accessToken.<account>`
    pub fn legacy_access_token(account_id: &AccountId) -> String {
        format!("accessToken.{}", account_id)
    }

    /// Legacy unscoped refresh token key: `refreshToken.<account>`
    pub fn legacy_refresh_token(account_id: &AccountId) -> String {
        format!("refreshToken.{}", account_id)
    }
}
