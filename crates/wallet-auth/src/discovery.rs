//! Account/recovery discovery seam.

use wallet_core::{AccountId, AuthTokenScope, PublicKey};
use wallet_storage::StorageResult;

/// Resolves the auth public key currently relevant for an account and
/// scope, given whatever active/onboarding/recovering account state
/// exists locally.
///
/// `Ok(None)` means no account applies. That is not an error at this
/// seam: a cached refresh token can outlive locally resolvable account
/// state (e.g. mid-onboarding), and the token manager decides what
/// absence means for each operation.
pub trait AuthKeyDiscovery: Send + Sync {
    /// Resolve the current auth public key for `(account, scope)`.
    fn auth_public_key(
        &self,
        account_id: &AccountId,
        scope: AuthTokenScope,
    ) -> StorageResult<Option<PublicKey>>;
}
