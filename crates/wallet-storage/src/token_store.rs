//! Durable storage of access/refresh token pairs, keyed by
//! `(account, scope)`.

use crate::{SecureStorage, StorageKeys, StorageResult};
use tracing::debug;
use wallet_core::{AccountAuthTokens, AccountId, AuthTokenScope};

/// Token pair store over an injected encrypted key-value backend.
pub struct AuthTokenStore {
    storage: Box<dyn SecureStorage>,
}

impl AuthTokenStore {
    /// Create a token store with the given storage backend.
    pub fn new(storage: Box<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    /// Read the token pair for `(account, scope)`.
    ///
    /// If either scoped key is absent and the scope is `Global`, falls
    /// back to the legacy unscoped keys before concluding absence.
    /// Tokens written before scoping was introduced only ever carried
    /// global authority, so the fallback must never apply to `Recovery`.
    pub fn get(
        &self,
        account_id: &AccountId,
        scope: AuthTokenScope,
    ) -> StorageResult<Option<AccountAuthTokens>> {
        let access = self
            .storage
            .get(&StorageKeys::access_token(account_id, scope))?;
        let refresh = self
            .storage
            .get(&StorageKeys::refresh_token(account_id, scope))?;

        if let (Some(access_token), Some(refresh_token)) = (access, refresh) {
            return Ok(Some(AccountAuthTokens {
                access_token,
                refresh_token,
            }));
        }

        if scope != AuthTokenScope::Global {
            return Ok(None);
        }

        debug!(account_id = %account_id, "scoped tokens absent, trying legacy keys");
        let access = self
            .storage
            .get(&StorageKeys::legacy_access_token(account_id))?;
        let refresh = self
            .storage
            .get(&StorageKeys::legacy_refresh_token(account_id))?;

        match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Ok(Some(AccountAuthTokens {
                access_token,
                refresh_token,
            })),
            _ => Ok(None),
        }
    }

    /// Write the token pair for `(account, scope)`.
    ///
    /// The two keys are written in sequence; if the second write fails
    /// the store is left inconsistent and the call reports failure.
    /// Callers must treat any error as "tokens not updated".
    pub fn set(
        &self,
        account_id: &AccountId,
        scope: AuthTokenScope,
        tokens: &AccountAuthTokens,
    ) -> StorageResult<()> {
        self.storage.set(
            &StorageKeys::access_token(account_id, scope),
            &tokens.access_token,
        )?;
        self.storage.set(
            &StorageKeys::refresh_token(account_id, scope),
            &tokens.refresh_token,
        )?;
        Ok(())
    }

    /// Delete every token key for the account, scoped and legacy.
    pub fn clear(&self, account_id: &AccountId) -> StorageResult<()> {
        for scope in AuthTokenScope::all() {
            self.storage
                .delete(&StorageKeys::access_token(account_id, scope))?;
            self.storage
                .delete(&StorageKeys::refresh_token(account_id, scope))?;
        }
        self.storage
            .delete(&StorageKeys::legacy_access_token(account_id))?;
        self.storage
            .delete(&StorageKeys::legacy_refresh_token(account_id))?;
        Ok(())
    }
}
