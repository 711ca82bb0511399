//! Shared in-memory fakes for this crate's tests.

use crate::f8e_client::{
    AuthenticationService, F8eError, InitiatedAuthChallenge, RotateAuthKeysRequest, StatusCode,
};
use crate::{AuthKeyDiscovery, MessageSigner, SignerError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use wallet_core::{
    AccountAuthTokens, AccountId, AuthTokenScope, F8eEnvironment, PublicKey, Signature,
};
use wallet_storage::{SecureStorage, StorageResult};

pub(crate) fn key_not_recognized() -> F8eError {
    F8eError::UnexpectedStatus {
        status: StatusCode::NOT_FOUND,
        body_summary: "len=0,digest=0000000000000000".to_string(),
    }
}

/// In-memory storage for testing.
pub(crate) struct MemoryStorage {
    data: Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryStorage {
    pub(crate) fn new() -> Self {
        Self {
            data: Mutex::new(std::collections::HashMap::new()),
        }
    }
}

impl SecureStorage for MemoryStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        Ok(self.data.lock().unwrap().remove(key).is_some())
    }
}

/// Programmable fake f8e service with per-operation call counters.
pub(crate) struct FakeAuthService {
    pub account_id: AccountId,
    /// Base64 challenge handed out by initiate.
    pub challenge: Mutex<String>,
    /// Keys that 404 on initiate.
    pub rejected_keys: Mutex<HashSet<PublicKey>>,
    /// Status returned by refresh instead of success, when set.
    pub refresh_fail_status: Mutex<Option<StatusCode>>,
    pub initiate_calls: AtomicUsize,
    pub complete_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub rotate_calls: AtomicUsize,
    pub last_completed_username: Mutex<Option<String>>,
}

impl FakeAuthService {
    pub(crate) fn new() -> Self {
        Self {
            account_id: AccountId::from("account-fake"),
            challenge: Mutex::new(BASE64.encode(b"challenge-bytes")),
            rejected_keys: Mutex::new(HashSet::new()),
            refresh_fail_status: Mutex::new(None),
            initiate_calls: AtomicUsize::new(0),
            complete_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            rotate_calls: AtomicUsize::new(0),
            last_completed_username: Mutex::new(None),
        }
    }

    pub(crate) fn reject_key(&self, key: &PublicKey) {
        self.rejected_keys.lock().unwrap().insert(key.clone());
    }

    pub(crate) fn fail_refresh(&self) {
        *self.refresh_fail_status.lock().unwrap() = Some(StatusCode::UNAUTHORIZED);
    }

    /// Token pair the fake issues on refresh.
    pub(crate) fn refreshed_tokens() -> AccountAuthTokens {
        AccountAuthTokens {
            access_token: "access-refreshed".to_string(),
            refresh_token: "refresh-refreshed".to_string(),
        }
    }
}

#[async_trait]
impl AuthenticationService for FakeAuthService {
    async fn initiate_auth_challenge(
        &self,
        _environment: &F8eEnvironment,
        auth_public_key: &PublicKey,
        _scope: AuthTokenScope,
    ) -> Result<InitiatedAuthChallenge, F8eError> {
        self.initiate_calls.fetch_add(1, Ordering::SeqCst);

        if self.rejected_keys.lock().unwrap().contains(auth_public_key) {
            return Err(key_not_recognized());
        }

        Ok(InitiatedAuthChallenge {
            username: format!("{}-username", self.account_id),
            account_id: self.account_id.clone(),
            challenge: self.challenge.lock().unwrap().clone(),
            session: "session-1".to_string(),
        })
    }

    async fn complete_auth_challenge(
        &self,
        _environment: &F8eEnvironment,
        username: &str,
        signature: &Signature,
        _session: &str,
    ) -> Result<AccountAuthTokens, F8eError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_completed_username.lock().unwrap() = Some(username.to_string());
        Ok(AccountAuthTokens {
            access_token: format!("access:{}", signature.as_str()),
            refresh_token: format!("refresh:{}", signature.as_str()),
        })
    }

    async fn refresh_auth_tokens(
        &self,
        _environment: &F8eEnvironment,
        _refresh_token: &str,
    ) -> Result<AccountAuthTokens, F8eError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = *self.refresh_fail_status.lock().unwrap() {
            return Err(F8eError::UnexpectedStatus {
                status,
                body_summary: "len=0,digest=0000000000000000".to_string(),
            });
        }

        Ok(Self::refreshed_tokens())
    }

    async fn rotate_auth_keys(
        &self,
        _environment: &F8eEnvironment,
        _account_id: &AccountId,
        _request: &RotateAuthKeysRequest,
    ) -> Result<(), F8eError> {
        self.rotate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fake signer producing deterministic signatures.
pub(crate) struct FakeSigner {
    pub fail: AtomicBool,
    pub sign_calls: AtomicUsize,
}

impl FakeSigner {
    pub(crate) fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            sign_calls: AtomicUsize::new(0),
        }
    }
}

impl MessageSigner for FakeSigner {
    fn sign(&self, public_key: &PublicKey, message: &[u8]) -> Result<Signature, SignerError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(SignerError::Signing("signer offline".to_string()));
        }

        Ok(Signature::from_string(format!(
            "signed:{}:{}",
            public_key,
            message.len()
        )))
    }
}

/// Fake discovery yielding a fixed optional key.
pub(crate) struct FakeDiscovery {
    pub key: Mutex<Option<PublicKey>>,
}

impl FakeDiscovery {
    pub(crate) fn with_key(key: PublicKey) -> Self {
        Self {
            key: Mutex::new(Some(key)),
        }
    }

    pub(crate) fn without_account() -> Self {
        Self {
            key: Mutex::new(None),
        }
    }
}

impl AuthKeyDiscovery for FakeDiscovery {
    fn auth_public_key(
        &self,
        _account_id: &AccountId,
        _scope: AuthTokenScope,
    ) -> StorageResult<Option<PublicKey>> {
        Ok(self.key.lock().unwrap().clone())
    }
}
