//! Core domain types shared across the wallet auth subsystem.

use serde::{Deserialize, Serialize};

/// Unique identifier for a wallet account, issued by f8e.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    /// Creates an account ID from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the account ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An authentication public key, in its serialized wire form.
///
/// This subsystem never inspects key bytes; the matching private key is
/// only ever reachable through the `MessageSigner` seam in
/// `wallet-auth`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(pub String);

impl PublicKey {
    /// Creates a public key from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PublicKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An opaque signature produced by an app or hardware key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(pub String);

impl Signature {
    /// Creates a signature from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the signature as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Authorization class of an auth token pair.
///
/// `Global` authorizes full-account operations; `Recovery` authorizes
/// only recovery-related operations and is the only scope available to a
/// not-yet-upgraded lite account.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthTokenScope {
    Global,
    Recovery,
}

impl AuthTokenScope {
    /// Segment used when building scope-qualified storage keys.
    pub fn key_segment(&self) -> &'static str {
        match self {
            AuthTokenScope::Global => "global",
            AuthTokenScope::Recovery => "recovery",
        }
    }

    /// All scopes, in storage-schema order.
    pub fn all() -> [AuthTokenScope; 2] {
        [AuthTokenScope::Global, AuthTokenScope::Recovery]
    }
}

impl std::fmt::Display for AuthTokenScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key_segment())
    }
}

/// Access/refresh token pair for one `(account, scope)`.
///
/// Written and read atomically as a pair; the strings are opaque to this
/// subsystem.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccountAuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// A candidate or active pair of app authentication keys for a full
/// account.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AuthKeySet {
    /// App key authorized for full-account operations.
    pub global_auth_public_key: PublicKey,
    /// App key authorized for recovery operations only.
    pub recovery_auth_public_key: PublicKey,
    /// Hardware signature over the global key, when hardware has
    /// endorsed this set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hw_signed_global_key: Option<Signature>,
}

/// The bundle of active key material for a full account.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Keybox {
    pub account_id: AccountId,
    pub environment: F8eEnvironment,
    pub auth_keys: AuthKeySet,
    pub hw_auth_public_key: PublicKey,
}

impl Keybox {
    /// Returns a copy of this keybox carrying a rotated auth key set.
    pub fn with_auth_keys(&self, auth_keys: AuthKeySet) -> Self {
        Self {
            auth_keys,
            ..self.clone()
        }
    }
}

/// Which f8e deployment a call targets. Selected per call by the caller.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum F8eEnvironment {
    Production,
    Staging,
    /// Local or ad-hoc deployment, e.g. `http://localhost:8080`.
    Local(String),
}

impl F8eEnvironment {
    /// Base URL for REST calls against this environment.
    pub fn base_url(&self) -> &str {
        match self {
            F8eEnvironment::Production => "https://api.harborwallet.app",
            F8eEnvironment::Staging => "https://api.staging.harborwallet.app",
            F8eEnvironment::Local(url) => url,
        }
    }
}

/// Build variant of the running app.
///
/// Destructive local operations (token/account wipe) are only available
/// outside customer builds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppVariant {
    Customer,
    Team,
    Development,
}

impl AppVariant {
    /// Whether this build may wipe locally stored tokens and accounts.
    pub fn allows_wipe(&self) -> bool {
        !matches!(self, AppVariant::Customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_key_segments_are_distinct() {
        assert_eq!(AuthTokenScope::Global.key_segment(), "global");
        assert_eq!(AuthTokenScope::Recovery.key_segment(), "recovery");
        assert_ne!(
            AuthTokenScope::Global.key_segment(),
            AuthTokenScope::Recovery.key_segment()
        );
    }

    #[test]
    fn scope_wire_form_is_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&AuthTokenScope::Global).unwrap(),
            "\"GLOBAL\""
        );
        assert_eq!(
            serde_json::to_string(&AuthTokenScope::Recovery).unwrap(),
            "\"RECOVERY\""
        );
    }

    #[test]
    fn auth_key_set_omits_absent_hw_signature() {
        let keys = AuthKeySet {
            global_auth_public_key: PublicKey::from("app-global"),
            recovery_auth_public_key: PublicKey::from("app-recovery"),
            hw_signed_global_key: None,
        };

        let json = serde_json::to_string(&keys).unwrap();
        assert!(!json.contains("hw_signed_global_key"));

        let parsed: AuthKeySet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, keys);
    }

    #[test]
    fn keybox_with_auth_keys_replaces_only_keys() {
        let keybox = Keybox {
            account_id: AccountId::from("account-1"),
            environment: F8eEnvironment::Staging,
            auth_keys: AuthKeySet {
                global_auth_public_key: PublicKey::from("old-global"),
                recovery_auth_public_key: PublicKey::from("old-recovery"),
                hw_signed_global_key: None,
            },
            hw_auth_public_key: PublicKey::from("hw-key"),
        };

        let rotated = keybox.with_auth_keys(AuthKeySet {
            global_auth_public_key: PublicKey::from("new-global"),
            recovery_auth_public_key: PublicKey::from("new-recovery"),
            hw_signed_global_key: Some(Signature::from_string("hw-sig")),
        });

        assert_eq!(rotated.account_id, keybox.account_id);
        assert_eq!(rotated.hw_auth_public_key, keybox.hw_auth_public_key);
        assert_eq!(
            rotated.auth_keys.global_auth_public_key,
            PublicKey::from("new-global")
        );
    }

    #[test]
    fn local_environment_base_url_passes_through() {
        let env = F8eEnvironment::Local("http://localhost:8080".to_string());
        assert_eq!(env.base_url(), "http://localhost:8080");
    }

    #[test]
    fn only_customer_variant_blocks_wipe() {
        assert!(!AppVariant::Customer.allows_wipe());
        assert!(AppVariant::Team.allows_wipe());
        assert!(AppVariant::Development.allows_wipe());
    }
}
