//! Passkey (WebAuthn) ceremony options and the platform seam that runs them.
//!
//! The authenticator itself lives outside this crate. Options are serialized in
//! the camelCase shape browsers expect, with binary fields hex encoded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::PasskeyError, session::{WalletSession, APP_NAME}};

pub const MIN_CHALLENGE_LEN: usize = 16;
pub const ES256: i32 = -7;
pub const CEREMONY_TIMEOUT_MS: u64 = 60_000;
// WebAuthn caps the user handle at 64 bytes.
const MAX_USER_HANDLE_LEN: usize = 64;

/// A server-issued, single-use challenge. Deserializing applies the same checks as [`Challenge::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Challenge(Vec<u8>);

impl Challenge {
    pub fn new(bytes: Vec<u8>) -> Result<Self, PasskeyError> {
        if bytes.len() < MIN_CHALLENGE_LEN || bytes.iter().all(|b| *b == 0) {
            return Err(PasskeyError::WeakChallenge { len: bytes.len(), min: MIN_CHALLENGE_LEN });
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self, PasskeyError> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| PasskeyError::Rejected(format!("challenge is not hex: {e}")))?;
        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<String> for Challenge {
    type Error = PasskeyError;

    fn try_from(hex: String) -> Result<Self, Self::Error> {
        Self::from_hex(&hex)
    }
}

impl From<Challenge> for String {
    fn from(challenge: Challenge) -> Self {
        hex::encode(challenge.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelyingParty {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    #[serde(with = "hex")]
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubKeyCredParam {
    pub alg: i32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attestation {
    None,
    Indirect,
    Direct,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationOptions {
    pub challenge: Challenge,
    pub rp: RelyingParty,
    pub user: UserEntity,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    pub timeout: u64,
    pub attestation: Attestation,
}

impl CreationOptions {
    /// Registration options for the account behind `session`.
    pub fn for_session(session: &WalletSession, challenge: Challenge) -> Self {
        let mut handle = session.address().as_bytes().to_vec();
        handle.truncate(MAX_USER_HANDLE_LEN);
        Self {
            challenge,
            rp: RelyingParty { name: APP_NAME.to_string(), id: None },
            user: UserEntity {
                id: handle,
                name: session.address().to_string(),
                display_name: session
                    .user()
                    .username
                    .clone()
                    .unwrap_or_else(|| "TimeLock User".to_string()),
            },
            pub_key_cred_params: vec![PubKeyCredParam { alg: ES256, kind: "public-key".to_string() }],
            timeout: CEREMONY_TIMEOUT_MS,
            attestation: Attestation::Direct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub challenge: Challenge,
    pub timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rp_id: Option<String>,
}

impl RequestOptions {
    pub fn new(challenge: Challenge) -> Self {
        Self { challenge, timeout: CEREMONY_TIMEOUT_MS, rp_id: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyCredential {
    pub id: String,
    #[serde(with = "hex")]
    pub attestation_object: Vec<u8>,
    #[serde(with = "hex")]
    pub client_data_json: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyAssertion {
    pub credential_id: String,
    #[serde(with = "hex")]
    pub authenticator_data: Vec<u8>,
    #[serde(with = "hex")]
    pub client_data_json: Vec<u8>,
    #[serde(with = "hex")]
    pub signature: Vec<u8>,
}

/// The platform authenticator.
#[async_trait]
pub trait CredentialCeremony: Send + Sync {
    async fn create(&self, options: &CreationOptions) -> Result<PasskeyCredential, PasskeyError>;

    async fn authenticate(&self, options: &RequestOptions) -> Result<PasskeyAssertion, PasskeyError>;
}

/// For hosts with no authenticator attached.
pub struct UnsupportedPlatform;

#[async_trait]
impl CredentialCeremony for UnsupportedPlatform {
    async fn create(&self, _options: &CreationOptions) -> Result<PasskeyCredential, PasskeyError> {
        Err(PasskeyError::Unsupported)
    }

    async fn authenticate(&self, _options: &RequestOptions) -> Result<PasskeyAssertion, PasskeyError> {
        Err(PasskeyError::Unsupported)
    }
}
