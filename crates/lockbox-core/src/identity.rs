// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session identities and federated token decoding.
//!
//! An identity is produced by an external collaborator (a wallet signer or a
//! federated sign-in flow); the engine only consumes the resulting address or
//! stable subject id. The identity picks the cache namespace and whether the
//! remote ledger participates in synchronization.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::error::LockboxError;

/// Cache namespace used by every wallet session.
///
/// Wallet vaults are keyed remotely by the caller address, so a single local
/// namespace suffices; federated vaults get a per-subject namespace instead.
pub const WALLET_NAMESPACE: &str = "default";

const FEDERATED_NAMESPACE_PREFIX: &str = "federated:";

/// The active identity for a session. Exactly one variant is active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Derived from a signing provider; participates in remote-ledger sync.
    Wallet { address: String },
    /// Derived from a federated sign-in token; local cache only.
    Federated { subject_id: String },
}

impl Identity {
    /// The local-cache namespace for this identity.
    ///
    /// Federated namespaces embed the subject id so one account's cached
    /// vault can never leak into another's on a shared device.
    pub fn cache_namespace(&self) -> String {
        match self {
            Identity::Wallet { .. } => WALLET_NAMESPACE.to_string(),
            Identity::Federated { subject_id } => {
                format!("{FEDERATED_NAMESPACE_PREFIX}{subject_id}")
            }
        }
    }

    /// Whether the remote ledger participates in synchronization.
    pub fn uses_remote_ledger(&self) -> bool {
        matches!(self, Identity::Wallet { .. })
    }

    /// Short display label, with wallet addresses elided in the middle.
    pub fn short_label(&self) -> String {
        match self {
            Identity::Wallet { address } if address.len() > 10 => {
                format!("{}...{}", &address[..6], &address[address.len() - 4..])
            }
            Identity::Wallet { address } => address.clone(),
            Identity::Federated { subject_id } => subject_id.clone(),
        }
    }
}

/// Claims extracted from a federated sign-in token.
///
/// The token issuer already authenticated the subject; the engine requires
/// only that `subject_id` is stable and unique per account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedProfile {
    pub subject_id: String,
    pub email: String,
    pub display_name: String,
}

#[derive(Deserialize)]
struct TokenClaims {
    sub: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

impl FederatedProfile {
    /// Decode the payload segment of a JWT-shaped federated token.
    ///
    /// Only the payload is inspected (base64url, no padding); signature
    /// verification is the issuer's concern and happens upstream. Any
    /// malformed token is an [`LockboxError::IdentityProof`].
    pub fn from_token(token: &str) -> Result<Self, LockboxError> {
        let mut parts = token.split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => {
                return Err(LockboxError::IdentityProof(
                    "token is not a three-segment JWT".to_string(),
                ));
            }
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| LockboxError::IdentityProof("token payload is not base64url".to_string()))?;
        let claims: TokenClaims = serde_json::from_slice(&bytes)
            .map_err(|_| LockboxError::IdentityProof("token payload is not valid JSON".to_string()))?;

        let subject_id = claims
            .sub
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LockboxError::IdentityProof("token has no subject claim".to_string()))?;
        let email = claims.email.unwrap_or_else(|| subject_id.clone());
        let display_name = claims.name.unwrap_or_else(|| email.clone());

        Ok(Self {
            subject_id,
            email,
            display_name,
        })
    }

    pub fn identity(&self) -> Identity {
        Identity::Federated {
            subject_id: self.subject_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(payload: &str) -> String {
        let body = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        format!("eyJhbGciOiJSUzI1NiJ9.{body}.c2lnbmF0dXJl")
    }

    #[test]
    fn wallet_identity_uses_the_shared_namespace() {
        let id = Identity::Wallet {
            address: "0xAbCd000000000000000000000000000000001234".to_string(),
        };
        assert_eq!(id.cache_namespace(), "default");
        assert!(id.uses_remote_ledger());
    }

    #[test]
    fn federated_identity_namespace_embeds_the_subject() {
        let id = Identity::Federated {
            subject_id: "109283".to_string(),
        };
        assert_eq!(id.cache_namespace(), "federated:109283");
        assert!(!id.uses_remote_ledger());
    }

    #[test]
    fn distinct_subjects_get_distinct_namespaces() {
        let a = Identity::Federated { subject_id: "alpha".to_string() };
        let b = Identity::Federated { subject_id: "beta".to_string() };
        assert_ne!(a.cache_namespace(), b.cache_namespace());
    }

    #[test]
    fn wallet_label_is_elided() {
        let id = Identity::Wallet {
            address: "0xAbCd000000000000000000000000000000001234".to_string(),
        };
        assert_eq!(id.short_label(), "0xAbCd...1234");
    }

    #[test]
    fn token_decodes_all_claims() {
        let token = make_token(r#"{"sub":"109283","email":"a@x.com","name":"Ana"}"#);
        let profile = FederatedProfile::from_token(&token).unwrap();
        assert_eq!(profile.subject_id, "109283");
        assert_eq!(profile.email, "a@x.com");
        assert_eq!(profile.display_name, "Ana");
    }

    #[test]
    fn token_falls_back_to_subject_for_missing_claims() {
        let token = make_token(r#"{"sub":"109283"}"#);
        let profile = FederatedProfile::from_token(&token).unwrap();
        assert_eq!(profile.email, "109283");
        assert_eq!(profile.display_name, "109283");
    }

    #[test]
    fn token_without_subject_is_rejected() {
        let token = make_token(r#"{"email":"a@x.com"}"#);
        let err = FederatedProfile::from_token(&token).unwrap_err();
        assert!(matches!(err, LockboxError::IdentityProof(_)));
    }

    #[test]
    fn token_with_wrong_segment_count_is_rejected() {
        assert!(FederatedProfile::from_token("onlyonesegment").is_err());
        assert!(FederatedProfile::from_token("a.b.c.d").is_err());
    }

    #[test]
    fn token_with_garbage_payload_is_rejected() {
        assert!(FederatedProfile::from_token("a.!!notbase64!!.c").is_err());
    }
}
