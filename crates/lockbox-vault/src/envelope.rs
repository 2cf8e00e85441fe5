// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The string encryption envelope stored in caches and on the ledger.
//!
//! Wire form: `"lk1." + base64(nonce || ciphertext || tag)` over the
//! canonical JSON serialization of the payload. Decryption never panics and
//! never throws past the envelope boundary; every rejection is a typed
//! [`CryptoError`] so callers can tell "no data yet" from "unreadable".

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;

use lockbox_core::CryptoError;

use crate::crypto::{self, NONCE_LEN, TAG_LEN};
use crate::kdf::VaultKey;

/// Version prefix of the envelope format.
pub const ENVELOPE_PREFIX: &str = "lk1.";

/// Serialize `payload` to canonical JSON and encrypt it under `key`.
pub fn seal_json<T: Serialize>(payload: &T, key: &VaultKey) -> Result<String, CryptoError> {
    let plaintext = serde_json::to_vec(payload).map_err(|_| CryptoError::Seal)?;
    let (ciphertext, nonce) = crypto::seal(key.bytes(), &plaintext)?;

    let mut framed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    framed.extend_from_slice(&nonce);
    framed.extend_from_slice(&ciphertext);

    Ok(format!("{ENVELOPE_PREFIX}{}", STANDARD.encode(framed)))
}

/// Decrypt an envelope string and parse the payload.
///
/// Rejection ladder, in order:
/// - empty or shorter than `min_len` → [`CryptoError::TooShort`] (benign)
/// - bad prefix, bad base64, or too few bytes → [`CryptoError::Malformed`]
/// - AEAD open failure → [`CryptoError::Unreadable`]
/// - bad UTF-8, empty plaintext, or JSON parse failure → [`CryptoError::Decode`]
pub fn open_json<T: DeserializeOwned>(
    text: &str,
    key: &VaultKey,
    min_len: usize,
) -> Result<T, CryptoError> {
    if text.is_empty() || text.len() < min_len {
        return Err(CryptoError::TooShort);
    }

    let body = text.strip_prefix(ENVELOPE_PREFIX).ok_or(CryptoError::Malformed)?;
    let framed = STANDARD.decode(body).map_err(|_| CryptoError::Malformed)?;
    if framed.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Malformed);
    }

    let (nonce_bytes, ciphertext) = framed.split_at(NONCE_LEN);
    let nonce: [u8; NONCE_LEN] = nonce_bytes
        .try_into()
        .map_err(|_| CryptoError::Malformed)?;

    let plaintext = crypto::open(key.bytes(), &nonce, ciphertext)?;

    let decoded = std::str::from_utf8(&plaintext).map_err(|_| CryptoError::Decode)?;
    if decoded.is_empty() {
        return Err(CryptoError::Decode);
    }
    serde_json::from_str(decoded).map_err(|_| CryptoError::Decode)
}
