// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call encoding for the fixed two-method vault contract.
//!
//! The engine speaks to exactly one contract shape:
//! `storeVault(string)` (state-mutating, no return) and
//! `fetchVault() -> string` (view). Anything else is unsupported, so the
//! ABI handling here is deliberately limited to a single dynamic string
//! argument and a single dynamic string return.

use lockbox_core::LockboxError;

/// Selector for `storeVault(string)`: first four bytes of the Keccak-256
/// hash of the signature.
pub const STORE_VAULT_SELECTOR: [u8; 4] = [0x05, 0x91, 0x09, 0x83];

/// Selector for `fetchVault()`.
pub const FETCH_VAULT_SELECTOR: [u8; 4] = [0x2b, 0x45, 0x70, 0x03];

const WORD: usize = 32;

/// Build the `data` field for a `storeVault(string)` transaction.
pub fn encode_store_call(ciphertext: &str) -> String {
    let bytes = ciphertext.as_bytes();
    let padded_len = bytes.len().div_ceil(WORD) * WORD;

    let mut data = Vec::with_capacity(4 + WORD * 2 + padded_len);
    data.extend_from_slice(&STORE_VAULT_SELECTOR);
    // Head: offset of the dynamic string payload (always one word here).
    data.extend_from_slice(&abi_word(WORD as u64));
    // Tail: length word, then the bytes padded to a word boundary.
    data.extend_from_slice(&abi_word(bytes.len() as u64));
    data.extend_from_slice(bytes);
    data.resize(4 + WORD * 2 + padded_len, 0);

    format!("0x{}", hex::encode(data))
}

/// Build the `data` field for a `fetchVault()` call.
pub fn encode_fetch_call() -> String {
    format!("0x{}", hex::encode(FETCH_VAULT_SELECTOR))
}

/// Decode the return data of `fetchVault()` into the stored string.
///
/// An empty return (`0x`) means nothing has been stored yet and decodes to
/// an empty string. A return that is not a single ABI-encoded string means
/// the contract at the configured address has an unsupported shape.
pub fn decode_string_result(hex_data: &str) -> Result<String, LockboxError> {
    let stripped = hex_data.strip_prefix("0x").unwrap_or(hex_data);
    if stripped.is_empty() {
        return Ok(String::new());
    }
    let data = hex::decode(stripped)
        .map_err(|_| unsupported("return data is not hex"))?;
    if data.len() < WORD * 2 {
        return Err(unsupported("return data shorter than an encoded string"));
    }

    let offset = word_to_usize(&data[..WORD])
        .ok_or_else(|| unsupported("string offset does not fit a word"))?;
    let len_end = offset
        .checked_add(WORD)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| unsupported("string offset points past the data"))?;
    let len = word_to_usize(&data[offset..len_end])
        .ok_or_else(|| unsupported("string length does not fit a word"))?;
    let end = len_end
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| unsupported("string length points past the data"))?;

    String::from_utf8(data[len_end..end].to_vec())
        .map_err(|_| unsupported("stored payload is not UTF-8"))
}

fn unsupported(detail: &str) -> LockboxError {
    LockboxError::Configuration(format!("unsupported contract response: {detail}"))
}

fn abi_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

fn word_to_usize(word: &[u8]) -> Option<usize> {
    // The high 24 bytes must be zero for any value the engine can handle.
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return None;
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(tail)).ok()
}
