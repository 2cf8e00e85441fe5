// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSPRNG password generation.
//!
//! Character classes exclude visually ambiguous glyphs (i/l/1, o/0) so
//! generated passwords survive being read aloud or retyped.

use rand::Rng;
use rand::rngs::OsRng;

use lockbox_core::LockboxError;
use lockbox_core::record::{PASS_MAX_LEN, PASS_MIN_LEN};

const LOWER: &str = "abcdefghjkmnpqrstuvwxyz";
const UPPER: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &str = "23456789";
const SYMBOLS: &str = "!@#$%&*";

/// Which character classes participate in generation.
#[derive(Debug, Clone, Copy)]
pub struct PasswordOptions {
    pub length: usize,
    pub lower: bool,
    pub upper: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: 14,
            lower: true,
            upper: true,
            digits: true,
            symbols: false,
        }
    }
}

/// Generate a password by uniform CSPRNG sampling over the selected classes.
///
/// Rejects a zero-class selection and lengths outside the record password
/// bounds, so every generated password is storable as-is.
pub fn generate(options: &PasswordOptions) -> Result<String, LockboxError> {
    let mut charset = String::new();
    if options.lower {
        charset.push_str(LOWER);
    }
    if options.upper {
        charset.push_str(UPPER);
    }
    if options.digits {
        charset.push_str(DIGITS);
    }
    if options.symbols {
        charset.push_str(SYMBOLS);
    }

    if charset.is_empty() {
        return Err(LockboxError::Validation {
            field: "options",
            reason: "select at least one character class".to_string(),
        });
    }
    if options.length < PASS_MIN_LEN || options.length > PASS_MAX_LEN {
        return Err(LockboxError::Validation {
            field: "length",
            reason: format!("must be {PASS_MIN_LEN}-{PASS_MAX_LEN}"),
        });
    }

    let chars: Vec<char> = charset.chars().collect();
    let mut rng = OsRng;
    Ok((0..options.length)
        .map(|_| chars[rng.gen_range(0..chars.len())])
        .collect())
}
