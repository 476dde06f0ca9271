// ABOUTME: Short code generation for shareable recipe links
// ABOUTME: Encodes random UUIDs into 22-character base57 slugs without ambiguous characters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use uuid::Uuid;

/// Alphabet without `0`, `1`, `I`, `O` and `l`
pub const ALPHABET: &[u8; 57] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Length of every generated code; 57^22 exceeds 2^128
pub const CODE_LENGTH: usize = 22;

/// Generate a fresh random short code
#[must_use]
pub fn generate() -> String {
    encode(Uuid::new_v4())
}

/// Encode a UUID, most significant digit first, padded with the first alphabet symbol
#[must_use]
pub fn encode(id: Uuid) -> String {
    let base = ALPHABET.len() as u128;
    let mut value = id.as_u128();
    let mut digits = [ALPHABET[0]; CODE_LENGTH];

    for slot in digits.iter_mut().rev() {
        if value == 0 {
            break;
        }
        // Remainder is below 57, so the index cast cannot truncate
        #[allow(clippy::cast_possible_truncation)]
        let index = (value % base) as usize;
        *slot = ALPHABET[index];
        value /= base;
    }

    digits.iter().map(|&b| char::from(b)).collect()
}

/// Whether a string could be a generated short code
#[must_use]
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nil_uuid_is_all_padding() {
        assert_eq!(encode(Uuid::nil()), "2".repeat(CODE_LENGTH));
    }

    #[test]
    fn test_small_values() {
        let one = encode(Uuid::from_u128(1));
        assert_eq!(one, format!("{}3", "2".repeat(CODE_LENGTH - 1)));

        let base = encode(Uuid::from_u128(57));
        assert_eq!(base, format!("{}32", "2".repeat(CODE_LENGTH - 2)));
    }

    #[test]
    fn test_max_uuid_fits() {
        let code = encode(Uuid::from_u128(u128::MAX));
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(is_well_formed(&code));
    }

    #[test]
    fn test_generated_codes_differ() {
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
        assert!(is_well_formed(&a));
        assert!(!is_well_formed("not-a-code"));
    }
}
