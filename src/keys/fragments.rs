//! Reversible byte transforms for the master key fragments.
//!
//! Every fragment ships as a base64 ciphertext next to the text key
//! that unlocks it, so these transforms only keep a literal key out of
//! the payload-decoding code. They are not encryption.
//!
//! Decoded bytes are handled as Latin-1 text: one `char` per byte, with
//! code points in `U+0000..=U+00FF`. Keys are applied as raw text (their
//! char codes), never base64-decoded.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Row-major 5×5 letter grid used by fragment C (no `J`).
const GRID: [[char; 5]; 5] = [
    ['A', 'B', 'C', 'D', 'E'],
    ['F', 'G', 'H', 'I', 'K'],
    ['L', 'M', 'N', 'O', 'P'],
    ['Q', 'R', 'S', 'T', 'U'],
    ['V', 'W', 'X', 'Y', 'Z'],
];

/// Errors raised while decoding or encoding a fragment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FragmentError {
    #[error("invalid base64: {0}")]
    Base64(String),
    #[error("fragment has no hex text to decode")]
    EmptyHex,
    #[error("fragment key is empty")]
    EmptyKey,
    #[error("character {ch:?} at position {position} cannot be encoded")]
    Unencodable { ch: char, position: usize },
}

/// Fragment A: XOR with the cyclic key, then the positional rotation.
///
/// The rotation is `((code - 65 - (i + 13) + 26) rem 26) + 65` with a
/// truncating remainder, so codes far below the alphabet fall under
/// `'A'` instead of wrapping.
pub fn decode_rotated_xor(encoded: &str, key: &str) -> Result<String, FragmentError> {
    let key = key_codes(key)?;
    let bytes = base64_decode(encoded)?;

    Ok(bytes
        .iter()
        .enumerate()
        .map(|(i, &byte)| {
            let code = i64::from(byte ^ key[i % key.len()]);
            let shifted = (code - 65 - (i as i64 + 13) + 26) % 26 + 65;
            latin1(shifted)
        })
        .collect())
}

/// Inverse of [`decode_rotated_xor`].
///
/// Accepts characters in `'('..='Z'` as long as the pre-rotation code
/// still fits in a byte at that position.
pub fn encode_rotated_xor(plain: &str, key: &str) -> Result<String, FragmentError> {
    let key = key_codes(key)?;

    let bytes = plain
        .chars()
        .enumerate()
        .map(|(i, ch)| {
            let target = i64::from(u32::from(ch));
            let code = target - 13 + i as i64;
            if !(40..=90).contains(&target) || !(0..=255).contains(&code) {
                return Err(FragmentError::Unencodable { ch, position: i });
            }
            Ok(code as u8 ^ key[i % key.len()])
        })
        .collect::<Result<Vec<u8>, _>>()?;

    Ok(STANDARD.encode(bytes))
}

/// Fragment B: hex-pair decode, reverse, then subtract the cyclic key.
pub fn decode_reversed_hex(encoded: &str, key: &str) -> Result<String, FragmentError> {
    let key = key_codes(key)?;
    let text = base64_decode(encoded)?;
    if text.is_empty() {
        return Err(FragmentError::EmptyHex);
    }

    let mut bytes = hex_pairs(&text);
    bytes.reverse();
    Ok(subtract_key(&bytes, &key))
}

/// Inverse of [`decode_reversed_hex`].
pub fn encode_reversed_hex(plain: &str, key: &str) -> Result<String, FragmentError> {
    let key = key_codes(key)?;
    let mut bytes = add_key(&latin1_bytes(plain)?, &key);
    bytes.reverse();
    Ok(STANDARD.encode(hex::encode(bytes)))
}

/// Fragment C: hex-pair decode, XOR with the cyclic key, then read the
/// result as digit pairs on the 5×5 letter grid.
///
/// Pairs that are not two digits in `1..=5` are dropped, which makes
/// this transform one-way.
pub fn decode_grid(encoded: &str, key: &str) -> Result<String, FragmentError> {
    let key = key_codes(key)?;
    let text = base64_decode(encoded)?;

    let xored: Vec<u8> = hex_pairs(&text)
        .iter()
        .enumerate()
        .map(|(i, &byte)| byte ^ key[i % key.len()])
        .collect();

    Ok(xored
        .chunks(2)
        .filter_map(|pair| match pair {
            [row, col] => grid_letter(*row, *col),
            _ => None,
        })
        .collect())
}

/// Fragment D: hex-pair decode, then subtract the cyclic key.
pub fn decode_shifted_hex(encoded: &str, key: &str) -> Result<String, FragmentError> {
    let key = key_codes(key)?;
    let text = base64_decode(encoded)?;
    Ok(subtract_key(&hex_pairs(&text), &key))
}

/// Inverse of [`decode_shifted_hex`].
pub fn encode_shifted_hex(plain: &str, key: &str) -> Result<String, FragmentError> {
    let key = key_codes(key)?;
    let bytes = add_key(&latin1_bytes(plain)?, &key);
    Ok(STANDARD.encode(hex::encode(bytes)))
}

/// Lenient hex-pair decode.
///
/// Splits the text into two-byte chunks and parses the leading run of
/// hex digits in each chunk. A chunk without a leading digit yields 0.
pub fn hex_pairs(text: &[u8]) -> Vec<u8> {
    text.chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map_while(|&c| (c as char).to_digit(16))
                .fold(0u8, |acc, digit| (acc << 4) | digit as u8)
        })
        .collect()
}

fn grid_letter(row: u8, col: u8) -> Option<char> {
    let row = (row as char).to_digit(10)?.checked_sub(1)? as usize;
    let col = (col as char).to_digit(10)?.checked_sub(1)? as usize;
    GRID.get(row)?.get(col).copied()
}

fn subtract_key(bytes: &[u8], key: &[u8]) -> String {
    bytes
        .iter()
        .enumerate()
        .map(|(i, &b)| b.wrapping_sub(key[i % key.len()]) as char)
        .collect()
}

fn add_key(bytes: &[u8], key: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .enumerate()
        .map(|(i, &b)| b.wrapping_add(key[i % key.len()]))
        .collect()
}

fn base64_decode(encoded: &str) -> Result<Vec<u8>, FragmentError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| FragmentError::Base64(e.to_string()))
}

/// Key char codes, reduced modulo 256.
fn key_codes(key: &str) -> Result<Vec<u8>, FragmentError> {
    if key.is_empty() {
        return Err(FragmentError::EmptyKey);
    }
    Ok(key.chars().map(|c| (u32::from(c) % 256) as u8).collect())
}

fn latin1_bytes(text: &str) -> Result<Vec<u8>, FragmentError> {
    text.chars()
        .enumerate()
        .map(|(position, ch)| {
            u8::try_from(u32::from(ch)).map_err(|_| FragmentError::Unencodable { ch, position })
        })
        .collect()
}

/// Maps a rotated code to its character. Codes stay within `40..=90`.
fn latin1(code: i64) -> char {
    char::from(code.clamp(0, 255) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hex_pairs_plain() {
        assert_eq!(hex_pairs(b"00ff7A"), vec![0x00, 0xff, 0x7a]);
    }

    #[test]
    fn test_hex_pairs_lenient() {
        // Leading digit only, no digit, trailing single char
        assert_eq!(hex_pairs(b"3zzqf"), vec![0x3, 0x0, 0xf]);
    }

    #[test]
    fn test_rotated_xor_known_value() {
        // "AAA" with key "\0" is stored as codes 52, 53, 54
        let encoded = STANDARD.encode([52u8, 53, 54]);
        assert_eq!(decode_rotated_xor(&encoded, "\0").unwrap(), "AAA");
    }

    #[test]
    fn test_rotated_xor_truncating_remainder() {
        // code 0 at position 0: (0 - 65 - 13 + 26) rem 26 = 0 -> 'A'
        // code 0 at position 1: (0 - 65 - 14 + 26) rem 26 = -1 -> '@'
        let encoded = STANDARD.encode([0u8, 0]);
        assert_eq!(decode_rotated_xor(&encoded, "\0").unwrap(), "A@");
    }

    #[test]
    fn test_rotated_xor_rejects_lowercase() {
        assert_eq!(
            encode_rotated_xor("Ab", "key"),
            Err(FragmentError::Unencodable { ch: 'b', position: 1 })
        );
    }

    #[test]
    fn test_reversed_hex_known_value() {
        // hex "444342" is "DCB", reversed "BCD", then shifted down by one
        let encoded = STANDARD.encode("444342");
        assert_eq!(decode_reversed_hex(&encoded, "\u{1}").unwrap(), "ABC");
    }

    #[test]
    fn test_reversed_hex_empty_is_error() {
        assert_eq!(decode_reversed_hex("", "k"), Err(FragmentError::EmptyHex));
    }

    #[test]
    fn test_grid_known_value() {
        // digits "11124555" XOR 'K', hex encoded
        let decoded = decode_grid("N2E3YTdhNzk3ZjdlN2U3ZQ==", "K").unwrap();
        assert_eq!(decoded, "ABUZ");
    }

    #[test]
    fn test_grid_skips_out_of_range_pairs() {
        // digits "06139": "06" is off-grid, "13" is C, "9" is unpaired
        let decoded = decode_grid("N2I3ZDdhNzg3Mg==", "K").unwrap();
        assert_eq!(decoded, "C");
    }

    #[test]
    fn test_shifted_hex_wraps() {
        // 0x00 - 0x01 wraps to 0xff
        let encoded = STANDARD.encode("00");
        assert_eq!(decode_shifted_hex(&encoded, "\u{1}").unwrap(), "\u{ff}");
    }

    #[test]
    fn test_invalid_base64_is_error() {
        assert!(matches!(
            decode_shifted_hex("not base64!", "k"),
            Err(FragmentError::Base64(_))
        ));
    }

    #[test]
    fn test_empty_key_is_error() {
        assert_eq!(decode_shifted_hex("", ""), Err(FragmentError::EmptyKey));
    }

    proptest! {
        #[test]
        fn prop_rotated_xor_roundtrip(plain in "[A-Z]{0,64}", key in "[ -~]{1,32}") {
            let encoded = encode_rotated_xor(&plain, &key).unwrap();
            prop_assert_eq!(decode_rotated_xor(&encoded, &key).unwrap(), plain);
        }

        #[test]
        fn prop_reversed_hex_roundtrip(plain in r"[\x01-\xff]{1,64}", key in "[ -~]{1,32}") {
            let encoded = encode_reversed_hex(&plain, &key).unwrap();
            prop_assert_eq!(decode_reversed_hex(&encoded, &key).unwrap(), plain);
        }

        #[test]
        fn prop_shifted_hex_roundtrip(plain in r"[\x00-\xff]{0,64}", key in "[ -~]{1,32}") {
            let encoded = encode_shifted_hex(&plain, &key).unwrap();
            prop_assert_eq!(decode_shifted_hex(&encoded, &key).unwrap(), plain);
        }

        #[test]
        fn prop_grid_output_is_grid_letters(encoded_bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let encoded = STANDARD.encode(hex::encode(encoded_bytes));
            let decoded = decode_grid(&encoded, "K").unwrap();
            prop_assert!(decoded.chars().all(|c| c.is_ascii_uppercase() && c != 'J'));
        }
    }
}
