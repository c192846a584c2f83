//! Fused payload parsing.

use super::engine::{CryptoFailure, RecoveryError};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Separator between the salt and the first ciphertext half in a
/// matrix payload.
pub const FIELD_SEPARATOR: char = '|';

/// Ciphertext bundle parsed from a matrix/linear payload pair.
///
/// The matrix payload carries `saltHex|ciphertextPart1`; the linear
/// payload is `ciphertextPart2`. Together the two halves form one base64
/// ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherBundle<'a> {
    salt_hex: &'a str,
    ciphertext_part1: &'a str,
    ciphertext_part2: &'a str,
}

impl<'a> CipherBundle<'a> {
    /// Splits a matrix payload and pairs it with the linear payload.
    ///
    /// The matrix payload must split into exactly two fields.
    pub fn parse(matrix: &'a str, linear: &'a str) -> Result<Self, RecoveryError> {
        let mut fields = matrix.split(FIELD_SEPARATOR);
        match (fields.next(), fields.next(), fields.next()) {
            (Some(salt_hex), Some(ciphertext_part1), None) => Ok(Self {
                salt_hex,
                ciphertext_part1,
                ciphertext_part2: linear,
            }),
            _ => Err(RecoveryError::MalformedPayload {
                fields: matrix.split(FIELD_SEPARATOR).count(),
            }),
        }
    }

    /// Returns the salt as hex text.
    pub fn salt_hex(&self) -> &'a str {
        self.salt_hex
    }

    /// Decodes the salt bytes.
    ///
    /// Any length is accepted. The bytes also seed the CBC IV, see
    /// [`iv_from_salt`](super::iv_from_salt).
    pub fn salt(&self) -> Result<Vec<u8>, CryptoFailure> {
        hex::decode(self.salt_hex).map_err(|e| CryptoFailure::SaltHex(e.to_string()))
    }

    /// Returns the full base64 ciphertext (both halves joined).
    pub fn ciphertext_base64(&self) -> String {
        let mut joined = String::with_capacity(self.ciphertext_part1.len() + self.ciphertext_part2.len());
        joined.push_str(self.ciphertext_part1);
        joined.push_str(self.ciphertext_part2);
        joined
    }

    /// Decodes the joined base64 ciphertext.
    pub fn ciphertext(&self) -> Result<Vec<u8>, CryptoFailure> {
        STANDARD
            .decode(self.ciphertext_base64())
            .map_err(|e| CryptoFailure::Base64(e.to_string()))
    }
}
