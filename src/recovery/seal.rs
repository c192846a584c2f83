//! Sealing secrets into matrix/linear payload pairs.
//!
//! The inverse of recovery: encrypt a secret under the same scheme and
//! split the base64 ciphertext across the two codes.

use super::bundle::FIELD_SEPARATOR;
use super::engine::{derive_key, Aes128CbcEnc};
use crate::keys::MasterKey;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, generic_array::GenericArray, BlockEncryptMut, KeyIvInit};
use rand_core::{OsRng, RngCore};
use thiserror::Error;

/// Salt length in bytes. The salt doubles as the CBC IV.
pub const SALT_LEN: usize = 16;

/// Errors that can occur while sealing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SealError {
    #[error("salt must be 16 bytes, got {0}")]
    SaltLength(usize),
    #[error("invalid salt hex: {0}")]
    SaltHex(String),
}

/// The two payloads printed into the matrix and linear codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadPair {
    /// `saltHex|ciphertextPart1`, printed into the matrix code.
    pub matrix: String,
    /// `ciphertextPart2`, printed into the linear code.
    pub linear: String,
}

/// Seals a secret with the given 16-byte salt.
pub fn seal_with_salt(master: &MasterKey, secret: &str, salt: &[u8]) -> Result<PayloadPair, SealError> {
    let salt: &[u8; SALT_LEN] = salt
        .try_into()
        .map_err(|_| SealError::SaltLength(salt.len()))?;
    Ok(seal_bytes(master, secret, salt))
}

/// Seals a secret with a salt given as hex text.
pub fn seal_with_salt_hex(master: &MasterKey, secret: &str, salt_hex: &str) -> Result<PayloadPair, SealError> {
    let salt = hex::decode(salt_hex).map_err(|e| SealError::SaltHex(e.to_string()))?;
    seal_with_salt(master, secret, &salt)
}

/// Seals a secret with a fresh salt from the OS entropy source.
pub fn seal(master: &MasterKey, secret: &str) -> PayloadPair {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    seal_bytes(master, secret, &salt)
}

/// Seals with a salt whose length is known to be valid.
pub(crate) fn seal_bytes(master: &MasterKey, secret: &str, salt: &[u8; SALT_LEN]) -> PayloadPair {
    let key = derive_key(master, salt);
    let cipher = Aes128CbcEnc::new(GenericArray::from_slice(&key[..]), GenericArray::from_slice(salt));
    let ciphertext = STANDARD.encode(cipher.encrypt_padded_vec_mut::<Pkcs7>(secret.as_bytes()));

    let (first, second) = ciphertext.split_at(ciphertext.len() / 2);
    PayloadPair {
        matrix: format!("{}{}{}", hex::encode(salt), FIELD_SEPARATOR, first),
        linear: second.to_owned(),
    }
}
