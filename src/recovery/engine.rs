//! Key derivation and decryption of fused payloads.
//!
//! # Scheme
//!
//! - PBKDF2-HMAC-SHA1, 1000 iterations, 128-bit output, password = the
//!   master key, salt = the bundle salt
//! - AES-128-CBC with PKCS#7 padding, IV = the same salt bytes,
//!   zero-filled or cut to 16 bytes when the salt has another length
//! - UTF-8 plaintext, accepted when at least 4 UTF-16 code units long
//!
//! There is no authentication tag. A wrong key usually fails padding or
//! UTF-8 decoding, but can also yield short garbage; the length check is
//! the only filter.

use super::bundle::CipherBundle;
use crate::keys::MasterKey;
use cbc::cipher::{block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use thiserror::Error;
use zeroize::Zeroizing;

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 1000;

/// Derived key length in bytes (AES-128).
pub const KEY_LEN: usize = 16;

/// CBC IV length in bytes.
pub const IV_LEN: usize = 16;

/// Minimum accepted plaintext length.
pub const MIN_SECRET_LEN: usize = 4;

pub(crate) type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
pub(crate) type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

/// Failures inside the cryptographic steps of a recovery attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoFailure {
    #[error("invalid salt hex: {0}")]
    SaltHex(String),
    #[error("invalid ciphertext base64: {0}")]
    Base64(String),
    #[error("bad PKCS#7 padding")]
    Padding,
    #[error("plaintext is not valid UTF-8")]
    Utf8,
}

/// Why a recovery attempt produced no secret.
///
/// None of these are fatal to a scan: the tracker logs and drops them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("matrix payload has {fields} field(s), expected 2")]
    MalformedPayload { fields: usize },
    #[error(transparent)]
    Crypto(#[from] CryptoFailure),
    #[error("plaintext of length {length} rejected (minimum 4)")]
    Rejected { length: usize },
}

/// Failure categories, for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    MalformedPayload,
    Crypto,
    Rejected,
}

impl RecoveryError {
    /// Returns the failure category.
    pub fn kind(&self) -> FailureKind {
        match self {
            RecoveryError::MalformedPayload { .. } => FailureKind::MalformedPayload,
            RecoveryError::Crypto(_) => FailureKind::Crypto,
            RecoveryError::Rejected { .. } => FailureKind::Rejected,
        }
    }
}

/// Derives the per-bundle AES key from the master key and salt.
pub fn derive_key(master: &MasterKey, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha1>(master.password(), salt, PBKDF2_ITERATIONS, &mut *key);
    key
}

/// Builds the CBC IV from the salt bytes.
///
/// A 16-byte salt is used as is. Shorter salts are padded with zero bytes
/// and longer ones keep their first 16 bytes; the key derivation still
/// sees the whole salt.
pub fn iv_from_salt(salt: &[u8]) -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    let len = salt.len().min(IV_LEN);
    iv[..len].copy_from_slice(&salt[..len]);
    iv
}

/// Recovers secrets from fused matrix/linear payloads.
#[derive(Debug, Clone)]
pub struct SecretRecoveryEngine {
    master: MasterKey,
}

impl SecretRecoveryEngine {
    /// Creates an engine keyed by the given master key.
    pub fn new(master: MasterKey) -> Self {
        Self { master }
    }

    /// Returns the master key this engine derives from.
    pub fn master_key(&self) -> &MasterKey {
        &self.master
    }

    /// Attempts to recover the secret carried by a payload pair.
    pub fn recover(&self, matrix: &str, linear: &str) -> Result<String, RecoveryError> {
        let bundle = CipherBundle::parse(matrix, linear)?;
        let salt = bundle.salt()?;
        let ciphertext = bundle.ciphertext()?;

        let key = derive_key(&self.master, &salt);
        let iv = iv_from_salt(&salt);
        let cipher = Aes128CbcDec::new(GenericArray::from_slice(&key[..]), GenericArray::from_slice(&iv));
        let plaintext = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CryptoFailure::Padding)?;

        let secret = String::from_utf8(plaintext).map_err(|_| CryptoFailure::Utf8)?;

        let length = secret.encode_utf16().count();
        if length < MIN_SECRET_LEN {
            return Err(RecoveryError::Rejected { length });
        }

        tracing::debug!(salt = bundle.salt_hex(), length, "Recovered secret");
        Ok(secret)
    }
}

impl Default for SecretRecoveryEngine {
    fn default() -> Self {
        Self::new(MasterKey::global().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_MATRIX: &str = "00112233445566778899aabbccddeeff|+HR9051cYJJB";
    const HELLO_LINEAR: &str = "kvQkAuKypA==";

    #[test]
    fn test_derive_key_known_value() {
        let salt = hex::decode("00112233445566778899aabbccddeeff").unwrap();
        let key = derive_key(MasterKey::global(), &salt);
        assert_eq!(hex::encode(*key), "f5158714a5f6ee05affa845339f1c4c9");
    }

    #[test]
    fn test_recover_known_pair() {
        let engine = SecretRecoveryEngine::default();
        assert_eq!(engine.recover(HELLO_MATRIX, HELLO_LINEAR).unwrap(), "HELLO123");
    }

    #[test]
    fn test_short_plaintext_rejected() {
        // "ABC" sealed under the global master key
        let engine = SecretRecoveryEngine::default();
        let result = engine.recover("0f1e2d3c4b5a69788796a5b4c3d2e1f0|kFNzW64xHsrK", "qxp7NrQ7rg==");
        assert_eq!(result, Err(RecoveryError::Rejected { length: 3 }));
        assert_eq!(result.unwrap_err().kind(), FailureKind::Rejected);
    }

    #[test]
    fn test_malformed_payload() {
        let engine = SecretRecoveryEngine::default();
        let result = engine.recover("00112233445566778899aabbccddeeff+HR9051cYJJB", HELLO_LINEAR);
        assert_eq!(result.unwrap_err().kind(), FailureKind::MalformedPayload);
    }

    #[test]
    fn test_wrong_master_key_fails_quietly() {
        let engine = SecretRecoveryEngine::new(MasterKey::from_text("not the key"));
        assert!(engine.recover(HELLO_MATRIX, HELLO_LINEAR).is_err());
    }

    /// Seals with a salt of any length, building the IV the way
    /// recovery does.
    fn seal_loose(secret: &str, salt: &[u8]) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        use cbc::cipher::BlockEncryptMut;

        let key = derive_key(MasterKey::global(), salt);
        let iv = iv_from_salt(salt);
        let ciphertext = Aes128CbcEnc::new(GenericArray::from_slice(&key[..]), GenericArray::from_slice(&iv))
            .encrypt_padded_vec_mut::<Pkcs7>(secret.as_bytes());
        format!("{}|{}", hex::encode(salt), STANDARD.encode(ciphertext))
    }

    #[test]
    fn test_iv_from_salt_pads_and_cuts() {
        assert_eq!(iv_from_salt(&[0xab, 0xcd])[..3], [0xab, 0xcd, 0x00]);
        assert_eq!(iv_from_salt(&[7u8; 16]), [7u8; 16]);

        let long: Vec<u8> = (0..20).collect();
        let iv = iv_from_salt(&long);
        assert_eq!(iv.to_vec(), long[..16].to_vec());
    }

    #[test]
    fn test_short_salt_recovers() {
        let engine = SecretRecoveryEngine::default();
        let matrix = seal_loose("SHORTSALT", &[0x00, 0x11]);
        assert_eq!(engine.recover(&matrix, "").unwrap(), "SHORTSALT");
    }

    #[test]
    fn test_long_salt_recovers() {
        let engine = SecretRecoveryEngine::default();
        let salt: Vec<u8> = (0..24).collect();
        let matrix = seal_loose("LONGSALT", &salt);
        assert_eq!(engine.recover(&matrix, "").unwrap(), "LONGSALT");
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let engine = SecretRecoveryEngine::default();
        let result = engine.recover(HELLO_MATRIX, "kvQk");
        assert_eq!(result.unwrap_err().kind(), FailureKind::Crypto);
    }

    #[test]
    fn test_swapped_halves_fail() {
        let engine = SecretRecoveryEngine::default();
        let result = engine.recover("00112233445566778899aabbccddeeff|kvQkAuKypA==", "+HR9051cYJJB");
        assert!(result.is_err());
    }
}
