//! Secret recovery from fused payload pairs.
//!
//! The matrix payload carries the salt and the first half of a base64
//! AES-CBC ciphertext; the linear payload carries the second half. This
//! module parses the pair, derives the key from the master key, decrypts,
//! and validates the plaintext. It also provides the inverse (sealing)
//! used to produce payload pairs.

mod bundle;
mod engine;
mod seal;

pub use bundle::{CipherBundle, FIELD_SEPARATOR};
pub use engine::{
    derive_key, iv_from_salt, CryptoFailure, FailureKind, RecoveryError, SecretRecoveryEngine, IV_LEN, KEY_LEN,
    MIN_SECRET_LEN, PBKDF2_ITERATIONS,
};
pub use seal::{seal, seal_with_salt, seal_with_salt_hex, PayloadPair, SealError, SALT_LEN};
pub(crate) use seal::seal_bytes;
