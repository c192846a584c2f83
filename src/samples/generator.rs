//! ChaCha-backed sample generator.

use crate::keys::MasterKey;
use crate::recovery::{seal_bytes, PayloadPair, SALT_LEN};
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

/// Characters used for generated secrets.
pub const SECRET_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const MIN_LEN: usize = 8;
const MAX_LEN: usize = 24;

/// A generated secret and the payload pair that carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub secret: String,
    pub salt: [u8; SALT_LEN],
    pub pair: PayloadPair,
}

/// Generates random secrets and seals them under a master key.
pub struct SampleGenerator {
    rng: ChaCha20Rng,
    master: MasterKey,
}

impl SampleGenerator {
    /// Creates a reproducible generator.
    pub fn from_seed(seed: u64, master: MasterKey) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            master,
        }
    }

    /// Creates a generator seeded from the OS entropy source.
    pub fn from_os_entropy(master: MasterKey) -> Self {
        let mut seed = [0u8; 32];
        rand_core::OsRng.fill_bytes(&mut seed);
        Self {
            rng: ChaCha20Rng::from_seed(seed),
            master,
        }
    }

    /// Generates an alphanumeric secret of 8 to 24 characters.
    pub fn secret(&mut self) -> String {
        let span = (MAX_LEN - MIN_LEN + 1) as u32;
        let len = MIN_LEN + (self.rng.next_u32() % span) as usize;
        (0..len)
            .map(|_| {
                let idx = self.rng.next_u32() as usize % SECRET_ALPHABET.len();
                SECRET_ALPHABET[idx] as char
            })
            .collect()
    }

    /// Generates a random salt.
    pub fn salt(&mut self) -> [u8; SALT_LEN] {
        let mut salt = [0u8; SALT_LEN];
        self.rng.fill_bytes(&mut salt);
        salt
    }

    /// Generates a secret and seals it with a fresh salt.
    pub fn sample(&mut self) -> Sample {
        let secret = self.secret();
        self.seal(secret)
    }

    /// Seals a given secret with a fresh salt.
    pub fn seal(&mut self, secret: String) -> Sample {
        let salt = self.salt();
        let pair = seal_bytes(&self.master, &secret, &salt);
        Sample { secret, salt, pair }
    }

    /// Generates `count` samples.
    pub fn batch(&mut self, count: usize) -> Vec<Sample> {
        (0..count).map(|_| self.sample()).collect()
    }
}

impl std::fmt::Debug for SampleGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleGenerator")
            .field("rng", &"[ChaCha20Rng]")
            .finish()
    }
}
