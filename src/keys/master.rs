//! Process-wide master key assembly.
//!
//! The master key is the concatenation of four fragments (A, B, C, D)
//! recovered from embedded constants. It is assembled once, on first
//! use, and never changes afterwards.

use super::fragments::{
    decode_grid, decode_reversed_hex, decode_rotated_xor, decode_shifted_hex, FragmentError,
};
use std::sync::OnceLock;

const FRAGMENT_A_CIPHERTEXT: &str = "cB8aIxxxCCs7BRZheDd1OzseGTg+ZDI1eQI6awYYNTkuCwR9IhklKRwxOBE=";
const FRAGMENT_A_KEY: &str = "cB8aIxxxCCs7BRZheDd1OzseGTg+ZDI1eQI6awYYNTkuCwR9IhklKRwxOBE=";

const FRAGMENT_B_CIPHERTEXT: &str = "IhMokWdoID6I3P8tTpXGueC9Q32x7oOL0HTG7PcEA2SrdbX2WPWlQiGit+gg3YIn";
const FRAGMENT_B_KEY: &str = "YTNiYmNjOWViMGRhODFjNmQ2ODBkZmE1YjFjMzkzOGY2NjljYzVkYWMyYzk3OWI3YjhjYjg0OGRiYmJkOTA3ZGFkYzBhMjgwZDk5Zjc3YjI3MWE4YjhjZGMxOGJjNWNjY2JhOWI0NjVhZjZlYmE4MGRkYjVjZmUyZDhiOWJmOGY=";

const FRAGMENT_C_CIPHERTEXT: &str = "7FC1UcURV72qVYMY7M0WaRCroA1gWBfGMzEGXMvqqaNrX7oHt8PuYfW+R8+XeMWq";
const FRAGMENT_C_KEY: &str = "SHl+W2BwZV9BB2ZrAFxAYmUJA2RUVX4AGAR+ZkV+BwNJUV91CgJ/YHgGWEVhcWoCfmFVSx5TRARrBxprGF5UY055e1lldGdfQQBnagZZRmBkDAVlU1J+ABkHfmZAfQYCSVdYdQwEemA=";

const FRAGMENT_D_CIPHERTEXT: &str = "EaSuKwF0Yut+bmeCi0gs1Etrlp1K/CFATfZhuB7CqGAppr5RvR5m/cYdq7enCC9n";
const FRAGMENT_D_KEY: &str = "YWVkMDllY2NiYWNkYWNhMWJhZDZhYWE1YWJjNDk4YWRkMjllYWFhOWEyYjA5ZmUxZDdkYWE0N2E2OGE2YjBiMzllYzdjMWMxYWRhNTYyNzZkYzk1ODRiNWEyZTI3YmFiYWJhYTY0YmQ2MmM5OGU5YmI2ODdiNGEzOTJiODhhZDI=";

static MASTER_KEY: OnceLock<MasterKey> = OnceLock::new();

/// One of the four master key fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    A,
    B,
    C,
    D,
}

impl Fragment {
    /// All fragments in concatenation order.
    pub const ALL: [Fragment; 4] = [Fragment::A, Fragment::B, Fragment::C, Fragment::D];

    /// Decodes this fragment from its embedded constants.
    pub fn decode(self) -> Result<String, FragmentError> {
        match self {
            Fragment::A => decode_rotated_xor(FRAGMENT_A_CIPHERTEXT, FRAGMENT_A_KEY),
            Fragment::B => decode_reversed_hex(FRAGMENT_B_CIPHERTEXT, FRAGMENT_B_KEY),
            Fragment::C => decode_grid(FRAGMENT_C_CIPHERTEXT, FRAGMENT_C_KEY),
            Fragment::D => decode_shifted_hex(FRAGMENT_D_CIPHERTEXT, FRAGMENT_D_KEY),
        }
    }

    /// Value substituted when the fragment cannot be decoded.
    pub fn fallback(self) -> &'static str {
        match self {
            Fragment::A => "fallback-axel",
            Fragment::B => "fallback-2025",
            Fragment::C => "fallback-hybrid",
            Fragment::D => "fallback-key",
        }
    }
}

/// The assembled master key.
///
/// Used as the PBKDF2 password for every recovery attempt. The key text
/// holds code points up to `U+00FF`; the password bytes are its UTF-8
/// encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKey {
    text: String,
}

impl MasterKey {
    /// Returns the process-wide master key, assembling it on first use.
    pub fn global() -> &'static MasterKey {
        MASTER_KEY.get_or_init(MasterKey::assemble)
    }

    /// Assembles the master key from the embedded fragments.
    ///
    /// A fragment that fails to decode is replaced by its fallback value.
    pub fn assemble() -> Self {
        let text = Fragment::ALL
            .iter()
            .map(|&fragment| match fragment.decode() {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(?fragment, error = %e, "Fragment decode failed, using fallback");
                    fragment.fallback().to_owned()
                }
            })
            .collect::<String>();

        tracing::debug!(chars = text.chars().count(), "Master key assembled");
        Self { text }
    }

    /// Creates a master key from explicit text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the key text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the PBKDF2 password bytes (UTF-8 of the key text).
    pub fn password(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("chars", &self.text.chars().count())
            .finish_non_exhaustive()
    }
}
