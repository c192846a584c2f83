//! Fusion of matrix and linear payloads.
//!
//! The tracker caches the latest payload from each channel and hands out
//! a pair for recovery when both are present and their fusion key has
//! not been processed yet.

use crate::batch::ScanMode;
use crate::recovery::FIELD_SEPARATOR;

/// A matrix/linear payload pair ready for recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusedPair {
    pub matrix: String,
    pub linear: String,
}

impl FusedPair {
    /// Returns the deduplication key `matrix|linear`.
    pub fn fusion_key(&self) -> String {
        fusion_key(&self.matrix, &self.linear)
    }
}

fn fusion_key(matrix: &str, linear: &str) -> String {
    format!("{matrix}{FIELD_SEPARATOR}{linear}")
}

/// Caches decoded payloads and detects new pairs.
#[derive(Debug, Clone, Default)]
pub struct CodeFusionTracker {
    last_matrix: Option<String>,
    last_linear: Option<String>,
    last_processed: Option<String>,
}

impl CodeFusionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears both slots and the processed-key memo.
    pub fn reset(&mut self) {
        self.last_matrix = None;
        self.last_linear = None;
        self.last_processed = None;
    }

    /// Records a matrix payload. Returns true if the slot changed.
    pub fn observe_matrix(&mut self, payload: &str) -> bool {
        store_if_changed(&mut self.last_matrix, payload)
    }

    /// Records a linear payload, trimmed. Returns true if the slot changed.
    pub fn observe_linear(&mut self, payload: &str) -> bool {
        store_if_changed(&mut self.last_linear, payload.trim())
    }

    /// Returns the cached matrix payload.
    pub fn matrix(&self) -> Option<&str> {
        self.last_matrix.as_deref()
    }

    /// Returns the cached linear payload.
    pub fn linear(&self) -> Option<&str> {
        self.last_linear.as_deref()
    }

    /// Returns the fusion key of the cached pair, if both slots are set.
    pub fn fusion_key(&self) -> Option<String> {
        match (&self.last_matrix, &self.last_linear) {
            (Some(matrix), Some(linear)) => Some(fusion_key(matrix, linear)),
            _ => None,
        }
    }

    /// Checks the cached slots for a pair that needs recovery.
    ///
    /// A pair is returned only when both slots are set and their fusion key
    /// differs from the last processed one; the key is then recorded.
    /// In single mode both slots and the memo are cleared whenever both
    /// slots were set, whether or not a pair was returned. In batch mode
    /// they are kept, so the next pair must differ.
    pub fn take_trigger(&mut self, mode: ScanMode) -> Option<FusedPair> {
        let key = self.fusion_key()?;

        let trigger = if self.last_processed.as_deref() != Some(key.as_str()) {
            let pair = FusedPair {
                matrix: self.last_matrix.clone().unwrap_or_default(),
                linear: self.last_linear.clone().unwrap_or_default(),
            };
            self.last_processed = Some(key);
            Some(pair)
        } else {
            None
        };

        if !mode.is_batch() {
            self.reset();
        }

        trigger
    }
}

fn store_if_changed(slot: &mut Option<String>, payload: &str) -> bool {
    if slot.as_deref() == Some(payload) {
        return false;
    }
    *slot = Some(payload.to_owned());
    true
}
