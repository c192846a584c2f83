//! Scan session counters.

use crate::recovery::FailureKind;

/// Counters accumulated by a session.
///
/// Counters are cumulative across start/stop cycles of the same session;
/// `scanning` and `results` describe the current state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Whether the session is currently scanning.
    pub scanning: bool,
    /// Ticks processed while scanning.
    pub ticks: u64,
    /// Ticks skipped for lack of a full frame.
    pub skipped_ticks: u64,
    /// Frames captured and decoded.
    pub frames: u64,
    /// Frame captures that failed.
    pub capture_errors: u64,
    /// Linear payloads delivered by completions.
    pub linear_reads: u64,
    /// Recovery attempts started.
    pub recovery_attempts: u64,
    /// Attempts dropped for a malformed matrix payload.
    pub malformed_payloads: u64,
    /// Attempts dropped in key derivation or decryption.
    pub crypto_failures: u64,
    /// Attempts whose plaintext was too short.
    pub rejected_plaintexts: u64,
    /// Secrets recovered.
    pub secrets_found: u64,
    /// Results currently held.
    pub results: usize,
}

impl ScanStats {
    pub(crate) fn record_failure(&mut self, kind: FailureKind) {
        match kind {
            FailureKind::MalformedPayload => self.malformed_payloads += 1,
            FailureKind::Crypto => self.crypto_failures += 1,
            FailureKind::Rejected => self.rejected_plaintexts += 1,
        }
    }

    /// Returns the total number of failed recovery attempts.
    pub fn failures(&self) -> u64 {
        self.malformed_payloads + self.crypto_failures + self.rejected_plaintexts
    }
}
