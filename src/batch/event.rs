//! Events emitted by a scan session.

use chrono::{DateTime, Utc};
use std::fmt;

/// Notification delivered to the host over the session's event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// The session stopped, either on request or after reaching its target.
    ScanningStopped,
    /// A secret was recovered.
    SecretFound {
        /// The recovered secret.
        secret: String,
        /// All results held by the session after this one was added.
        results: Vec<String>,
        /// When the secret was accepted.
        found_at: DateTime<Utc>,
    },
}

impl ScanEvent {
    /// Returns the recovered secret, if this is a `SecretFound` event.
    pub fn secret(&self) -> Option<&str> {
        match self {
            ScanEvent::SecretFound { secret, .. } => Some(secret),
            ScanEvent::ScanningStopped => None,
        }
    }

    /// Returns the accumulated results, if this is a `SecretFound` event.
    pub fn results(&self) -> Option<&[String]> {
        match self {
            ScanEvent::SecretFound { results, .. } => Some(results),
            ScanEvent::ScanningStopped => None,
        }
    }
}

impl fmt::Display for ScanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanEvent::ScanningStopped => write!(f, "scanning stopped"),
            ScanEvent::SecretFound {
                secret,
                results,
                found_at,
            } => write!(
                f,
                "[{}] secret found: {} ({} result(s))",
                found_at.to_rfc3339(),
                secret,
                results.len()
            ),
        }
    }
}
