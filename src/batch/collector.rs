//! Single and batch result collection.

use super::ScanEvent;
use crate::capture::ScanConfig;
use chrono::Utc;

/// How recovered secrets are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Keep only the latest secret; a new pair must be seen before each
    /// recovery.
    #[default]
    Single,
    /// Accumulate secrets. A `target` above zero stops the session once
    /// that many have been collected.
    Batch {
        /// Number of results to collect (0 = unbounded).
        target: usize,
    },
}

impl ScanMode {
    /// Builds the mode from the `[scan]` config section.
    pub fn from_config(config: &ScanConfig) -> Self {
        if config.batch {
            ScanMode::Batch {
                target: config.target,
            }
        } else {
            ScanMode::Single
        }
    }

    /// Returns true in batch mode.
    pub fn is_batch(&self) -> bool {
        matches!(self, ScanMode::Batch { .. })
    }

    /// Returns the stop target, if one is set.
    pub fn target(&self) -> Option<usize> {
        match self {
            ScanMode::Batch { target } if *target > 0 => Some(*target),
            _ => None,
        }
    }
}

/// Outcome of accepting a secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// Event to deliver to the host.
    pub event: ScanEvent,
    /// True when the batch target has been reached.
    pub target_reached: bool,
}

/// Holds the results of one scan session.
#[derive(Debug, Clone, Default)]
pub struct BatchCollector {
    mode: ScanMode,
    results: Vec<String>,
}

impl BatchCollector {
    pub fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            results: Vec::new(),
        }
    }

    /// Clears results and switches to a new mode.
    pub fn reset(&mut self, mode: ScanMode) {
        self.mode = mode;
        self.results.clear();
    }

    /// Returns the current mode.
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Returns the collected results in acceptance order.
    pub fn results(&self) -> &[String] {
        &self.results
    }

    /// Records a recovered secret.
    ///
    /// Duplicates are kept in batch mode.
    pub fn accept(&mut self, secret: String) -> Accepted {
        match self.mode {
            ScanMode::Single => {
                self.results.clear();
                self.results.push(secret.clone());
            }
            ScanMode::Batch { .. } => self.results.push(secret.clone()),
        }

        let target_reached = self
            .mode
            .target()
            .is_some_and(|target| self.results.len() >= target);

        Accepted {
            event: ScanEvent::SecretFound {
                secret,
                results: self.results.clone(),
                found_at: Utc::now(),
            },
            target_reached,
        }
    }
}
