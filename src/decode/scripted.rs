//! Scripted decoders for demos and tests.
//!
//! A [`ScriptedScene`] records what each decoder "sees" on a given frame
//! sequence number. The scripted decoders ignore pixels and look the
//! frame up in the scene, which makes a whole scan session replayable
//! against [`MockSource`](crate::capture::MockSource).

use super::{DecodeError, LinearDecode, LinearHints, MatrixDecoder};
use crate::capture::Frame;
use crate::recovery::PayloadPair;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// What one decoder reads on one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Reading {
    /// No code visible.
    #[default]
    Miss,
    /// A decoded payload.
    Payload(String),
    /// A decoder backend error.
    Error(String),
}

impl Reading {
    fn to_result(&self) -> Result<Option<String>, DecodeError> {
        match self {
            Reading::Miss => Ok(None),
            Reading::Payload(text) => Ok(Some(text.clone())),
            Reading::Error(message) => Err(DecodeError::Backend(message.clone())),
        }
    }
}

/// Readings of both channels on one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shot {
    pub matrix: Reading,
    pub linear: Reading,
}

/// Frame-by-frame script of decoder readings.
#[derive(Debug, Clone, Default)]
pub struct ScriptedScene {
    shots: BTreeMap<u64, Shot>,
}

impl ScriptedScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a payload pair on every frame in `frames`.
    pub fn hold(mut self, frames: RangeInclusive<u64>, pair: &PayloadPair) -> Self {
        for sequence in frames {
            let shot = self.shots.entry(sequence).or_default();
            shot.matrix = Reading::Payload(pair.matrix.clone());
            shot.linear = Reading::Payload(pair.linear.clone());
        }
        self
    }

    /// Shows the linear code of `pair` on frame `first` and its matrix code
    /// on the frame after.
    ///
    /// With an inline linear decoder both payloads then reach the tracker
    /// on the same tick, so a previous pair is never fused with half of
    /// this one.
    pub fn present(self, first: u64, pair: &PayloadPair) -> Self {
        self.linear(first, Reading::Payload(pair.linear.clone()))
            .matrix(first + 1, Reading::Payload(pair.matrix.clone()))
    }

    /// Sets the matrix reading on one frame.
    pub fn matrix(mut self, sequence: u64, reading: Reading) -> Self {
        self.shots.entry(sequence).or_default().matrix = reading;
        self
    }

    /// Sets the linear reading on one frame.
    pub fn linear(mut self, sequence: u64, reading: Reading) -> Self {
        self.shots.entry(sequence).or_default().linear = reading;
        self
    }

    /// Returns the readings for a frame.
    pub fn shot(&self, sequence: u64) -> Option<&Shot> {
        self.shots.get(&sequence)
    }

    /// Returns the highest scripted frame sequence, or 0 for an empty scene.
    pub fn last_sequence(&self) -> u64 {
        self.shots.keys().next_back().copied().unwrap_or(0)
    }

    /// Splits the scene into a matrix decoder and a blocking linear decoder.
    pub fn into_decoders(self) -> (ScriptedMatrixDecoder, ScriptedLinearDecode) {
        let scene = Arc::new(self);
        (
            ScriptedMatrixDecoder {
                scene: Arc::clone(&scene),
            },
            ScriptedLinearDecode {
                scene,
                resets: Arc::new(AtomicUsize::new(0)),
                fail_reset: false,
            },
        )
    }
}

/// Matrix decoder that replays a scene.
#[derive(Debug, Clone)]
pub struct ScriptedMatrixDecoder {
    scene: Arc<ScriptedScene>,
}

impl MatrixDecoder for ScriptedMatrixDecoder {
    fn decode(&mut self, frame: &Frame) -> Result<Option<String>, DecodeError> {
        match self.scene.shot(frame.sequence()) {
            Some(shot) => shot.matrix.to_result(),
            None => Ok(None),
        }
    }
}

/// Blocking linear decoder that replays a scene.
#[derive(Debug, Clone)]
pub struct ScriptedLinearDecode {
    scene: Arc<ScriptedScene>,
    resets: Arc<AtomicUsize>,
    fail_reset: bool,
}

impl ScriptedLinearDecode {
    /// Makes every reset report an error.
    pub fn with_failing_reset(mut self) -> Self {
        self.fail_reset = true;
        self
    }

    /// Returns a counter of reset calls, shared with clones.
    pub fn reset_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.resets)
    }
}

impl LinearDecode for ScriptedLinearDecode {
    fn decode(&mut self, frame: &Frame, _hints: &LinearHints) -> Result<Option<String>, DecodeError> {
        match self.scene.shot(frame.sequence()) {
            Some(shot) => shot.linear.to_result(),
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> Result<(), DecodeError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reset {
            return Err(DecodeError::Reset("scripted reset failure".into()));
        }
        Ok(())
    }
}
