//! Dual-channel decoding of a sampled frame.

use super::{DecodeError, LinearDecoder, LinearHints, LinearReply, MatrixDecoder};
use crate::capture::Frame;

/// Wraps a matrix decoder and a linear decoder over the same frame.
///
/// Per frame the lower half of the color image is cropped and dispatched
/// to the linear decoder; the full frame is then converted to grayscale
/// and decoded synchronously by the matrix decoder.
#[derive(Debug)]
pub struct DualCodeDecoder<M, L> {
    matrix: M,
    linear: L,
    hints: LinearHints,
}

impl<M: MatrixDecoder, L: LinearDecoder> DualCodeDecoder<M, L> {
    /// Creates a decoder pair with the given linear hints.
    pub fn new(matrix: M, linear: L, hints: LinearHints) -> Self {
        Self {
            matrix,
            linear,
            hints,
        }
    }

    /// Returns the hints passed to every linear dispatch.
    pub fn hints(&self) -> &LinearHints {
        &self.hints
    }

    /// Decodes one frame.
    ///
    /// Returns the matrix payload, if any. The linear outcome arrives
    /// later through `reply`. Decoder errors are logged and treated like
    /// a miss.
    pub fn process(&mut self, mut frame: Frame, reply: LinearReply) -> Option<String> {
        let sequence = frame.sequence();
        if !frame.is_valid() {
            tracing::debug!(sequence, error = %DecodeError::InvalidFrame, "Skipping frame");
            return None;
        }

        self.linear.decode_async(frame.lower_half(), &self.hints, reply);

        frame.to_grayscale();
        match self.matrix.decode(&frame) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(sequence, error = %e, "Matrix decode failed");
                None
            }
        }
    }

    /// Resets the linear decoder session.
    pub fn reset_linear(&mut self) -> Result<(), DecodeError> {
        self.linear.reset()
    }

    /// Returns the matrix decoder.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }

    /// Returns the linear decoder.
    pub fn linear(&self) -> &L {
        &self.linear
    }

    /// Returns the linear decoder mutably.
    pub fn linear_mut(&mut self) -> &mut L {
        &mut self.linear
    }
}
