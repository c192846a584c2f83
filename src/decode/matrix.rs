//! Matrix-code decoding capability.

use crate::capture::Frame;
use thiserror::Error;

/// Errors reported by a decoder backend.
///
/// A frame with no visible code is not an error; decoders report it as
/// `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame buffer does not match its dimensions")]
    InvalidFrame,
    #[error("decoder backend failed: {0}")]
    Backend(String),
    #[error("failed to reset decoder session: {0}")]
    Reset(String),
}

/// A synchronous two-dimensional code decoder.
///
/// Receives the grayscale copy of each sampled frame and returns the
/// decoded text, or `None` when no code is visible.
pub trait MatrixDecoder {
    /// Decodes a matrix code from a frame.
    fn decode(&mut self, frame: &Frame) -> Result<Option<String>, DecodeError>;
}

impl<D: MatrixDecoder + ?Sized> MatrixDecoder for Box<D> {
    fn decode(&mut self, frame: &Frame) -> Result<Option<String>, DecodeError> {
        (**self).decode(frame)
    }
}
