//! Video source abstraction for frame capture.
//!
//! This module provides a trait-based abstraction over a live video
//! feed, allowing for both real camera input and mock implementations
//! for testing.

use super::{CaptureConfig, Frame};
use thiserror::Error;

/// Errors that can occur during video source operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to configure video source: {0}")]
    ConfigFailed(String),
    #[error("video source not initialized")]
    NotInitialized,
}

/// Trait for video source implementations.
///
/// The sampler polls [`has_enough_data`](FrameSource::has_enough_data)
/// before every capture; a source that stalls simply keeps returning
/// `false` and the scan loop keeps skipping.
pub trait FrameSource {
    /// Opens and initializes the source with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CaptureError>;

    /// Returns true when a full frame is buffered and ready to draw.
    fn has_enough_data(&self) -> bool;

    /// Captures a single RGBA frame.
    fn capture(&mut self) -> Result<Frame, CaptureError>;

    /// Checks if the source is currently open.
    fn is_open(&self) -> bool;

    /// Closes the source and releases resources.
    fn close(&mut self);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CaptureError> {
        (**self).open(config)
    }

    fn has_enough_data(&self) -> bool {
        (**self).has_enough_data()
    }

    fn capture(&mut self) -> Result<Frame, CaptureError> {
        (**self).capture()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Mock video source that generates synthetic frames.
///
/// Frames carry a flat gray test pattern; scripted decoders key their
/// payloads off the frame sequence number rather than the pixels.
/// The first `warmup` polls report insufficient data, like a camera
/// that has not buffered its first frame yet.
#[derive(Debug, Default)]
pub struct MockSource {
    config: Option<CaptureConfig>,
    sequence: u64,
    warmup: u32,
    polls: std::cell::Cell<u32>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source that reports no data for the first `polls` checks.
    pub fn with_warmup(polls: u32) -> Self {
        Self {
            warmup: polls,
            ..Self::default()
        }
    }
}

impl FrameSource for MockSource {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CaptureError> {
        config
            .validate()
            .map_err(|e| CaptureError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        self.polls.set(0);
        tracing::info!("MockSource opened with config: {:?}", config);
        Ok(())
    }

    fn has_enough_data(&self) -> bool {
        if self.config.is_none() {
            return false;
        }
        let polls = self.polls.get();
        self.polls.set(polls.saturating_add(1));
        polls >= self.warmup
    }

    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let config = self.config.as_ref().ok_or(CaptureError::NotInitialized)?;

        self.sequence += 1;
        let shade = (self.sequence % 256) as u8;
        Ok(Frame::filled(
            config.width,
            config.height,
            [shade, shade, shade, 255],
            self.sequence,
        ))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("MockSource closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_lifecycle() {
        let mut source = MockSource::new();
        let config = CaptureConfig::with_dimensions(8, 8);

        assert!(!source.is_open());
        assert!(!source.has_enough_data());

        source.open(&config).unwrap();
        assert!(source.is_open());
        assert!(source.has_enough_data());

        let frame = source.capture().unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.sequence(), 1);

        let frame2 = source.capture().unwrap();
        assert_eq!(frame2.sequence(), 2);

        source.close();
        assert!(!source.is_open());
    }

    #[test]
    fn test_capture_without_open() {
        let mut source = MockSource::new();
        assert!(matches!(
            source.capture(),
            Err(CaptureError::NotInitialized)
        ));
    }

    #[test]
    fn test_warmup_reports_insufficient_data() {
        let mut source = MockSource::with_warmup(2);
        source.open(&CaptureConfig::with_dimensions(4, 4)).unwrap();

        assert!(!source.has_enough_data());
        assert!(!source.has_enough_data());
        assert!(source.has_enough_data());
    }
}
