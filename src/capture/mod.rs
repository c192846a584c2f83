//! Video input and frame handling.
//!
//! This module provides abstractions for pulling frames from a live
//! video source and managing scanner configuration. Frames are opaque
//! RGBA samples; decoding happens downstream.

mod config;
mod frame;
mod source;

pub use config::{CaptureConfig, ConfigError, FileConfig, OutputConfig, ScanConfig};
pub use frame::{luma, Frame, CHANNELS};
pub use source::{CaptureError, FrameSource, MockSource};
