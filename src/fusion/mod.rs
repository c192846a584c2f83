//! Payload caching and pair detection.

mod tracker;

pub use tracker::{CodeFusionTracker, FusedPair};
