//! Result collection and scan events.
//!
//! In single mode each recovered secret replaces the previous result.
//! In batch mode results accumulate until an optional target is reached,
//! at which point the session stops itself.

mod collector;
mod event;

pub use collector::{Accepted, BatchCollector, ScanMode};
pub use event::ScanEvent;
