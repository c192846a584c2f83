//! The scan loop.
//!
//! A [`Session`] samples frames from a [`FrameSource`](crate::capture::FrameSource),
//! runs both decoders, fuses their payloads and hands new pairs to the
//! recovery engine. One call to [`Session::tick`] is one iteration of
//! the loop; [`Session::run`] paces ticks at the configured frame rate.
//!
//! ```text
//! tick ─→ apply linear completions
//!      ─→ has_enough_data? ── no ──→ skip
//!      ─→ capture ─→ DualCodeDecoder ─→ CodeFusionTracker
//!                                            │ new pair
//!                                            ▼
//!                    events ←── BatchCollector ←── SecretRecoveryEngine
//! ```

mod session;
mod stats;

pub use session::{Session, StopHandle, Tick};
pub use stats::ScanStats;
