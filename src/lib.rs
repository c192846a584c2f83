//! Hybrid Scanner Library
//!
//! Recovers a text secret split across two optical codes seen by a
//! camera: a matrix code carrying the salt and the first half of an
//! AES-CBC ciphertext, and a linear barcode carrying the second half.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! capture → decode (matrix + linear) → fusion → recovery → batch → events
//!                                                  ↑
//!                                                keys
//! ```
//!
//! [`sampler::Session`] drives the loop one tick at a time.
//!
//! # Design Principles
//!
//! - **Decoders are external**: matrix and linear decoding sit behind traits
//! - **Failures are quiet**: a bad pair is logged and dropped, the loop keeps going
//! - **No authentication**: a plaintext of at least four characters is accepted
//! - **Explicit session state**: no globals besides the master key
//!
//! # Example
//!
//! ```no_run
//! use hybrid_scanner::{
//!     batch::ScanMode,
//!     capture::{CaptureConfig, FrameSource, MockSource},
//!     decode::{DualCodeDecoder, InlineLinearDecoder, LinearHints, ScriptedScene},
//!     keys::MasterKey,
//!     recovery::{seal, SecretRecoveryEngine},
//!     sampler::Session,
//! };
//!
//! // Script a scene showing one sealed secret
//! let pair = seal(MasterKey::global(), "correct horse");
//! let (matrix, linear) = ScriptedScene::new().present(1, &pair).into_decoders();
//!
//! let mut source = MockSource::new();
//! source.open(&CaptureConfig::default()).unwrap();
//!
//! let decoder = DualCodeDecoder::new(matrix, InlineLinearDecoder::new(linear), LinearHints::default());
//! let mut session = Session::new(source, decoder, SecretRecoveryEngine::default());
//! let events = session.events();
//!
//! session.start(ScanMode::Single);
//! session.run(Some(10));
//!
//! for event in events.try_iter() {
//!     println!("{}", event);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod batch;
pub mod capture;
pub mod decode;
pub mod fusion;
pub mod keys;
pub mod metrics;
pub mod recovery;
pub mod sampler;
pub mod samples;

// Re-export commonly used types at crate root
pub use batch::{BatchCollector, ScanEvent, ScanMode};
pub use capture::{CaptureConfig, FileConfig, Frame, FrameSource, MockSource};
pub use decode::{DualCodeDecoder, LinearDecoder, LinearHints, MatrixDecoder};
pub use fusion::CodeFusionTracker;
pub use keys::MasterKey;
pub use recovery::{PayloadPair, RecoveryError, SecretRecoveryEngine};
pub use sampler::{ScanStats, Session, StopHandle};
pub use samples::SampleGenerator;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
