//! Matrix and linear code decoding.
//!
//! The decoders themselves are external capabilities; this module
//! defines their seams and the per-frame orchestration:
//!
//! ```text
//! frame ─┬─ lower half (color) ──→ LinearDecoder ··· LinearReply (async)
//!        └─ grayscale ───────────→ MatrixDecoder ──→ payload (sync)
//! ```

mod dual;
mod hints;
mod linear;
mod matrix;
pub mod scripted;

pub use dual::DualCodeDecoder;
pub use hints::{LinearHints, Symbology};
pub use linear::{
    InlineLinearDecoder, LinearCompletion, LinearDecode, LinearDecoder, LinearReply,
    ThreadedLinearDecoder,
};
pub use matrix::{DecodeError, MatrixDecoder};
pub use scripted::{ScriptedMatrixDecoder, ScriptedScene};
