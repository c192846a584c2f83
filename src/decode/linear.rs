//! Asynchronous linear-code decoding.
//!
//! A linear decode is dispatched once per tick with a [`LinearReply`]
//! and may resolve on any later tick. Completions travel back to the
//! owning session over a channel and are applied at the start of the
//! next tick.
//!
//! Decoder backends usually expose a blocking call. [`LinearDecode`]
//! captures that capability; [`ThreadedLinearDecoder`] runs it off the
//! scan thread and [`InlineLinearDecoder`] runs it on the spot.

use super::{DecodeError, LinearHints};
use crate::capture::Frame;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;

/// Outcome of one dispatched linear decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearCompletion {
    /// Sequence number of the frame the decode ran on.
    pub sequence: u64,
    /// Decoded text, a miss, or a backend error.
    pub result: Result<Option<String>, DecodeError>,
}

/// Completion handle for one dispatched linear decode.
///
/// Completing a reply after its session has been dropped is a no-op.
#[derive(Debug)]
pub struct LinearReply {
    sequence: u64,
    sender: Sender<LinearCompletion>,
}

impl LinearReply {
    /// Creates a reply that reports to the given channel.
    pub fn new(sequence: u64, sender: Sender<LinearCompletion>) -> Self {
        Self { sequence, sender }
    }

    /// Returns the sequence number of the dispatched frame.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Delivers the decode outcome.
    pub fn complete(self, result: Result<Option<String>, DecodeError>) {
        let completion = LinearCompletion {
            sequence: self.sequence,
            result,
        };
        if self.sender.send(completion).is_err() {
            tracing::trace!(sequence = self.sequence, "Linear completion dropped, session gone");
        }
    }
}

/// A blocking one-dimensional code decoder.
pub trait LinearDecode: Send {
    /// Decodes a linear code from a frame under the given hints.
    fn decode(&mut self, frame: &Frame, hints: &LinearHints) -> Result<Option<String>, DecodeError>;

    /// Resets any per-session decoder state.
    fn reset(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }
}

/// An asynchronous one-dimensional code decoder.
pub trait LinearDecoder {
    /// Starts decoding a frame. The outcome is delivered through `reply`.
    fn decode_async(&mut self, frame: Frame, hints: &LinearHints, reply: LinearReply);

    /// Resets the decoder session. Outstanding decodes may still complete.
    fn reset(&mut self) -> Result<(), DecodeError>;
}

impl<D: LinearDecoder + ?Sized> LinearDecoder for Box<D> {
    fn decode_async(&mut self, frame: Frame, hints: &LinearHints, reply: LinearReply) {
        (**self).decode_async(frame, hints, reply)
    }

    fn reset(&mut self) -> Result<(), DecodeError> {
        (**self).reset()
    }
}

/// Runs a blocking decoder on the caller's thread.
///
/// The reply is completed before `decode_async` returns, so the result
/// lands on the next tick. Deterministic; used for replay and tests.
#[derive(Debug)]
pub struct InlineLinearDecoder<D> {
    inner: D,
}

impl<D: LinearDecode> InlineLinearDecoder<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// Returns the wrapped decoder.
    pub fn get_ref(&self) -> &D {
        &self.inner
    }
}

impl<D: LinearDecode> LinearDecoder for InlineLinearDecoder<D> {
    fn decode_async(&mut self, frame: Frame, hints: &LinearHints, reply: LinearReply) {
        reply.complete(self.inner.decode(&frame, hints));
    }

    fn reset(&mut self) -> Result<(), DecodeError> {
        self.inner.reset()
    }
}

/// A frame waiting for the worker.
struct Job {
    frame: Frame,
    hints: LinearHints,
    reply: LinearReply,
}

/// Runs blocking decodes on one long-lived worker thread.
///
/// At most one frame waits behind the decode in progress. A newer frame
/// replaces the waiting one, whose reply is dropped without completing,
/// so a slow backend only ever sees the freshest frame.
pub struct ThreadedLinearDecoder<D> {
    inner: Arc<Mutex<D>>,
    jobs: Sender<Job>,
    pending: Receiver<Job>,
    worker: Option<Receiver<Job>>,
}

impl<D: LinearDecode + 'static> ThreadedLinearDecoder<D> {
    pub fn new(inner: D) -> Self {
        let (jobs, pending) = bounded(1);
        Self {
            inner: Arc::new(Mutex::new(inner)),
            jobs,
            worker: Some(pending.clone()),
            pending,
        }
    }

    /// Starts the worker on first use.
    fn ensure_worker(&mut self) {
        let Some(jobs) = self.worker.take() else {
            return;
        };
        let inner = Arc::clone(&self.inner);

        let spawned = thread::Builder::new()
            .name("linear-decode".into())
            .spawn(move || {
                for job in jobs {
                    let result = match inner.lock() {
                        Ok(mut decoder) => decoder.decode(&job.frame, &job.hints),
                        Err(_) => Err(DecodeError::Backend("decoder lock poisoned".into())),
                    };
                    job.reply.complete(result);
                }
                tracing::trace!("Linear decode worker exiting");
            });

        if let Err(e) = spawned {
            tracing::warn!(error = %e, "Failed to spawn linear decode worker");
        }
    }

    /// Drops the waiting frame, if any. Returns its sequence number.
    fn evict_pending(&self) -> Option<u64> {
        self.pending.try_recv().ok().map(|job| job.reply.sequence())
    }
}

impl<D: LinearDecode + 'static> LinearDecoder for ThreadedLinearDecoder<D> {
    fn decode_async(&mut self, frame: Frame, hints: &LinearHints, reply: LinearReply) {
        self.ensure_worker();

        if let Some(stale) = self.evict_pending() {
            tracing::trace!(sequence = stale, "Linear decode superseded");
        }

        let job = Job {
            frame,
            hints: hints.clone(),
            reply,
        };
        match self.jobs.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) | Err(TrySendError::Disconnected(job)) => {
                tracing::debug!(sequence = job.reply.sequence(), "Linear decode worker unavailable, frame dropped");
            }
        }
    }

    fn reset(&mut self) -> Result<(), DecodeError> {
        self.evict_pending();
        match self.inner.lock() {
            Ok(mut decoder) => decoder.reset(),
            Err(_) => Err(DecodeError::Reset("decoder lock poisoned".into())),
        }
    }
}

impl<D> std::fmt::Debug for ThreadedLinearDecoder<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadedLinearDecoder").finish_non_exhaustive()
    }
}
