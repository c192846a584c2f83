//! Scan session state machine.

use super::ScanStats;
use crate::batch::{BatchCollector, ScanEvent, ScanMode};
use crate::capture::FrameSource;
use crate::decode::{DualCodeDecoder, LinearCompletion, LinearDecoder, LinearReply, MatrixDecoder};
use crate::fusion::{CodeFusionTracker, FusedPair};
use crate::recovery::SecretRecoveryEngine;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The session is not scanning.
    Idle,
    /// No frame was processed (source not ready or capture failed).
    Skipped,
    /// A frame was captured and decoded.
    Sampled,
}

/// Requests a stop from another thread.
///
/// The request is honoured at the start of the session's next tick.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    /// Asks the session to stop.
    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Returns true if a stop has been requested and not yet honoured.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }

    fn clear(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

/// A scan session: frame sampling, dual decode, fusion and recovery.
///
/// The source must be opened by the caller before scanning starts.
/// Events are delivered on the channel returned by [`events`](Self::events).
pub struct Session<S, M, L> {
    source: S,
    decoder: DualCodeDecoder<M, L>,
    engine: SecretRecoveryEngine,
    tracker: CodeFusionTracker,
    collector: BatchCollector,
    scanning: bool,
    tick_interval: Duration,
    completions_tx: Sender<LinearCompletion>,
    completions_rx: Receiver<LinearCompletion>,
    events_tx: Sender<ScanEvent>,
    events_rx: Receiver<ScanEvent>,
    stop: StopHandle,
    stats: ScanStats,
}

impl<S, M, L> Session<S, M, L>
where
    S: FrameSource,
    M: MatrixDecoder,
    L: LinearDecoder,
{
    /// Creates an idle session ticking at 30 Hz.
    pub fn new(source: S, decoder: DualCodeDecoder<M, L>, engine: SecretRecoveryEngine) -> Self {
        let (completions_tx, completions_rx) = unbounded();
        let (events_tx, events_rx) = unbounded();

        Self {
            source,
            decoder,
            engine,
            tracker: CodeFusionTracker::new(),
            collector: BatchCollector::default(),
            scanning: false,
            tick_interval: Duration::from_secs(1) / 30,
            completions_tx,
            completions_rx,
            events_tx,
            events_rx,
            stop: StopHandle::default(),
            stats: ScanStats::default(),
        }
    }

    /// Sets the delay between ticks used by [`run`](Self::run).
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Returns a receiver for session events.
    pub fn events(&self) -> Receiver<ScanEvent> {
        self.events_rx.clone()
    }

    /// Returns a handle that can stop the session from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Returns true while scanning.
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Returns the current scan mode.
    pub fn mode(&self) -> ScanMode {
        self.collector.mode()
    }

    /// Returns the results collected so far.
    pub fn results(&self) -> &[String] {
        self.collector.results()
    }

    /// Returns a snapshot of the session counters.
    pub fn stats(&self) -> ScanStats {
        ScanStats {
            scanning: self.scanning,
            results: self.collector.results().len(),
            ..self.stats.clone()
        }
    }

    /// Returns the frame source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the frame source mutably.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns the decoder pair.
    pub fn decoder(&self) -> &DualCodeDecoder<M, L> {
        &self.decoder
    }

    /// Returns the decoder pair mutably.
    pub fn decoder_mut(&mut self) -> &mut DualCodeDecoder<M, L> {
        &mut self.decoder
    }

    /// Starts scanning in the given mode.
    ///
    /// Clears cached payloads, the processed-pair memo and previous
    /// results. Linear completions still pending from an earlier run are
    /// discarded. Does nothing if already scanning.
    pub fn start(&mut self, mode: ScanMode) {
        if self.scanning {
            return;
        }

        self.tracker.reset();
        self.collector.reset(mode);
        let stale = self.completions_rx.try_iter().count();
        self.stop.clear();
        self.scanning = true;

        tracing::info!(?mode, stale_completions = stale, "Scanning started");
    }

    /// Stops scanning.
    ///
    /// Resets the linear decoder session and emits
    /// [`ScanEvent::ScanningStopped`]. A failed reset is logged and
    /// ignored. Does nothing if not scanning.
    pub fn stop(&mut self) {
        if !self.scanning {
            return;
        }
        self.scanning = false;

        if let Err(e) = self.decoder.reset_linear() {
            tracing::warn!(error = %e, "Linear decoder reset failed");
        }

        self.emit(ScanEvent::ScanningStopped);
        tracing::info!(results = self.collector.results().len(), "Scanning stopped");
    }

    /// Runs one iteration of the scan loop.
    pub fn tick(&mut self) -> Tick {
        if self.stop.take() {
            self.stop();
        }
        if !self.scanning {
            return Tick::Idle;
        }
        self.stats.ticks += 1;

        self.apply_completions();

        if !self.source.has_enough_data() {
            self.stats.skipped_ticks += 1;
            tracing::trace!("Source not ready, skipping tick");
            return Tick::Skipped;
        }

        let frame = match self.source.capture() {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.capture_errors += 1;
                tracing::debug!(error = %e, "Frame capture failed");
                return Tick::Skipped;
            }
        };
        self.stats.frames += 1;

        let sequence = frame.sequence();
        let reply = LinearReply::new(sequence, self.completions_tx.clone());
        if let Some(payload) = self.decoder.process(frame, reply) {
            if self.tracker.observe_matrix(&payload) {
                tracing::trace!(sequence, "Matrix payload updated");
            }
        }

        if let Some(pair) = self.tracker.take_trigger(self.collector.mode()) {
            self.recover(pair);
        }

        Tick::Sampled
    }

    /// Ticks at the configured interval until scanning stops or
    /// `max_ticks` ticks have run. Returns the number of ticks run.
    pub fn run(&mut self, max_ticks: Option<u64>) -> u64 {
        self.run_with(max_ticks, |_| {})
    }

    /// Like [`run`](Self::run), calling `after_tick` after every tick.
    pub fn run_with<F>(&mut self, max_ticks: Option<u64>, mut after_tick: F) -> u64
    where
        F: FnMut(&Self),
    {
        let mut ticks = 0;

        while self.scanning && max_ticks.map_or(true, |max| ticks < max) {
            let started = Instant::now();
            self.tick();
            ticks += 1;
            after_tick(self);

            if !self.scanning {
                break;
            }
            if let Some(rest) = self.tick_interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }

        ticks
    }

    fn apply_completions(&mut self) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            match completion.result {
                Ok(Some(payload)) => {
                    self.stats.linear_reads += 1;
                    if self.tracker.observe_linear(&payload) {
                        tracing::trace!(sequence = completion.sequence, "Linear payload updated");
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(sequence = completion.sequence, error = %e, "Linear decode failed");
                }
            }
        }
    }

    fn recover(&mut self, pair: FusedPair) {
        self.stats.recovery_attempts += 1;

        match self.engine.recover(&pair.matrix, &pair.linear) {
            Ok(secret) => {
                self.stats.secrets_found += 1;
                let accepted = self.collector.accept(secret);
                tracing::info!(results = self.collector.results().len(), "Secret found");
                self.emit(accepted.event);

                if accepted.target_reached {
                    tracing::info!(batch_target = ?self.collector.mode().target(), "Batch target reached");
                    self.stop();
                }
            }
            Err(e) => {
                self.stats.record_failure(e.kind());
                tracing::debug!(kind = ?e.kind(), error = %e, "Recovery attempt failed");
            }
        }
    }

    fn emit(&self, event: ScanEvent) {
        // The session holds a receiver, so the channel never disconnects.
        let _ = self.events_tx.send(event);
    }
}
