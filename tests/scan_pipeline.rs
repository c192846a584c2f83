//! End-to-end scan sessions over a mock source and scripted decoders.

use hybrid_scanner::batch::{ScanEvent, ScanMode};
use hybrid_scanner::capture::{CaptureConfig, Frame, FrameSource, MockSource};
use hybrid_scanner::decode::scripted::{Reading, ScriptedLinearDecode};
use hybrid_scanner::decode::{
    DecodeError, DualCodeDecoder, InlineLinearDecoder, LinearDecoder, LinearHints, LinearReply,
    ScriptedMatrixDecoder, ScriptedScene, ThreadedLinearDecoder,
};
use hybrid_scanner::keys::MasterKey;
use hybrid_scanner::recovery::{seal_with_salt_hex, PayloadPair, SecretRecoveryEngine};
use hybrid_scanner::samples::SampleGenerator;
use hybrid_scanner::sampler::{Session, Tick};
use std::time::Duration;

fn open_source() -> MockSource {
    let mut source = MockSource::new();
    source.open(&CaptureConfig::with_dimensions(16, 16)).unwrap();
    source
}

fn inline_session(
    scene: ScriptedScene,
) -> Session<MockSource, ScriptedMatrixDecoder, InlineLinearDecoder<ScriptedLinearDecode>> {
    let (matrix, linear) = scene.into_decoders();
    let decoder = DualCodeDecoder::new(matrix, InlineLinearDecoder::new(linear), LinearHints::default());
    Session::new(open_source(), decoder, SecretRecoveryEngine::default()).with_tick_interval(Duration::ZERO)
}

fn pairs(count: usize, seed: u64) -> Vec<(String, PayloadPair)> {
    let mut generator = SampleGenerator::from_seed(seed, MasterKey::global().clone());
    generator
        .batch(count)
        .into_iter()
        .map(|sample| (sample.secret, sample.pair))
        .collect()
}

/// Presents each pair on its own pair of frames, three frames apart.
fn scene_of(pairs: &[(String, PayloadPair)]) -> ScriptedScene {
    pairs
        .iter()
        .enumerate()
        .fold(ScriptedScene::new(), |scene, (i, (_, pair))| {
            scene.present(1 + 3 * i as u64, pair)
        })
}

fn found(events: &[ScanEvent]) -> Vec<&ScanEvent> {
    events
        .iter()
        .filter(|e| matches!(e, ScanEvent::SecretFound { .. }))
        .collect()
}

#[test]
fn valid_pair_yields_exactly_one_secret() {
    let pair = seal_with_salt_hex(MasterKey::global(), "HELLO123", "00112233445566778899aabbccddeeff").unwrap();
    let mut session = inline_session(ScriptedScene::new().present(1, &pair));
    let events = session.events();

    session.start(ScanMode::Single);
    session.run(Some(20));

    let events: Vec<_> = events.try_iter().collect();
    let found = found(&events);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].secret(), Some("HELLO123"));
    assert_eq!(found[0].results().unwrap(), ["HELLO123".to_string()]);
    assert!(session.is_scanning());
}

#[test]
fn malformed_matrix_payload_is_dropped() {
    let pair = seal_with_salt_hex(MasterKey::global(), "HELLO123", "00112233445566778899aabbccddeeff").unwrap();
    let scene = ScriptedScene::new()
        .linear(1, Reading::Payload("kvQkAuKypA==".into()))
        .matrix(2, Reading::Payload("00112233445566778899aabbccddeeff+HR9051cYJJB".into()))
        .matrix(3, Reading::Payload("00|11|22".into()))
        .present(5, &pair);
    let mut session = inline_session(scene);
    let events = session.events();

    session.start(ScanMode::Single);
    session.run(Some(4));
    assert!(events.try_recv().is_err());
    assert!(session.is_scanning());
    assert_eq!(session.stats().malformed_payloads, 1);

    session.run(Some(10));
    let events: Vec<_> = events.try_iter().collect();
    assert_eq!(found(&events).len(), 1);
}

#[test]
fn single_mode_keeps_only_latest_result() {
    let samples = pairs(2, 11);
    let mut session = inline_session(scene_of(&samples));
    let events = session.events();

    session.start(ScanMode::Single);
    session.run(Some(10));

    let events: Vec<_> = events.try_iter().collect();
    let found = found(&events);
    assert_eq!(found.len(), 2);
    for (event, (secret, _)) in found.iter().zip(&samples) {
        assert_eq!(event.secret(), Some(secret.as_str()));
        assert_eq!(event.results().unwrap().len(), 1);
    }
    assert_eq!(session.results(), [samples[1].0.clone()]);
}

#[test]
fn single_mode_requires_fresh_observation() {
    let pair = seal_with_salt_hex(MasterKey::global(), "HELLO123", "00112233445566778899aabbccddeeff").unwrap();
    // The linear code stays in view, the matrix code shows up twice.
    let scene = ScriptedScene::new()
        .linear(1, Reading::Payload(pair.linear.clone()))
        .matrix(2, Reading::Payload(pair.matrix.clone()))
        .matrix(6, Reading::Payload(pair.matrix.clone()));
    let mut session = inline_session(scene);
    let events = session.events();

    session.start(ScanMode::Single);
    session.run(Some(10));

    // After the first recovery both slots are cleared; the second matrix
    // sighting has no linear partner.
    let events: Vec<_> = events.try_iter().collect();
    assert_eq!(found(&events).len(), 1);
}

#[test]
fn batch_target_stops_session() {
    let samples = pairs(4, 23);
    let mut session = inline_session(scene_of(&samples));
    let events = session.events();

    session.start(ScanMode::Batch { target: 3 });
    session.run(Some(30));

    assert!(!session.is_scanning());
    assert_eq!(session.tick(), Tick::Idle);

    let events: Vec<_> = events.try_iter().collect();
    let found = found(&events);
    assert_eq!(found.len(), 3);
    assert_eq!(found[2].results().unwrap().len(), 3);
    assert_eq!(events.last(), Some(&ScanEvent::ScanningStopped));

    let expected: Vec<String> = samples.iter().take(3).map(|(s, _)| s.clone()).collect();
    assert_eq!(session.results(), expected.as_slice());
}

#[test]
fn batch_steady_pair_fires_once() {
    let samples = pairs(1, 5);
    let scene = ScriptedScene::new().hold(1..=20, &samples[0].1);
    let mut session = inline_session(scene);
    let events = session.events();

    session.start(ScanMode::Batch { target: 0 });
    session.run(Some(20));

    let events: Vec<_> = events.try_iter().collect();
    assert_eq!(found(&events).len(), 1);
    assert_eq!(session.stats().recovery_attempts, 1);
}

#[test]
fn batch_mode_accumulates() {
    let samples = pairs(3, 31);
    let mut session = inline_session(scene_of(&samples));
    let events = session.events();

    session.start(ScanMode::Batch { target: 0 });
    session.run(Some(12));

    let events: Vec<_> = events.try_iter().collect();
    let sizes: Vec<usize> = found(&events).iter().map(|e| e.results().unwrap().len()).collect();
    assert_eq!(sizes, vec![1, 2, 3]);
    assert!(session.is_scanning());
}

/// Holds linear replies until the test releases them.
#[derive(Default)]
struct DeferredLinear {
    pending: Vec<LinearReply>,
    resets: usize,
}

impl LinearDecoder for DeferredLinear {
    fn decode_async(&mut self, _frame: Frame, _hints: &LinearHints, reply: LinearReply) {
        self.pending.push(reply);
    }

    fn reset(&mut self) -> Result<(), DecodeError> {
        self.resets += 1;
        Ok(())
    }
}

#[test]
fn stop_discards_outstanding_linear_decode() {
    let pair = seal_with_salt_hex(MasterKey::global(), "HELLO123", "00112233445566778899aabbccddeeff").unwrap();
    let (matrix, _) = ScriptedScene::new().hold(1..=10, &pair).into_decoders();
    let decoder = DualCodeDecoder::new(matrix, DeferredLinear::default(), LinearHints::default());
    let mut session = Session::new(open_source(), decoder, SecretRecoveryEngine::default());
    let events = session.events();

    session.start(ScanMode::Single);
    assert_eq!(session.tick(), Tick::Sampled);
    session.stop();
    assert_eq!(session.decoder().linear().resets, 1);

    for reply in session.decoder_mut().linear_mut().pending.drain(..) {
        reply.complete(Ok(Some(pair.linear.clone())));
    }
    assert_eq!(session.tick(), Tick::Idle);

    let events: Vec<_> = events.try_iter().collect();
    assert_eq!(events, vec![ScanEvent::ScanningStopped]);
    assert_eq!(session.stats().linear_reads, 0);
}

#[test]
fn restart_ignores_completions_from_previous_run() {
    let pair = seal_with_salt_hex(MasterKey::global(), "HELLO123", "00112233445566778899aabbccddeeff").unwrap();
    let (matrix, _) = ScriptedScene::new().hold(1..=10, &pair).into_decoders();
    let decoder = DualCodeDecoder::new(matrix, DeferredLinear::default(), LinearHints::default());
    let mut session = Session::new(open_source(), decoder, SecretRecoveryEngine::default());
    let events = session.events();

    session.start(ScanMode::Single);
    session.tick();
    session.stop();
    for reply in session.decoder_mut().linear_mut().pending.drain(..) {
        reply.complete(Ok(Some(pair.linear.clone())));
    }

    session.start(ScanMode::Single);
    session.tick();
    assert_eq!(session.stats().linear_reads, 0);

    let events: Vec<_> = events.try_iter().collect();
    assert_eq!(found(&events).len(), 0);
}

#[test]
fn threaded_linear_decoder_recovers() {
    let pair = seal_with_salt_hex(MasterKey::global(), "HELLO123", "00112233445566778899aabbccddeeff").unwrap();
    let (matrix, linear) = ScriptedScene::new().hold(1..=200, &pair).into_decoders();
    let decoder = DualCodeDecoder::new(matrix, ThreadedLinearDecoder::new(linear), LinearHints::default());
    let mut session =
        Session::new(open_source(), decoder, SecretRecoveryEngine::default()).with_tick_interval(Duration::from_millis(5));
    let events = session.events();

    session.start(ScanMode::Batch { target: 1 });
    session.run(Some(200));

    assert!(!session.is_scanning());
    let events: Vec<_> = events.try_iter().collect();
    assert_eq!(found(&events)[0].secret(), Some("HELLO123"));
}

#[test]
fn stalled_source_never_fails() {
    let mut source = MockSource::with_warmup(u32::MAX);
    source.open(&CaptureConfig::with_dimensions(8, 8)).unwrap();
    let (matrix, linear) = ScriptedScene::new().into_decoders();
    let decoder = DualCodeDecoder::new(matrix, InlineLinearDecoder::new(linear), LinearHints::default());
    let mut session = Session::new(source, decoder, SecretRecoveryEngine::default()).with_tick_interval(Duration::ZERO);

    session.start(ScanMode::Single);
    assert_eq!(session.run(Some(50)), 50);

    let stats = session.stats();
    assert!(stats.scanning);
    assert_eq!(stats.skipped_ticks, 50);
    assert_eq!(stats.frames, 0);
}
