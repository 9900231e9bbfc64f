//! Reconciliation scenarios driven through a ManualSink
//!
//! Every preloaded sound is a constant 1.0 signal, so a layer's output level
//! equals its gain times the master volume.

use crate::{
    AudioPlaybackController, ControllerConfig, LayerPhase, ManualSink, Sample, SoundLayer, SoundRegistry,
};
use ambience_core::{BiomeType, WeatherData};
use hound::{SampleFormat, WavSpec, WavWriter};
use proptest::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const SR: u32 = 1000;
const BLOCK: usize = 10;

fn config(asset_root: PathBuf) -> ControllerConfig {
    ControllerConfig {
        asset_root,
        release_seconds: 0.5,
        retarget_seconds: 0.2,
        initial_volume: 1.0,
        rng_seed: Some(42),
        ..ControllerConfig::default()
    }
}

fn dc_sample(id: &str) -> Sample {
    Sample::from_interleaved(id, vec![1.0; 250], SR, 1)
}

/// Controller on a manual sink with every registered sound preloaded
fn setup() -> (AudioPlaybackController, ManualSink) {
    let mut controller = AudioPlaybackController::new(config(PathBuf::from("/nonexistent")));
    for id in SoundRegistry::ids() {
        controller.loader().insert(id, dc_sample(id));
    }
    let sink = ManualSink::new(SR, 2);
    controller.initialize_with_sink(Box::new(sink.clone())).unwrap();
    (controller, sink)
}

fn gain(controller: &AudioPlaybackController, id: &str) -> Option<f32> {
    controller
        .snapshot()
        .layers
        .into_iter()
        .find(|l| l.sound_id == id)
        .map(|l| l.gain)
}

fn phase(controller: &AudioPlaybackController, id: &str) -> Option<LayerPhase> {
    controller
        .snapshot()
        .layers
        .into_iter()
        .find(|l| l.sound_id == id)
        .map(|l| l.phase)
}

fn level(sink: &ManualSink) -> f32 {
    sink.render(1)[0]
}

#[test]
fn test_identical_snapshot_is_a_no_op() {
    let (mut controller, sink) = setup();
    let layers = vec![
        SoundLayer::base("ocean-waves", 0.6).fade_in(0.1),
        SoundLayer::base("wind-coastal", 0.4),
    ];
    let first = controller.apply_layers(&layers);
    assert_eq!(first.started.len(), 2);
    sink.advance(0.3, BLOCK);

    let second = controller.apply_layers(&layers);
    assert!(second.is_empty(), "{:?}", second);
    sink.advance(0.3, BLOCK);
    assert_eq!(gain(&controller, "ocean-waves"), Some(0.6));
    assert_eq!(gain(&controller, "wind-coastal"), Some(0.4));
}

#[test]
fn test_diff_fades_out_retargets_and_fades_in() {
    let (mut controller, sink) = setup();
    controller.apply_layers(&[
        SoundLayer::base("ocean-waves", 0.5),
        SoundLayer::base("wind-light", 0.3),
    ]);
    sink.advance(0.1, BLOCK);

    let report = controller.apply_layers(&[
        SoundLayer::base("wind-light", 0.6),
        SoundLayer::accent("seagulls", 0.2),
    ]);
    assert_eq!(report.started, vec!["seagulls".to_string()]);
    assert_eq!(report.stopped, vec!["ocean-waves".to_string()]);
    assert_eq!(report.retargeted, vec!["wind-light".to_string()]);
    assert!(report.failed.is_empty());

    assert_eq!(phase(&controller, "ocean-waves"), Some(LayerPhase::FadingOut));
    sink.advance(0.1, BLOCK);
    let wind = gain(&controller, "wind-light").unwrap();
    assert!(wind > 0.3 && wind < 0.6, "wind at {}", wind);

    sink.advance(0.5, BLOCK);
    assert_eq!(phase(&controller, "ocean-waves"), None);
    assert!((gain(&controller, "wind-light").unwrap() - 0.6).abs() < 1e-5);
    assert!((gain(&controller, "seagulls").unwrap() - 0.2).abs() < 1e-5);
}

#[test]
fn test_readd_during_fade_out_never_restarts_from_silence() {
    let (mut controller, sink) = setup();
    let layer = SoundLayer::weather("rain-light", 1.0);
    controller.apply_layers(std::slice::from_ref(&layer));
    sink.advance(0.05, BLOCK);

    let report = controller.apply_layers(&[]);
    assert_eq!(report.stopped, vec!["rain-light".to_string()]);
    sink.advance(0.25, BLOCK);
    let live = level(&sink);
    assert!((live - 0.5).abs() < 0.01, "half-way through release, got {}", live);

    let report = controller.apply_layers(&[layer.fade_in(0.5)]);
    assert_eq!(report.started, vec!["rain-light".to_string()]);
    let mut lowest = f32::MAX;
    for _ in 0..600 {
        lowest = lowest.min(level(&sink));
    }
    assert!(lowest >= live - 0.01, "dipped to {}", lowest);
    assert_eq!(phase(&controller, "rain-light"), Some(LayerPhase::Steady));
    assert_eq!(level(&sink), 1.0);
}

#[test]
fn test_mute_restores_volume() {
    let (mut controller, sink) = setup();
    controller.apply_layers(&[SoundLayer::base("traffic", 1.0)]);
    controller.set_master_volume(0.7);
    assert!((level(&sink) - 0.7).abs() < 1e-6);

    assert!(controller.toggle_mute());
    assert_eq!(level(&sink), 0.0);
    assert_eq!(controller.snapshot().volume, 0.7);

    assert!(!controller.toggle_mute());
    assert!((level(&sink) - 0.7).abs() < 1e-6);

    controller.set_muted(true);
    let snapshot = controller.snapshot();
    assert!(snapshot.is_muted);
    assert_eq!(snapshot.layers[0].effective_gain, 0.0);
}

#[test]
fn test_parameters_are_clamped() {
    let (mut controller, _sink) = setup();
    controller.set_master_volume(1.5);
    assert_eq!(controller.snapshot().volume, 1.0);
    controller.set_master_volume(f32::NAN);
    assert_eq!(controller.snapshot().volume, 0.0);
    controller.set_inside_filter_frequency(20.0);
    assert_eq!(controller.snapshot().filter_frequency, 200.0);
    controller.set_inside_filter_frequency(40_000.0);
    assert_eq!(controller.snapshot().filter_frequency, 2000.0);
}

#[test]
fn test_start_delay_holds_layer_pending() {
    let (mut controller, sink) = setup();
    controller.apply_layers(&[SoundLayer::accent("owl", 0.4).delay(0.3)]);

    sink.advance(0.2, BLOCK);
    assert_eq!(phase(&controller, "owl"), Some(LayerPhase::Pending));
    assert_eq!(level(&sink), 0.0);

    sink.advance(0.2, BLOCK);
    assert_eq!(phase(&controller, "owl"), Some(LayerPhase::Steady));
    assert!((level(&sink) - 0.4).abs() < 1e-6);
}

#[test]
fn test_removing_pending_layer_is_immediate() {
    let (mut controller, sink) = setup();
    controller.apply_layers(&[SoundLayer::accent("owl", 0.4).delay(1.0)]);
    sink.advance(0.1, BLOCK);
    let report = controller.apply_layers(&[]);
    assert_eq!(report.stopped, vec!["owl".to_string()]);
    assert!(controller.snapshot().layers.is_empty());
}

#[test]
fn test_unknown_id_fails_alone() {
    let (mut controller, _sink) = setup();
    let report = controller.apply_layers(&[
        SoundLayer::base("whale-song", 0.5),
        SoundLayer::base("ocean-waves", 0.5),
    ]);
    assert_eq!(report.started, vec!["ocean-waves".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "whale-song");

    let ids: Vec<_> = controller.snapshot().layers.into_iter().map(|l| l.sound_id).collect();
    assert_eq!(ids, vec!["ocean-waves".to_string()]);
}

#[test]
fn test_duplicate_ids_last_wins() {
    let (mut controller, sink) = setup();
    let report = controller.apply_layers(&[
        SoundLayer::base("wind-light", 0.2),
        SoundLayer::base("wind-light", 0.9),
    ]);
    assert_eq!(report.started, vec!["wind-light".to_string()]);
    sink.advance(0.01, BLOCK);
    assert_eq!(gain(&controller, "wind-light"), Some(0.9));
}

#[test]
fn test_stop_soundscape_fades_everything() {
    let (mut controller, sink) = setup();
    let weather = WeatherData::from_json(
        r#"{
            "location": {"name": "Porto", "localtime": "2024-05-01 13:00"},
            "current": {"condition": {"text": "Sunny", "code": 0}, "wind_kph": 12.0, "humidity": 60},
            "biome": {"type": "ocean", "coordinates": {"lat": 41.1, "lon": -8.6}}
        }"#,
    )
    .unwrap();

    let report = controller.update_soundscape(&weather);
    assert!(report.started.contains(&"ocean-waves".to_string()));
    assert_eq!(controller.snapshot().current_biome, Some(BiomeType::Ocean));
    sink.advance(12.0, 100);

    controller.stop_soundscape(0.5);
    assert!(controller
        .snapshot()
        .layers
        .iter()
        .all(|l| l.phase == LayerPhase::FadingOut));
    sink.advance(0.6, BLOCK);
    let snapshot = controller.snapshot();
    assert!(snapshot.layers.is_empty());
    assert_eq!(snapshot.current_biome, None);
}

#[test]
fn test_controls_before_initialize_are_no_ops() {
    let mut controller = AudioPlaybackController::new(ControllerConfig::default());
    assert!(controller.apply_layers(&[SoundLayer::base("owl", 0.5)]).is_empty());
    controller.set_master_volume(0.1);
    controller.set_inside_mode(true);
    controller.stop_soundscape(1.0);
    assert!(!controller.toggle_mute());

    let snapshot = controller.snapshot();
    assert!(!snapshot.is_ready);
    assert_eq!(snapshot.volume, 0.8);
    assert!(!snapshot.inside_mode);
    assert!(snapshot.layers.is_empty());
}

#[test]
fn test_shutdown_stops_output() {
    let (mut controller, sink) = setup();
    controller.apply_layers(&[SoundLayer::base("traffic", 1.0)]);
    assert_eq!(level(&sink), 1.0);

    controller.shutdown();
    assert!(!controller.is_ready());
    assert_eq!(level(&sink), 0.0);
    assert!(controller.snapshot().layers.is_empty());
}

#[test]
fn test_inside_mode_reported_and_audible() {
    let (mut controller, sink) = setup();
    controller.set_inside_mode(true);
    assert!(controller.snapshot().inside_mode);

    // A +1/-1 square at 1 kHz sits at Nyquist, far above a 200 Hz cut.
    controller.set_inside_filter_frequency(200.0);
    controller
        .loader()
        .insert("owl", Sample::from_interleaved("owl", vec![1.0, -1.0], SR, 1));
    controller.apply_layers(&[SoundLayer::accent("owl", 1.0)]);
    sink.advance(1.0, BLOCK);
    let out = sink.render(100);
    let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak < 0.2, "peak {}", peak);
}

#[test]
fn test_inside_mode_toggle_keeps_level_steady() {
    let (mut controller, sink) = setup();
    controller.apply_layers(&[SoundLayer::base("traffic", 1.0)]);
    sink.advance(0.1, BLOCK);

    for inside in [true, false, true] {
        controller.set_inside_mode(inside);
        for frame in 0..800 {
            let out = level(&sink);
            assert!((out - 1.0).abs() < 0.02, "inside={} frame {}: {}", inside, frame, out);
        }
    }
}

#[test]
fn test_out_of_range_layer_values_are_clamped() {
    let (mut controller, sink) = setup();
    let mut loud = SoundLayer::base("traffic", 1.0);
    loud.volume = 3.0;
    let mut odd = SoundLayer::accent("owl", 0.5);
    odd.fade_in_duration = f32::NAN;
    odd.start_delay = -2.0;
    let mut silent = SoundLayer::accent("frogs", 0.5);
    silent.volume = f32::NAN;

    let report = controller.apply_layers(&[loud.clone(), odd, silent]);
    assert_eq!(report.started.len(), 3);
    sink.advance(0.01, BLOCK);

    assert_eq!(gain(&controller, "traffic"), Some(1.0));
    assert_eq!(gain(&controller, "owl"), Some(0.5));
    assert_eq!(phase(&controller, "owl"), Some(LayerPhase::Steady));
    assert_eq!(gain(&controller, "frogs"), Some(0.0));

    // Re-sending the same out-of-range volume is not a change
    let report = controller.apply_layers(&[loud]);
    assert!(report.retargeted.is_empty());
}

#[test]
fn test_stop_shortens_release_in_flight() {
    let (mut controller, sink) = setup();
    controller.apply_layers(&[SoundLayer::base("traffic", 1.0)]);
    sink.advance(0.05, BLOCK);

    controller.apply_layers(&[]);
    sink.advance(0.1, BLOCK);
    let live = gain(&controller, "traffic").unwrap();
    assert!((live - 0.8).abs() < 1e-3, "release at {}", live);

    controller.stop_soundscape(0.1);
    sink.advance(0.05, BLOCK);
    let halfway = gain(&controller, "traffic").unwrap();
    assert!((halfway - 0.4).abs() < 1e-3, "stop fade at {}", halfway);
    sink.advance(0.06, BLOCK);
    assert!(controller.snapshot().layers.is_empty());
}

#[test]
fn test_master_volume_during_fade_in() {
    let (mut controller, sink) = setup();
    controller.apply_layers(&[SoundLayer::base("traffic", 1.0).fade_in(1.0)]);
    sink.advance(0.25, BLOCK);
    assert!((gain(&controller, "traffic").unwrap() - 0.25).abs() < 1e-3);

    controller.set_master_volume(0.5);
    let out = level(&sink);
    assert!((out - 0.125).abs() < 2e-3, "got {}", out);

    let status = controller.snapshot().layers.remove(0);
    assert_eq!(status.phase, LayerPhase::FadingIn);
    assert!((status.effective_gain - status.gain * 0.5).abs() < 1e-6);

    sink.advance(1.0, BLOCK);
    assert_eq!(phase(&controller, "traffic"), Some(LayerPhase::Steady));
    assert!((level(&sink) - 0.5).abs() < 1e-6);
}

fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn test_failed_load_drops_layer() {
    let root = tempfile::tempdir().unwrap();
    let mut controller = AudioPlaybackController::new(config(root.path().to_path_buf()));
    let sink = ManualSink::new(SR, 2);
    controller.initialize_with_sink(Box::new(sink.clone())).unwrap();

    let report = controller.apply_layers(&[SoundLayer::base("frogs", 0.5)]);
    assert_eq!(report.started, vec!["frogs".to_string()]);
    assert!(wait_until(|| controller.snapshot().layers.is_empty()));
}

#[test]
fn test_background_load_starts_playback() {
    let root = tempfile::tempdir().unwrap();
    write_animal(root.path(), "frogs", &[16384; 500]);

    let mut controller = AudioPlaybackController::new(config(root.path().to_path_buf()));
    let sink = ManualSink::new(SR, 2);
    controller.initialize_with_sink(Box::new(sink.clone())).unwrap();

    controller.apply_layers(&[SoundLayer::accent("frogs", 1.0)]);
    assert!(wait_until(|| controller.snapshot().layers.iter().any(|l| l.loaded)));
    sink.advance(0.05, BLOCK);
    assert_eq!(phase(&controller, "frogs"), Some(LayerPhase::Steady));
    assert!((level(&sink) - 0.5).abs() < 1e-3);
}

#[test]
fn test_stale_load_does_not_start_playback() {
    let root = tempfile::tempdir().unwrap();
    write_animal(root.path(), "frogs", &[16384; 500]);

    let mut controller = AudioPlaybackController::new(config(root.path().to_path_buf()));
    let sink = ManualSink::new(SR, 2);
    controller.initialize_with_sink(Box::new(sink.clone())).unwrap();

    controller.apply_layers(&[SoundLayer::accent("frogs", 1.0)]);
    controller.apply_layers(&[]);
    // The decode lands in the cache but must not revive the removed layer.
    assert!(wait_until(|| controller.loader().cached("frogs").is_some()));
    std::thread::sleep(Duration::from_millis(20));
    sink.advance(0.05, BLOCK);
    assert!(controller.snapshot().layers.is_empty());
    assert_eq!(level(&sink), 0.0);
}

/// Mono 16-bit WAV at `asset_root/animals/<stem>.wav`
fn write_animal(asset_root: &Path, stem: &str, samples: &[i16]) {
    let dir = asset_root.join("animals");
    std::fs::create_dir_all(&dir).unwrap();
    let spec = WavSpec {
        channels: 1,
        sample_rate: SR,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(dir.join(format!("{}.wav", stem)), spec).unwrap();
    for s in samples {
        writer.write_sample(*s).unwrap();
    }
    writer.finalize().unwrap();
}

fn registry_layers(picks: &[(usize, f32)]) -> Vec<SoundLayer> {
    let ids: Vec<&str> = SoundRegistry::ids().collect();
    picks
        .iter()
        .map(|&(i, volume)| SoundLayer::base(ids[i % ids.len()], volume))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn reapplying_a_snapshot_changes_nothing(
        picks in prop::collection::vec((0usize..64, 0.0f32..1.0), 0..10),
        seconds in 0.0f32..1.0,
    ) {
        let (mut controller, sink) = setup();
        let layers = registry_layers(&picks);
        controller.apply_layers(&layers);
        sink.advance(seconds, BLOCK);

        let before: Vec<String> = controller.snapshot().layers.into_iter().map(|l| l.sound_id).collect();
        let report = controller.apply_layers(&layers);
        prop_assert!(report.is_empty(), "{:?}", report);
        let after: Vec<String> = controller.snapshot().layers.into_iter().map(|l| l.sound_id).collect();
        prop_assert_eq!(before, after);
    }
}
