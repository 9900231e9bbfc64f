//! Playback controller: turns soundscape snapshots into running layers
//!
//! Each call to [`AudioPlaybackController::apply_layers`] diffs the new
//! snapshot against the mixer's slots under one lock. Fades then run inside
//! the render callback; asset loads run on their own threads and hand their
//! result back through a generation check.

use crate::mixer::seconds_to_frames;
use crate::{
    AudioEngine, AudioError, ControllerConfig, LayerPhase, LayerStatus, Mixer, OutputSink, Result,
    SampleLoader, SoundRegistry,
};
use ambience_core::{compose_soundscape, BiomeType, SoundLayer, WeatherData};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Upper bound for a layer's fade-in and start delay
const MAX_LAYER_SECONDS: f32 = 3600.0;

/// What one reconciliation changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Ids that began fading in (new, or rescued from a fade-out)
    pub started: Vec<String>,
    pub stopped: Vec<String>,
    /// Ids whose volume is ramping to a new target
    pub retargeted: Vec<String>,
    /// Ids rejected outright, with the reason
    pub failed: Vec<(String, String)>,
}

impl ReconcileReport {
    /// True if nothing changed
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.stopped.is_empty() && self.retargeted.is_empty() && self.failed.is_empty()
    }
}

/// Consistent view of controller and bus state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSnapshot {
    pub is_ready: bool,
    pub is_muted: bool,
    pub volume: f32,
    pub current_biome: Option<BiomeType>,
    pub inside_mode: bool,
    pub filter_frequency: f32,
    pub layers: Vec<LayerStatus>,
}

/// Owns the output sink and the shared mixer
pub struct AudioPlaybackController {
    config: ControllerConfig,
    loader: Arc<SampleLoader>,
    /// Present once initialized
    mixer: Option<Arc<Mutex<Mixer>>>,
    sink: Option<Box<dyn OutputSink>>,
    rng: StdRng,
    current_biome: Option<BiomeType>,
}

impl AudioPlaybackController {
    pub fn new(config: ControllerConfig) -> Self {
        let mut loader = SampleLoader::new(config.asset_root.clone());
        if let Some(url) = &config.fallback_url {
            loader = loader.with_fallback_url(url.clone());
        }
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        AudioPlaybackController {
            config,
            loader: Arc::new(loader),
            mixer: None,
            sink: None,
            rng,
            current_biome: None,
        }
    }

    /// Shared sample cache, e.g. for preloading before playback
    pub fn loader(&self) -> &Arc<SampleLoader> {
        &self.loader
    }

    pub fn is_ready(&self) -> bool {
        self.mixer.is_some()
    }

    /// Open the default output device and start the stream
    pub fn initialize(&mut self) -> Result<()> {
        if self.is_ready() {
            log::debug!("Controller already initialized");
            return Ok(());
        }
        let engine = AudioEngine::new()?;
        self.initialize_with_sink(Box::new(engine))
    }

    /// Start rendering into an arbitrary sink
    pub fn initialize_with_sink(&mut self, mut sink: Box<dyn OutputSink>) -> Result<()> {
        if self.is_ready() {
            log::debug!("Controller already initialized");
            return Ok(());
        }

        let mixer = Arc::new(Mutex::new(Mixer::new(
            sink.sample_rate(),
            sink.channels(),
            &self.config,
        )));
        let render_mixer = Arc::clone(&mixer);
        sink.start(Box::new(move |buffer: &mut [f32]| {
            render_mixer.lock().render(buffer);
        }))?;

        log::info!(
            "Playback ready ({} Hz, {} channels, assets in {})",
            sink.sample_rate(),
            sink.channels(),
            self.config.asset_root.display()
        );

        self.mixer = Some(mixer);
        self.sink = Some(sink);
        Ok(())
    }

    fn ready_mixer(&self, operation: &str) -> Option<Arc<Mutex<Mixer>>> {
        if self.mixer.is_none() {
            log::warn!("{}: {}", operation, AudioError::NotInitialized);
        }
        self.mixer.clone()
    }

    /// Compose a soundscape for `weather` and apply it
    pub fn update_soundscape(&mut self, weather: &WeatherData) -> ReconcileReport {
        if self.ready_mixer("update_soundscape").is_none() {
            return ReconcileReport::default();
        }

        let biome = weather.biome_type();
        let time = weather.time_of_day();
        let layers = compose_soundscape(
            biome,
            time,
            weather.current.condition.code,
            weather.current.wind_kph,
            weather.current.humidity,
            &mut self.rng,
        );
        log::info!(
            "Soundscape for {} ({}, {}, code {}): {} layers",
            weather.location.name,
            biome,
            time,
            weather.current.condition.code,
            layers.len()
        );

        self.current_biome = Some(biome);
        self.apply_layers(&layers)
    }

    /// Reconcile the playing layers with `layers`
    pub fn apply_layers(&mut self, layers: &[SoundLayer]) -> ReconcileReport {
        let Some(mixer) = self.ready_mixer("apply_layers") else {
            return ReconcileReport::default();
        };

        let layers: Vec<SoundLayer> = layers.iter().map(sanitize_layer).collect();

        // Last occurrence of an id wins; keep first-seen order.
        let mut order: Vec<&str> = Vec::new();
        let mut wanted: HashMap<&str, &SoundLayer> = HashMap::new();
        for layer in &layers {
            if wanted.insert(layer.sound_id.as_str(), layer).is_none() {
                order.push(layer.sound_id.as_str());
            }
        }

        let mut report = ReconcileReport::default();
        let mut loads = Vec::new();
        {
            let mut mixer = mixer.lock();
            let release_frames = seconds_to_frames(self.config.release_seconds, mixer.sample_rate());

            for id in mixer.ids() {
                if wanted.contains_key(id.as_str()) || mixer.phase(&id) == Some(LayerPhase::FadingOut) {
                    continue;
                }
                mixer.release(&id, release_frames);
                report.stopped.push(id);
            }

            for id in order {
                let layer = wanted[id];
                match mixer.phase(id) {
                    None => {
                        if let Err(e) = SoundRegistry::resolve(id) {
                            log::error!("Skipping layer: {}", e);
                            report.failed.push((id.to_string(), e.to_string()));
                            continue;
                        }
                        let cached = self.loader.cached(id);
                        let needs_load = cached.is_none();
                        let generation = mixer.begin(layer.clone(), cached);
                        if needs_load {
                            loads.push((id.to_string(), generation));
                        }
                        report.started.push(id.to_string());
                    }
                    Some(LayerPhase::FadingOut) => {
                        mixer.revive(layer);
                        report.started.push(id.to_string());
                    }
                    Some(_) => {
                        if mixer.retarget(layer) {
                            report.retargeted.push(id.to_string());
                        }
                    }
                }
            }
        }

        for (id, generation) in loads {
            self.spawn_load(&mixer, id, generation);
        }

        if !report.is_empty() {
            log::debug!(
                "Reconciled: {} started, {} stopped, {} retargeted, {} failed",
                report.started.len(),
                report.stopped.len(),
                report.retargeted.len(),
                report.failed.len()
            );
        }
        report
    }

    fn spawn_load(&self, mixer: &Arc<Mutex<Mixer>>, sound_id: String, generation: u64) {
        let loader = Arc::clone(&self.loader);
        let load_mixer = Arc::clone(mixer);
        let id = sound_id.clone();

        let spawned = std::thread::Builder::new()
            .name(format!("load-{}", sound_id))
            .spawn(move || match loader.load(&id) {
                Ok(sample) => {
                    if !load_mixer.lock().attach(&id, generation, sample) {
                        log::warn!("Discarding stale load of {}", id);
                    }
                }
                Err(e) => {
                    log::error!("Dropping layer {}: {}", id, e);
                    load_mixer.lock().abandon(&id, generation);
                }
            });

        if let Err(e) = spawned {
            log::error!("Dropping layer {}: cannot spawn loader: {}", sound_id, e);
            mixer.lock().abandon(&sound_id, generation);
        }
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        let Some(mixer) = self.ready_mixer("set_master_volume") else {
            return;
        };
        let clamped = clamp_logged("volume", volume, 0.0, 1.0);
        mixer.lock().bus_mut().set_volume(clamped);
    }

    /// Flip mute and return the new state
    pub fn toggle_mute(&mut self) -> bool {
        let Some(mixer) = self.ready_mixer("toggle_mute") else {
            return false;
        };
        let mut mixer = mixer.lock();
        let muted = !mixer.bus().is_muted();
        mixer.bus_mut().set_muted(muted);
        log::info!("{}", if muted { "Muted" } else { "Unmuted" });
        muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        if let Some(mixer) = self.ready_mixer("set_muted") {
            mixer.lock().bus_mut().set_muted(muted);
        }
    }

    pub fn set_inside_mode(&mut self, inside: bool) {
        if let Some(mixer) = self.ready_mixer("set_inside_mode") {
            mixer.lock().bus_mut().set_inside_mode(inside);
            log::info!("Inside mode {}", if inside { "on" } else { "off" });
        }
    }

    pub fn set_inside_filter_frequency(&mut self, hz: f32) {
        let Some(mixer) = self.ready_mixer("set_inside_filter_frequency") else {
            return;
        };
        let clamped = clamp_logged(
            "inside filter frequency",
            hz,
            crate::bus::MIN_INSIDE_HZ,
            crate::bus::MAX_INSIDE_HZ,
        );
        mixer.lock().bus_mut().set_filter_frequency(clamped);
    }

    /// Fade every layer out over `fade_seconds`
    pub fn stop_soundscape(&mut self, fade_seconds: f32) {
        let Some(mixer) = self.ready_mixer("stop_soundscape") else {
            return;
        };
        let fade = clamp_logged("fade", fade_seconds, 0.0, f32::MAX);
        let mut mixer = mixer.lock();
        let frames = seconds_to_frames(fade, mixer.sample_rate());
        mixer.release_all(frames);
        self.current_biome = None;
        log::info!("Stopping soundscape over {:.1}s", fade);
    }

    /// Drop every layer and stop the output stream
    pub fn shutdown(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.stop() {
                log::error!("Failed to stop output: {}", e);
            }
        }
        if let Some(mixer) = self.mixer.take() {
            mixer.lock().clear();
            log::info!("Playback shut down");
        }
        self.current_biome = None;
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        match &self.mixer {
            Some(mixer) => {
                let mixer = mixer.lock();
                let bus = mixer.bus().state();
                ControllerSnapshot {
                    is_ready: true,
                    is_muted: bus.muted,
                    volume: bus.volume,
                    current_biome: self.current_biome,
                    inside_mode: bus.inside_mode,
                    filter_frequency: bus.filter_frequency,
                    layers: mixer.status(),
                }
            }
            None => ControllerSnapshot {
                is_ready: false,
                is_muted: false,
                volume: self.config.initial_volume.clamp(0.0, 1.0),
                current_biome: None,
                inside_mode: false,
                filter_frequency: self
                    .config
                    .inside_filter_hz
                    .clamp(crate::bus::MIN_INSIDE_HZ, crate::bus::MAX_INSIDE_HZ),
                layers: Vec::new(),
            },
        }
    }
}

impl Drop for AudioPlaybackController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Copy of `layer` with volume and timings forced into range
fn sanitize_layer(layer: &SoundLayer) -> SoundLayer {
    let mut layer = layer.clone();
    let id = layer.sound_id.clone();
    layer.volume = clamp_logged(&format!("{} volume", id), layer.volume, 0.0, 1.0);
    layer.fade_in_duration = clamp_logged(
        &format!("{} fade-in", id),
        layer.fade_in_duration,
        0.0,
        MAX_LAYER_SECONDS,
    );
    layer.start_delay = clamp_logged(&format!("{} start delay", id), layer.start_delay, 0.0, MAX_LAYER_SECONDS);
    layer
}

fn clamp_logged(name: &str, value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        log::warn!("Ignoring NaN {}, using {}", name, min);
        return min;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::warn!("{} {} out of range, clamped to {}", name, value, clamped);
    }
    clamped
}
