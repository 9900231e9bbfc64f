//! Per-layer playback state and the mixing loop
//!
//! The mixer owns one [`LayerSlot`] per sound id. A slot is the live form of a
//! [`SoundLayer`]: its phase, its gain ramp and (once decoded) its voice. The
//! controller decides transitions while holding the mixer lock; the audio
//! callback then executes them frame by frame in [`Mixer::render`].

use crate::bus::OutputBus;
use crate::{ControllerConfig, GainRamp, LayerCategory, Sample, SoundLayer, Voice};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Volume differences below this are not worth a retarget ramp
const VOLUME_EPSILON: f32 = 1e-4;

/// Where a layer is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerPhase {
    /// Waiting for its start delay to pass and/or its asset to load
    Pending,
    FadingIn,
    Steady,
    FadingOut,
}

/// Read-only view of one slot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStatus {
    pub sound_id: String,
    pub category: LayerCategory,
    pub phase: LayerPhase,
    /// Volume the layer is heading for (0 while fading out)
    pub target_volume: f32,
    /// Layer gain right now, before the bus
    pub gain: f32,
    /// Gain as heard, after master volume and mute
    pub effective_gain: f32,
    pub loaded: bool,
}

pub(crate) struct LayerSlot {
    layer: SoundLayer,
    phase: LayerPhase,
    gain: GainRamp,
    voice: Option<Voice>,
    /// Identifies the load request that may fill `voice`
    generation: u64,
    /// Frames left before the fade-in may begin
    delay_frames: u64,
}

impl LayerSlot {
    fn start_fade_in(&mut self, sample_rate: u32) {
        let frames = seconds_to_frames(self.layer.fade_in_duration, sample_rate);
        self.gain.ramp_to(self.layer.volume, frames);
        self.phase = LayerPhase::FadingIn;
    }

    /// Add this layer's contribution to `mix`
    fn render(&mut self, mix: &mut [(f32, f32)], sample_rate: u32) {
        let mut offset = 0;

        if self.phase == LayerPhase::Pending {
            let frames = mix.len() as u64;
            if self.delay_frames >= frames {
                self.delay_frames -= frames;
                return;
            }
            offset = self.delay_frames as usize;
            self.delay_frames = 0;
            if self.voice.is_none() {
                return;
            }
            self.start_fade_in(sample_rate);
        }

        match self.voice.as_mut() {
            Some(voice) if voice.is_active() => {
                let tail = &mut mix[offset..];
                let len = tail.len();
                for (i, frame) in tail.iter_mut().enumerate() {
                    let g = self.gain.next_value();
                    match voice.next_frame(sample_rate) {
                        Some((l, r)) => {
                            frame.0 += l * g;
                            frame.1 += r * g;
                        }
                        None => {
                            // Keep fades on schedule after a one-shot ends
                            self.gain.skip((len - i - 1) as u32);
                            break;
                        }
                    }
                }
            }
            _ => self.gain.skip((mix.len() - offset) as u32),
        }

        if self.phase == LayerPhase::FadingIn && !self.gain.is_ramping() {
            self.phase = LayerPhase::Steady;
        }
    }

    fn is_finished(&self) -> bool {
        self.phase == LayerPhase::FadingOut && !self.gain.is_ramping()
    }
}

/// All live layers plus the shared output bus
pub struct Mixer {
    sample_rate: u32,
    channels: u16,
    slots: BTreeMap<String, LayerSlot>,
    bus: OutputBus,
    next_generation: u64,
    retarget_frames: u32,
    /// Stereo mix of the current block before the bus
    scratch: Vec<(f32, f32)>,
}

pub(crate) fn seconds_to_frames(seconds: f32, sample_rate: u32) -> u32 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * sample_rate as f32).round() as u32
}

impl Mixer {
    pub fn new(sample_rate: u32, channels: u16, config: &ControllerConfig) -> Self {
        Mixer {
            sample_rate,
            channels: channels.max(1),
            slots: BTreeMap::new(),
            bus: OutputBus::new(
                sample_rate,
                config.initial_volume,
                config.inside_filter_hz,
                config.filter_ramp_seconds,
            ),
            next_generation: 0,
            retarget_frames: seconds_to_frames(config.retarget_seconds, sample_rate),
            scratch: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bus(&self) -> &OutputBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut OutputBus {
        &mut self.bus
    }

    pub fn ids(&self) -> Vec<String> {
        self.slots.keys().cloned().collect()
    }

    pub fn phase(&self, sound_id: &str) -> Option<LayerPhase> {
        self.slots.get(sound_id).map(|s| s.phase)
    }

    /// Create a pending slot for a layer that is not playing
    ///
    /// Returns the generation a later [`Mixer::attach`] must present.
    pub fn begin(&mut self, layer: SoundLayer, sample: Option<Arc<Sample>>) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        let voice = sample.map(|s| Voice::new(s, layer.looping));
        let delay_frames = seconds_to_frames(layer.start_delay, self.sample_rate) as u64;

        log::debug!(
            "{}: pending (delay {:.2}s, fade-in {:.2}s to {:.2}, {})",
            layer.sound_id,
            layer.start_delay,
            layer.fade_in_duration,
            layer.volume,
            if voice.is_some() { "cached" } else { "loading" }
        );

        self.slots.insert(
            layer.sound_id.clone(),
            LayerSlot {
                layer,
                phase: LayerPhase::Pending,
                gain: GainRamp::new(0.0),
                voice,
                generation,
                delay_frames,
            },
        );
        generation
    }

    /// Hand a finished load to its slot
    ///
    /// Returns false when the load is stale: the slot is gone, was replaced by
    /// a newer request, or is no longer waiting for audio.
    pub fn attach(&mut self, sound_id: &str, generation: u64, sample: Arc<Sample>) -> bool {
        match self.slots.get_mut(sound_id) {
            Some(slot)
                if slot.generation == generation
                    && slot.phase == LayerPhase::Pending
                    && slot.voice.is_none() =>
            {
                slot.voice = Some(Voice::new(sample, slot.layer.looping));
                true
            }
            _ => false,
        }
    }

    /// Drop a pending slot whose load failed
    pub fn abandon(&mut self, sound_id: &str, generation: u64) -> bool {
        let matches = self
            .slots
            .get(sound_id)
            .map(|s| s.generation == generation && s.phase == LayerPhase::Pending)
            .unwrap_or(false);
        if matches {
            self.slots.remove(sound_id);
        }
        matches
    }

    /// Start fading a layer out; pending layers are dropped on the spot
    pub fn release(&mut self, sound_id: &str, frames: u32) {
        let Some(slot) = self.slots.get_mut(sound_id) else {
            return;
        };
        let phase = slot.phase;
        match phase {
            LayerPhase::Pending => {
                self.slots.remove(sound_id);
                log::debug!("{}: cancelled before start", sound_id);
            }
            LayerPhase::FadingIn | LayerPhase::Steady => {
                slot.gain.ramp_to(0.0, frames);
                slot.phase = LayerPhase::FadingOut;
                log::debug!("{}: fading out from {:.3}", sound_id, slot.gain.value());
                if frames == 0 {
                    self.slots.remove(sound_id);
                }
            }
            LayerPhase::FadingOut => {
                if frames == 0 {
                    self.slots.remove(sound_id);
                } else if frames < slot.gain.remaining() {
                    // Never lengthen a fade that is already under way
                    slot.gain.ramp_to(0.0, frames);
                    log::debug!("{}: fade-out shortened to {} frames", sound_id, frames);
                }
            }
        }
    }

    /// Fade every layer out over `frames`
    pub fn release_all(&mut self, frames: u32) {
        for id in self.ids() {
            self.release(&id, frames);
        }
    }

    /// Cancel a fade-out and fade back in from the live gain
    pub fn revive(&mut self, layer: &SoundLayer) -> bool {
        let sample_rate = self.sample_rate;
        match self.slots.get_mut(&layer.sound_id) {
            Some(slot) if slot.phase == LayerPhase::FadingOut => {
                slot.layer = layer.clone();
                let from = slot.gain.value();
                slot.start_fade_in(sample_rate);
                log::debug!(
                    "{}: fade-out cancelled at {:.3}, back to {:.2} over {:.2}s",
                    layer.sound_id,
                    from,
                    layer.volume,
                    layer.fade_in_duration
                );
                true
            }
            _ => false,
        }
    }

    /// Update a persisting layer; ramps its gain when the volume changed
    ///
    /// Returns true if a volume ramp was issued or the pending target changed.
    pub fn retarget(&mut self, layer: &SoundLayer) -> bool {
        let retarget_frames = self.retarget_frames;
        let Some(slot) = self.slots.get_mut(&layer.sound_id) else {
            return false;
        };
        let changed = (slot.layer.volume - layer.volume).abs() > VOLUME_EPSILON;
        let looping = slot.layer.looping;
        slot.layer = layer.clone();
        // The voice is already running; keep its loop mode.
        slot.layer.looping = looping;

        if !changed {
            return false;
        }
        match slot.phase {
            LayerPhase::FadingIn | LayerPhase::Steady => {
                slot.gain.ramp_to(layer.volume, retarget_frames);
                slot.phase = LayerPhase::FadingIn;
                log::debug!("{}: retarget to {:.2}", layer.sound_id, layer.volume);
            }
            LayerPhase::Pending | LayerPhase::FadingOut => {}
        }
        true
    }

    /// Drop every slot immediately
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn status(&self) -> Vec<LayerStatus> {
        let output_gain = self.bus.output_gain();
        self.slots
            .values()
            .map(|slot| LayerStatus {
                sound_id: slot.layer.sound_id.clone(),
                category: slot.layer.category,
                phase: slot.phase,
                target_volume: slot.gain.target(),
                gain: slot.gain.value(),
                effective_gain: slot.gain.value() * output_gain,
                loaded: slot.voice.is_some(),
            })
            .collect()
    }

    /// Fill an interleaved output buffer
    pub fn render(&mut self, out: &mut [f32]) {
        let channels = self.channels as usize;
        let frames = out.len() / channels;

        self.scratch.clear();
        self.scratch.resize(frames, (0.0, 0.0));

        let sample_rate = self.sample_rate;
        let mut finished = Vec::new();
        for (id, slot) in self.slots.iter_mut() {
            slot.render(&mut self.scratch, sample_rate);
            if slot.is_finished() {
                finished.push(id.clone());
            }
        }
        for id in finished {
            self.slots.remove(&id);
        }

        for (frame, &(l, r)) in out.chunks_mut(channels).zip(self.scratch.iter()) {
            let (l, r) = self.bus.process(l, r);
            if channels == 1 {
                frame[0] = 0.5 * (l + r);
            } else {
                frame[0] = l;
                frame[1] = r;
                for extra in &mut frame[2..] {
                    *extra = 0.0;
                }
            }
        }
    }
}
