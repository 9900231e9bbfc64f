//! Shared output bus: master volume, mute and the "inside" low-pass filter
//!
//! Every layer is summed into this bus. Volume and mute are applied here only,
//! so muting never touches the stored volume and per-layer fades compose with
//! master volume by plain multiplication.

use crate::GainRamp;
use serde::Serialize;

/// Cutoff used when the inside filter is fully open
pub const OPEN_CUTOFF_HZ: f32 = 18_000.0;
/// Lowest accepted inside cutoff
pub const MIN_INSIDE_HZ: f32 = 200.0;
/// Highest accepted inside cutoff
pub const MAX_INSIDE_HZ: f32 = 2000.0;
pub const DEFAULT_INSIDE_HZ: f32 = 600.0;

const FILTER_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Consistent read-only view of the bus
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusState {
    pub volume: f32,
    pub muted: bool,
    pub inside_mode: bool,
    /// Cutoff the filter settles at while inside
    pub filter_frequency: f32,
    /// Cutoff right now, including any glide in progress
    pub current_cutoff: f32,
}

/// Stereo biquad low-pass
#[derive(Debug, Clone, Copy, Default)]
struct LowPass {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    /// Per channel: x1, x2, y1, y2
    state: [[f32; 4]; 2],
}

impl LowPass {
    fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        let cutoff = cutoff_hz.clamp(10.0, sample_rate * 0.45);
        let w0 = 2.0 * std::f32::consts::PI * cutoff / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * FILTER_Q);

        let a0 = 1.0 + alpha;
        self.b0 = ((1.0 - cos_w0) / 2.0) / a0;
        self.b1 = (1.0 - cos_w0) / a0;
        self.b2 = self.b0;
        self.a1 = (-2.0 * cos_w0) / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    #[inline]
    fn process(&mut self, channel: usize, x: f32) -> f32 {
        let [x1, x2, y1, y2] = self.state[channel];
        let y = self.b0 * x + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
        self.state[channel] = [x, x1, y, y1];
        y
    }

    /// Settle a channel as if `x` had been its input forever
    fn prime(&mut self, channel: usize, x: f32) {
        self.state[channel] = [x, x, x, x];
    }
}

/// The single output stage every layer routes through
pub struct OutputBus {
    sample_rate: u32,
    volume: f32,
    muted: bool,
    inside: bool,
    inside_hz: f32,
    /// Cutoff glide, in log2(Hz) so it sweeps evenly through the octaves
    cutoff: GainRamp,
    filter_ramp_frames: u32,
    filter: LowPass,
    /// Coefficients lag behind the cutoff
    coefficients_stale: bool,
    /// Filter history holds real signal; false while bypassed
    primed: bool,
}

impl OutputBus {
    pub fn new(sample_rate: u32, volume: f32, inside_hz: f32, filter_ramp_seconds: f32) -> Self {
        let mut filter = LowPass::default();
        filter.set_cutoff(OPEN_CUTOFF_HZ, sample_rate as f32);
        OutputBus {
            sample_rate,
            volume: volume.clamp(0.0, 1.0),
            muted: false,
            inside: false,
            inside_hz: inside_hz.clamp(MIN_INSIDE_HZ, MAX_INSIDE_HZ),
            cutoff: GainRamp::new(OPEN_CUTOFF_HZ.log2()),
            filter_ramp_frames: (filter_ramp_seconds.max(0.0) * sample_rate as f32).round() as u32,
            filter,
            coefficients_stale: false,
            primed: false,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set master volume, effective from the next frame
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Gain applied after mixing
    pub fn output_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn inside_mode(&self) -> bool {
        self.inside
    }

    /// Engage or release the low-pass, gliding the cutoff
    pub fn set_inside_mode(&mut self, inside: bool) {
        if self.inside == inside {
            return;
        }
        self.inside = inside;
        let target = if inside { self.inside_hz } else { OPEN_CUTOFF_HZ };
        self.cutoff.ramp_to(target.log2(), self.filter_ramp_frames);
        self.coefficients_stale = true;
        if !self.filter_engaged() {
            self.primed = false;
        }
    }

    pub fn filter_frequency(&self) -> f32 {
        self.inside_hz
    }

    /// Change the inside cutoff; glides there if inside mode is on
    pub fn set_filter_frequency(&mut self, hz: f32) {
        self.inside_hz = hz.clamp(MIN_INSIDE_HZ, MAX_INSIDE_HZ);
        if self.inside {
            self.cutoff.ramp_to(self.inside_hz.log2(), self.filter_ramp_frames);
            self.coefficients_stale = true;
        }
    }

    pub fn current_cutoff(&self) -> f32 {
        self.cutoff.value().exp2()
    }

    /// Whether the filter is doing anything at all
    pub fn filter_engaged(&self) -> bool {
        self.inside || self.cutoff.is_ramping()
    }

    pub fn state(&self) -> BusState {
        BusState {
            volume: self.volume,
            muted: self.muted,
            inside_mode: self.inside,
            filter_frequency: self.inside_hz,
            current_cutoff: self.current_cutoff(),
        }
    }

    /// Run one mixed stereo frame through the bus
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (mut l, mut r) = (left, right);

        if self.filter_engaged() {
            if !self.primed {
                // Leaving bypass: start from the signal, not from silence.
                self.filter.prime(0, l);
                self.filter.prime(1, r);
                self.primed = true;
            }
            if self.cutoff.is_ramping() || self.coefficients_stale {
                let cutoff = self.cutoff.next_value().exp2();
                self.filter.set_cutoff(cutoff, self.sample_rate as f32);
                self.coefficients_stale = false;
            }
            l = self.filter.process(0, l);
            r = self.filter.process(1, r);
            if !self.filter_engaged() {
                // Fully open again: bypass from here on.
                self.primed = false;
            }
        }

        let gain = self.output_gain();
        (l * gain, r * gain)
    }
}
