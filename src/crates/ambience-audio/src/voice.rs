//! Voice represents the playback cursor of one layer's sample

use crate::Sample;
use std::sync::Arc;

/// A playback cursor over a decoded sample
pub struct Voice {
    /// The sample being played
    sample: Arc<Sample>,
    /// Current playback position (in frames)
    position: f64,
    /// Wrap around at the end instead of finishing
    looping: bool,
    /// Whether this voice still produces sound
    active: bool,
}

impl Voice {
    /// Create a new voice for the given sample
    pub fn new(sample: Arc<Sample>, looping: bool) -> Self {
        let active = sample.frames() > 0;
        Voice {
            sample,
            position: 0.0,
            looping,
            active,
        }
    }

    /// Check if this voice is still active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Get the next stereo frame (L, R)
    ///
    /// Returns None once a non-looping voice has played to the end.
    pub fn next_frame(&mut self, output_sample_rate: u32) -> Option<(f32, f32)> {
        if !self.active {
            return None;
        }

        let frames = self.sample.frames() as f64;
        if self.position >= frames {
            if self.looping {
                self.position %= frames;
            } else {
                self.active = false;
                return None;
            }
        }

        let frame = if self.sample.channels == 1 {
            // Mono: duplicate to both channels
            let s = self.interpolate_sample_at_position(self.position, 0);
            (s, s)
        } else {
            (
                self.interpolate_sample_at_position(self.position, 0),
                self.interpolate_sample_at_position(self.position, 1),
            )
        };

        // Advance position (accounting for sample rate differences)
        self.position += self.sample.sample_rate as f64 / output_sample_rate as f64;

        Some(frame)
    }

    /// Interpolate sample at the given fractional position using linear interpolation
    ///
    /// A looping voice interpolates its last frame toward the first one so the
    /// loop point does not click.
    fn interpolate_sample_at_position(&self, frame_position: f64, channel_offset: usize) -> f32 {
        let data = &self.sample.data;
        let channels = self.sample.channels as usize;

        let base_index = (frame_position.floor() as usize) * channels + channel_offset;
        if base_index >= data.len() {
            return 0.0;
        }

        let fraction = (frame_position - frame_position.floor()) as f32;
        let sample_current = data[base_index];

        let mut next_index = base_index + channels;
        if next_index >= data.len() {
            if !self.looping {
                return sample_current;
            }
            next_index = channel_offset;
        }

        let sample_next = data[next_index];
        sample_current + (sample_next - sample_current) * fraction
    }
}
