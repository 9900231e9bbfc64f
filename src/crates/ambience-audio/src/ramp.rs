//! Linear per-frame parameter ramp

/// A value gliding linearly toward a target, one step per frame
///
/// Retargeting always starts from the value reached so far, so cancelling a
/// ramp halfway never makes the value jump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainRamp {
    current: f32,
    target: f32,
    step: f32,
    remaining: u32,
}

impl GainRamp {
    pub fn new(value: f32) -> Self {
        GainRamp {
            current: value,
            target: value,
            step: 0.0,
            remaining: 0,
        }
    }

    /// Glide from the current value to `target` over `frames` frames
    ///
    /// Zero frames jumps straight to the target.
    pub fn ramp_to(&mut self, target: f32, frames: u32) {
        self.target = target;
        if frames == 0 {
            self.current = target;
            self.step = 0.0;
            self.remaining = 0;
        } else {
            self.step = (target - self.current) / frames as f32;
            self.remaining = frames;
        }
    }

    /// Advance one frame and return the new value
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining == 0 {
                self.current = self.target;
            } else {
                self.current += self.step;
            }
        }
        self.current
    }

    /// Advance `frames` frames without producing per-frame values
    pub fn skip(&mut self, frames: u32) {
        if frames >= self.remaining {
            self.current = self.target;
            self.remaining = 0;
        } else {
            self.remaining -= frames;
            self.current += self.step * frames as f32;
        }
    }

    pub fn value(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_ramping(&self) -> bool {
        self.remaining > 0
    }

    /// Frames until the target is reached
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Default for GainRamp {
    fn default() -> Self {
        Self::new(0.0)
    }
}
