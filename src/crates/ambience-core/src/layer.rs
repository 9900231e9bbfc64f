//! Sound layer descriptors produced by composition

use serde::{Deserialize, Serialize};
use std::fmt;

/// Informational grouping of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerCategory {
    /// Biome bed, always present
    Base,
    /// Rain, thunder, snow, fog
    Weather,
    /// Time-of-day or chance-driven additions
    Accent,
}

impl fmt::Display for LayerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerCategory::Base => write!(f, "base"),
            LayerCategory::Weather => write!(f, "weather"),
            LayerCategory::Accent => write!(f, "accent"),
        }
    }
}

/// One named sound in a soundscape snapshot
///
/// `sound_id` is the identity of the layer: two layers with the same id are
/// the same logical sound, whatever their category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundLayer {
    /// Key into the asset registry
    pub sound_id: String,
    /// Steady-state volume once fully faded in (0.0 to 1.0)
    pub volume: f32,
    /// Whether playback repeats indefinitely
    #[serde(rename = "loop")]
    pub looping: bool,
    pub category: LayerCategory,
    /// Seconds to ramp from silence to `volume` (0 = instant)
    #[serde(default)]
    pub fade_in_duration: f32,
    /// Seconds after reconciliation before the fade-in begins
    #[serde(default)]
    pub start_delay: f32,
}

impl SoundLayer {
    /// Create a looping layer with no fade and no delay
    pub fn new(sound_id: impl Into<String>, volume: f32, category: LayerCategory) -> Self {
        SoundLayer {
            sound_id: sound_id.into(),
            volume: volume.clamp(0.0, 1.0),
            looping: true,
            category,
            fade_in_duration: 0.0,
            start_delay: 0.0,
        }
    }

    pub fn base(sound_id: impl Into<String>, volume: f32) -> Self {
        Self::new(sound_id, volume, LayerCategory::Base)
    }

    pub fn weather(sound_id: impl Into<String>, volume: f32) -> Self {
        Self::new(sound_id, volume, LayerCategory::Weather)
    }

    pub fn accent(sound_id: impl Into<String>, volume: f32) -> Self {
        Self::new(sound_id, volume, LayerCategory::Accent)
    }

    pub fn fade_in(mut self, seconds: f32) -> Self {
        self.fade_in_duration = seconds.max(0.0);
        self
    }

    pub fn delay(mut self, seconds: f32) -> Self {
        self.start_delay = seconds.max(0.0);
        self
    }

    pub fn one_shot(mut self) -> Self {
        self.looping = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_clamps() {
        let layer = SoundLayer::base("wind-light", 1.4).fade_in(-2.0).delay(3.0);
        assert_eq!(layer.volume, 1.0);
        assert_eq!(layer.fade_in_duration, 0.0);
        assert_eq!(layer.start_delay, 3.0);
        assert!(layer.looping);
        assert!(!layer.clone().one_shot().looping);
    }

    #[test]
    fn test_layer_json_shape() {
        let layer = SoundLayer::accent("birds", 0.3).fade_in(5.0);
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["soundId"], "birds");
        assert_eq!(json["loop"], true);
        assert_eq!(json["category"], "accent");
        assert_eq!(json["fadeInDuration"], 5.0);

        let parsed: SoundLayer =
            serde_json::from_str(r#"{"soundId":"owl","volume":0.2,"loop":true,"category":"accent"}"#)
                .unwrap();
        assert_eq!(parsed.start_delay, 0.0);
        assert_eq!(parsed.fade_in_duration, 0.0);
    }
}
