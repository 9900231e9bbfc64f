//! Playback controller settings

use crate::bus::DEFAULT_INSIDE_HZ;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tunables for [`crate::AudioPlaybackController`]
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerConfig {
    /// Directory holding the category folders (`rain/`, `wind/`, ...)
    pub asset_root: PathBuf,
    /// Base URL tried once when an asset is missing on disk
    pub fallback_url: Option<String>,
    /// Fade-out length for layers leaving the soundscape
    pub release_seconds: f32,
    /// Ramp length when a persisting layer changes volume
    pub retarget_seconds: f32,
    /// Glide length of the inside filter cutoff
    pub filter_ramp_seconds: f32,
    pub inside_filter_hz: f32,
    pub initial_volume: f32,
    /// Fixed seed for accent draws; entropy when unset
    pub rng_seed: Option<u64>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            asset_root: PathBuf::from("assets/sounds"),
            fallback_url: None,
            release_seconds: 2.0,
            retarget_seconds: 1.0,
            filter_ramp_seconds: 0.5,
            inside_filter_hz: DEFAULT_INSIDE_HZ,
            initial_volume: 0.8,
            rng_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{"assetRoot": "/srv/sounds", "rngSeed": 7}"#).unwrap();
        assert_eq!(config.asset_root, PathBuf::from("/srv/sounds"));
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.release_seconds, 2.0);
        assert_eq!(config.inside_filter_hz, 600.0);
    }

    #[test]
    fn test_empty_object_is_default() {
        let config: ControllerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ControllerConfig::default());
    }
}
