//! Soundscape composition
//!
//! Maps (biome, time of day, weather code, wind speed) to an ordered list of
//! [`SoundLayer`]s. The only nondeterminism is three independent accent draws
//! (birds, crickets, frogs), taken from a caller-supplied random source so the
//! result is reproducible under a seeded generator.

mod biomes;

use crate::{calculate_wind_volume, map_weather_to_intensity, BiomeType, SoundLayer, TimeOfDay, WeatherIntensity};
use rand::Rng;

/// Chance of each optional accent being included in a composition
pub const ACCENT_PROBABILITY: f64 = 0.3;

/// Fade-in used for biome beds
pub(crate) const BASE_FADE: f32 = 3.0;
/// Fade-in used for rain, thunder, snow and fog layers
pub(crate) const WEATHER_FADE: f32 = 4.0;
/// Fade-in used for animal and other accents
pub(crate) const ACCENT_FADE: f32 = 5.0;

/// Outcome of the per-call accent draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccentDraws {
    pub birds: bool,
    pub crickets: bool,
    pub frogs: bool,
}

impl AccentDraws {
    /// Draw birds, crickets and frogs, in that order
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        AccentDraws {
            birds: rng.gen_bool(ACCENT_PROBABILITY),
            crickets: rng.gen_bool(ACCENT_PROBABILITY),
            frogs: rng.gen_bool(ACCENT_PROBABILITY),
        }
    }

    pub fn all() -> Self {
        AccentDraws {
            birds: true,
            crickets: true,
            frogs: true,
        }
    }

    pub fn none() -> Self {
        AccentDraws::default()
    }
}

/// Everything a biome rule needs, resolved once per composition
#[derive(Debug, Clone, Copy)]
pub(crate) struct Environment {
    pub time: TimeOfDay,
    pub weather: WeatherIntensity,
    pub wind: f32,
    pub draws: AccentDraws,
}

impl Environment {
    pub fn is_day(&self) -> bool {
        self.time == TimeOfDay::Day
    }

    pub fn is_dark(&self) -> bool {
        matches!(self.time, TimeOfDay::Evening | TimeOfDay::Night)
    }
}

/// Compose a soundscape for the given environment
///
/// `humidity` is accepted for forward compatibility and does not influence the
/// result. An unknown biome yields an empty list.
pub fn compose_soundscape<R: Rng + ?Sized>(
    biome: BiomeType,
    time_of_day: TimeOfDay,
    weather_code: u32,
    wind_kph: f32,
    humidity: f32,
    rng: &mut R,
) -> Vec<SoundLayer> {
    let draws = AccentDraws::draw(rng);
    compose_with_draws(biome, time_of_day, weather_code, wind_kph, humidity, draws)
}

/// Deterministic composition with the accent draws already decided
pub fn compose_with_draws(
    biome: BiomeType,
    time_of_day: TimeOfDay,
    weather_code: u32,
    wind_kph: f32,
    _humidity: f32,
    draws: AccentDraws,
) -> Vec<SoundLayer> {
    let env = Environment {
        time: time_of_day,
        weather: map_weather_to_intensity(weather_code),
        wind: calculate_wind_volume(wind_kph),
        draws,
    };

    let layers = match biome {
        BiomeType::City => biomes::city(&env),
        BiomeType::Forest => biomes::forest(&env),
        BiomeType::Field => biomes::field(&env),
        BiomeType::Beach => biomes::beach(&env),
        BiomeType::Lake => biomes::lake(&env),
        BiomeType::Ocean => biomes::ocean(&env),
        BiomeType::Desert => biomes::desert(&env),
        BiomeType::Unknown => Vec::new(),
    };

    log::debug!(
        "Composed {} layers for {} / {} (code {}, wind {:.1} kph)",
        layers.len(),
        biome,
        time_of_day,
        weather_code,
        wind_kph
    );

    layers
}

/// Rain asset for a given intensity
pub(crate) fn rain_asset(rain: f32) -> &'static str {
    if rain >= 0.7 {
        "rain-heavy"
    } else if rain >= 0.4 {
        "rain-medium"
    } else {
        "rain-light"
    }
}

/// Thunder asset for a given intensity
pub(crate) fn thunder_asset(thunder: f32) -> &'static str {
    if thunder >= 0.8 {
        "thunder-close"
    } else {
        "thunder-distant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const WATER_IDS: [&str; 4] = ["ocean-waves", "ocean-deep", "beach-waves", "lake-lapping"];

    fn ids(layers: &[SoundLayer]) -> Vec<&str> {
        layers.iter().map(|l| l.sound_id.as_str()).collect()
    }

    #[test]
    fn test_unknown_biome_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let layers = compose_soundscape(BiomeType::Unknown, TimeOfDay::Day, 95, 50.0, 90.0, &mut rng);
        assert!(layers.is_empty());
    }

    #[test]
    fn test_desert_has_wind_and_no_water() {
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let layers = compose_soundscape(BiomeType::Desert, TimeOfDay::Day, 0, 5.0, 50.0, &mut rng);
            assert!(layers.iter().any(|l| l.sound_id == "wind-desert"));
            assert!(!layers.iter().any(|l| WATER_IDS.contains(&l.sound_id.as_str())));
        }
    }

    #[test]
    fn test_desert_never_uses_water_in_any_weather() {
        for code in 0..100 {
            for time in [TimeOfDay::Day, TimeOfDay::Evening, TimeOfDay::Night] {
                let layers = compose_with_draws(BiomeType::Desert, time, code, 45.0, 10.0, AccentDraws::all());
                assert!(!layers.iter().any(|l| WATER_IDS.contains(&l.sound_id.as_str())));
            }
        }
    }

    #[test]
    fn test_ocean_base_bed() {
        let layers = compose_with_draws(BiomeType::Ocean, TimeOfDay::Night, 0, 0.0, 50.0, AccentDraws::none());
        assert_eq!(ids(&layers), vec!["ocean-waves", "ocean-deep", "wind-coastal"]);
        assert!(layers.iter().all(|l| l.category == crate::LayerCategory::Base));
    }

    #[test]
    fn test_accents_follow_draws() {
        let with = compose_with_draws(BiomeType::Field, TimeOfDay::Day, 0, 0.0, 50.0, AccentDraws::all());
        assert!(ids(&with).contains(&"birds"));
        let without = compose_with_draws(BiomeType::Field, TimeOfDay::Day, 0, 0.0, 50.0, AccentDraws::none());
        assert!(!ids(&without).contains(&"birds"));

        let night = compose_with_draws(BiomeType::Field, TimeOfDay::Night, 0, 0.0, 50.0, AccentDraws::all());
        let night_ids = ids(&night);
        assert!(night_ids.contains(&"crickets"));
        assert!(night_ids.contains(&"frogs"));
        assert!(!night_ids.contains(&"birds"));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = compose_soundscape(BiomeType::Lake, TimeOfDay::Evening, 61, 12.0, 60.0, &mut StdRng::seed_from_u64(42));
        let b = compose_soundscape(BiomeType::Lake, TimeOfDay::Evening, 61, 12.0, 60.0, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_both_accent_branches_reachable() {
        let mut seen_birds = false;
        let mut seen_none = false;
        for seed in 0..64 {
            let draws = AccentDraws::draw(&mut StdRng::seed_from_u64(seed));
            seen_birds |= draws.birds;
            seen_none |= draws == AccentDraws::none();
        }
        assert!(seen_birds && seen_none);
    }

    #[test]
    fn test_humidity_is_ignored() {
        let dry = compose_with_draws(BiomeType::Forest, TimeOfDay::Day, 63, 20.0, 5.0, AccentDraws::all());
        let wet = compose_with_draws(BiomeType::Forest, TimeOfDay::Day, 63, 20.0, 100.0, AccentDraws::all());
        assert_eq!(dry, wet);
    }

    #[test]
    fn test_volumes_in_range() {
        for biome in BiomeType::ALL {
            for code in [0, 45, 51, 57, 61, 65, 67, 73, 82, 95, 99] {
                for wind in [0.0, 15.0, 35.0, 80.0] {
                    for layer in compose_with_draws(biome, TimeOfDay::Evening, code, wind, 50.0, AccentDraws::all()) {
                        assert!((0.0..=1.0).contains(&layer.volume), "{} {}", biome, layer.sound_id);
                        assert!(layer.fade_in_duration >= 0.0);
                        assert!(layer.start_delay >= 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_rain_asset_thresholds() {
        assert_eq!(rain_asset(0.2), "rain-light");
        assert_eq!(rain_asset(0.4), "rain-medium");
        assert_eq!(rain_asset(0.7), "rain-heavy");
        assert_eq!(thunder_asset(0.6), "thunder-distant");
        assert_eq!(thunder_asset(0.8), "thunder-close");
    }
}
