//! Core types and composition rules for Ambience soundscapes
//!
//! This crate turns a location's environment (biome, local time, weather code,
//! wind speed) into an ordered list of named sound layers. It performs no audio
//! I/O: the playback engine in `ambience-audio` consumes the layers it produces.
//!
//! # Examples
//!
//! ```
//! use ambience_core::{compose_soundscape, BiomeType, TimeOfDay};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let layers = compose_soundscape(BiomeType::Ocean, TimeOfDay::Day, 61, 18.0, 70.0, &mut rng);
//! assert!(layers.iter().any(|l| l.sound_id == "ocean-waves"));
//! ```
//!
//! # Main Components
//!
//! - **BiomeType / TimeOfDay**: environment classification
//! - **WeatherIntensity**: derived rain/thunder/snow/fog attributes of a WMO code
//! - **SoundLayer**: one named sound with volume, fade and delay
//! - **compose**: per-biome composition rules
//! - **WeatherData**: the weather payload the application receives

pub mod biome;
pub mod compose;
pub mod layer;
pub mod weather;
pub mod weather_data;

pub use biome::{
    time_of_day_for_hour, time_of_day_from_localtime, BiomeType, ParseBiomeError,
    ParseTimeOfDayError, TimeOfDay,
};
pub use compose::{compose_soundscape, compose_with_draws, AccentDraws, ACCENT_PROBABILITY};
pub use layer::{LayerCategory, SoundLayer};
pub use weather::{calculate_wind_volume, map_weather_to_intensity, WeatherIntensity};
pub use weather_data::{Biome, Condition, Coordinates, Current, Location, WeatherData};
