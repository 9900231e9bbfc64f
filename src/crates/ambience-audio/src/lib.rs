//! Layered ambient playback engine for Ambience soundscapes
//!
//! This crate realizes a soundscape snapshot (a list of [`SoundLayer`]s) as
//! concurrent audio:
//! - Resolves sound ids to asset files and decodes them off the audio thread
//! - Reconciles each new snapshot against what is playing (start, stop, retarget)
//! - Fades layers in and out per sample, cancelling ramps without jumps
//! - Routes every layer through one output bus carrying master volume, mute
//!   and the "inside" low-pass filter

pub mod bus;
pub mod config;
pub mod controller;
pub mod engine;
pub mod mixer;
pub mod ramp;
pub mod registry;
pub mod samples;
pub mod voice;

#[cfg(test)]
mod controller_tests;

pub use bus::{BusState, OutputBus};
pub use config::ControllerConfig;
pub use controller::{AudioPlaybackController, ControllerSnapshot, ReconcileReport};
pub use engine::{AudioEngine, ManualSink, OutputSink, RenderCallback};
pub use mixer::{LayerPhase, LayerStatus, Mixer};
pub use ramp::GainRamp;
pub use registry::{AssetPath, SoundRegistry};
pub use samples::{Sample, SampleLoader};
pub use voice::Voice;

/// Re-export common types from ambience-core
pub use ambience_core::{BiomeType, LayerCategory, SoundLayer, TimeOfDay, WeatherData};

/// Audio playback errors
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Audio device error: {0}")]
    DeviceError(String),

    #[error("Unknown sound id: {0}")]
    UnknownSoundId(String),

    #[error("Failed to load asset {sound_id}: {reason}")]
    AssetLoad { sound_id: String, reason: String },

    #[error("Failed to decode audio: {0}")]
    DecodeError(String),

    #[error("Failed to load asset from URL: {0}")]
    HttpError(String),

    #[error("Controller is not initialized")]
    NotInitialized,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AudioError>;
