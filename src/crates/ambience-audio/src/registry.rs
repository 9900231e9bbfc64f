//! Static sound asset registry
//!
//! Every sound id maps to exactly one file stem inside a category directory.
//! Paths carry no extension; the loader probes the supported containers.

use crate::{AudioError, Result};
use std::path::{Path, PathBuf};

/// File extensions probed, in order, when locating an asset on disk
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["ogg", "mp3", "wav", "flac"];

/// Location of an asset relative to the asset root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetPath {
    /// Category directory (e.g. "water")
    pub directory: &'static str,
    /// File name without extension
    pub stem: &'static str,
}

impl AssetPath {
    /// Relative path without extension, e.g. `water/ocean-waves`
    pub fn relative(&self) -> String {
        format!("{}/{}", self.directory, self.stem)
    }

    /// Candidate files under `root`, one per supported extension
    pub fn candidates(&self, root: &Path) -> Vec<PathBuf> {
        SUPPORTED_EXTENSIONS
            .iter()
            .map(|ext| root.join(self.directory).join(format!("{}.{}", self.stem, ext)))
            .collect()
    }
}

/// (sound id, directory, file stem)
const ENTRIES: &[(&str, &str, &str)] = &[
    // animals
    ("birds", "animals", "birds-morning"),
    ("forest-birds", "animals", "forest-birds"),
    ("crickets", "animals", "crickets"),
    ("frogs", "animals", "frogs"),
    ("owl", "animals", "owl"),
    ("seagulls", "animals", "seagulls"),
    // city
    ("city-ambience", "city", "city-ambience"),
    ("city-night", "city", "city-night"),
    ("traffic", "city", "traffic"),
    // nature beds
    ("forest-ambience", "nature", "forest-ambience"),
    ("field-ambience", "nature", "field-ambience"),
    // rain
    ("rain-light", "rain", "rain-light"),
    ("rain-medium", "rain", "rain-medium"),
    ("rain-heavy", "rain", "rain-heavy"),
    ("rain-urban", "rain", "rain-on-pavement"),
    ("rain-canopy", "rain", "rain-on-leaves"),
    ("rain-on-water", "rain", "rain-on-water"),
    // thunder
    ("thunder-distant", "thunder", "thunder-distant"),
    ("thunder-close", "thunder", "thunder-close"),
    ("thunder-rolling", "thunder", "thunder-rolling"),
    // water bodies
    ("ocean-waves", "water", "ocean-waves"),
    ("ocean-deep", "water", "ocean-deep"),
    ("beach-waves", "water", "beach-waves"),
    ("lake-lapping", "water", "lake-lapping"),
    // other weather
    ("snowfall", "weather", "snowfall"),
    ("foghorn", "weather", "foghorn"),
    // wind
    ("wind-light", "wind", "wind-light"),
    ("wind-trees", "wind", "wind-trees"),
    ("wind-grass", "wind", "wind-grass"),
    ("wind-coastal", "wind", "wind-coastal"),
    ("wind-desert", "wind", "wind-desert"),
    ("wind-desert-gusts", "wind", "wind-desert-gusts"),
];

/// Lookup table from sound id to asset path
pub struct SoundRegistry;

impl SoundRegistry {
    /// Resolve a sound id, failing hard on ids the registry does not know
    pub fn resolve(sound_id: &str) -> Result<AssetPath> {
        ENTRIES
            .iter()
            .find(|(id, _, _)| *id == sound_id)
            .map(|(_, directory, stem)| AssetPath { directory, stem })
            .ok_or_else(|| AudioError::UnknownSoundId(sound_id.to_string()))
    }

    /// All registered sound ids
    pub fn ids() -> impl Iterator<Item = &'static str> {
        ENTRIES.iter().map(|(id, _, _)| *id)
    }
}
