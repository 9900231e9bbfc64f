//! Asset loading and decoding
//!
//! Resolves sound ids through the registry, decodes the file with Symphonia
//! into interleaved f32, and caches the result so a sound that returns in a
//! later snapshot starts without touching the disk again.

use crate::registry::{AssetPath, SoundRegistry, SUPPORTED_EXTENSIONS};
use crate::{AudioError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// A decoded sound with interleaved PCM data
#[derive(Debug, Clone)]
pub struct Sample {
    /// Sound id this sample was loaded for
    pub name: String,
    /// Audio data (interleaved f32, normalized to [-1.0, 1.0])
    pub data: Arc<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl Sample {
    /// Build a sample from raw interleaved data
    pub fn from_interleaved(name: impl Into<String>, data: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Sample {
            name: name.into(),
            data: Arc::new(data),
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Get the duration of this sample in seconds
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Get the number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels as usize
    }
}

/// Loads and caches decoded sounds
pub struct SampleLoader {
    /// Decoded sounds keyed by sound id
    cache: RwLock<HashMap<String, Arc<Sample>>>,
    /// Directory holding the category folders
    asset_root: PathBuf,
    /// Base URL tried once when the local file cannot be loaded
    fallback_base_url: Option<String>,
}

impl SampleLoader {
    /// Create a new loader reading from `asset_root`
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        SampleLoader {
            cache: RwLock::new(HashMap::new()),
            asset_root: asset_root.into(),
            fallback_base_url: None,
        }
    }

    /// Set the fallback base URL for HTTP loading
    pub fn with_fallback_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// A previously decoded sound, if any
    pub fn cached(&self, sound_id: &str) -> Option<Arc<Sample>> {
        self.cache.read().get(sound_id).cloned()
    }

    /// Put an already decoded sound in the cache
    pub fn insert(&self, sound_id: impl Into<String>, sample: Sample) -> Arc<Sample> {
        let sample = Arc::new(sample);
        self.cache.write().insert(sound_id.into(), Arc::clone(&sample));
        sample
    }

    /// Load a sound by id
    ///
    /// Unknown ids fail immediately. A resolvable sound is read from disk; if
    /// that fails and a fallback URL is configured it is fetched from there
    /// once before giving up.
    pub fn load(&self, sound_id: &str) -> Result<Arc<Sample>> {
        let asset = SoundRegistry::resolve(sound_id)?;

        if let Some(sample) = self.cached(sound_id) {
            return Ok(sample);
        }

        let sample = match self.load_from_disk(sound_id, &asset) {
            Ok(sample) => sample,
            Err(disk_err) => match &self.fallback_base_url {
                Some(base) => {
                    log::warn!(
                        "Loading {} from disk failed ({}), retrying from {}",
                        sound_id,
                        disk_err,
                        base
                    );
                    self.load_from_url(sound_id, &asset, base).map_err(|http_err| {
                        AudioError::AssetLoad {
                            sound_id: sound_id.to_string(),
                            reason: format!("{}; fallback: {}", disk_err, http_err),
                        }
                    })?
                }
                None => {
                    return Err(AudioError::AssetLoad {
                        sound_id: sound_id.to_string(),
                        reason: disk_err.to_string(),
                    })
                }
            },
        };

        log::debug!(
            "Loaded {} ({:.1}s, {} Hz, {} ch)",
            sound_id,
            sample.duration(),
            sample.sample_rate,
            sample.channels
        );

        Ok(self.insert(sound_id, sample))
    }

    /// Read and decode the first candidate file that exists
    fn load_from_disk(&self, sound_id: &str, asset: &AssetPath) -> Result<Sample> {
        let path = asset
            .candidates(&self.asset_root)
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| {
                AudioError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no file for {} under {}", asset.relative(), self.asset_root.display()),
                ))
            })?;

        let bytes = std::fs::read(&path)?;
        self.decode_audio(&bytes, sound_id, &path.to_string_lossy())
    }

    /// Download and decode the asset from the fallback server
    fn load_from_url(&self, sound_id: &str, asset: &AssetPath, base: &str) -> Result<Sample> {
        let mut last_error = AudioError::HttpError(format!("no candidates for {}", sound_id));

        for ext in SUPPORTED_EXTENSIONS {
            let url = format!("{}/{}.{}", base, asset.relative(), ext);
            let response = match reqwest::blocking::get(&url) {
                Ok(r) if r.status().is_success() => r,
                Ok(r) => {
                    last_error = AudioError::HttpError(format!("{} returned {}", url, r.status()));
                    continue;
                }
                Err(e) => {
                    last_error = AudioError::HttpError(format!("Failed to download {}: {}", url, e));
                    continue;
                }
            };

            let bytes = response
                .bytes()
                .map_err(|e| AudioError::HttpError(format!("Failed to read bytes: {}", e)))?;
            return self.decode_audio(&bytes, sound_id, &url);
        }

        Err(last_error)
    }

    /// Decode audio data from bytes using Symphonia
    ///
    /// `location` is only used as a format hint (its extension) and in errors.
    pub fn decode_audio(&self, data: &[u8], sound_id: &str, location: &str) -> Result<Sample> {
        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = Path::new(location).extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| AudioError::DecodeError(format!("Failed to probe {}: {}", location, e)))?;

        let mut format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::DecodeError(format!("No audio track in {}", location)))?;

        let track_id = track.id;
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::DecodeError(format!("Failed to create decoder: {}", e)))?;

        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2) as u16;
        let mut audio_data: Vec<f32> = Vec::new();
        let mut buffer: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(AudioError::DecodeError(format!("Format error: {}", e))),
            };
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate = spec.rate;
                    channels = spec.channels.count() as u16;
                    let buf = buffer.get_or_insert_with(|| SampleBuffer::new(decoded.capacity() as u64, spec));
                    if buf.capacity() < decoded.capacity() * spec.channels.count() {
                        *buf = SampleBuffer::new(decoded.capacity() as u64, spec);
                    }
                    buf.copy_interleaved_ref(decoded);
                    audio_data.extend_from_slice(buf.samples());
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    log::warn!("Skipping corrupt packet in {}: {}", location, e);
                }
                Err(e) => {
                    return Err(AudioError::DecodeError(format!("Failed to decode packet: {}", e)));
                }
            }
        }

        if audio_data.is_empty() {
            return Err(AudioError::DecodeError(format!("{} contains no audio", location)));
        }

        Ok(Sample::from_interleaved(sound_id, audio_data, sample_rate, channels))
    }
}
