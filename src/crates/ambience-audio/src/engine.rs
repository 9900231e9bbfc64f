//! Audio output sinks
//!
//! [`AudioEngine`] drives the default output device through cpal.
//! [`ManualSink`] has no device: whoever holds a clone pulls audio from it,
//! which is how offline rendering and the tests run the mixer.

use crate::{AudioError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::Arc;

/// Callback that fills an interleaved output buffer
pub type RenderCallback = Box<dyn FnMut(&mut [f32]) + Send + 'static>;

/// Something that periodically asks for interleaved audio
pub trait OutputSink {
    fn sample_rate(&self) -> u32;

    fn channels(&self) -> u16;

    /// Begin pulling audio from `callback`
    fn start(&mut self, callback: RenderCallback) -> Result<()>;

    /// Stop pulling audio and drop the callback
    fn stop(&mut self) -> Result<()>;

    fn is_running(&self) -> bool;
}

/// Audio output engine
pub struct AudioEngine {
    /// Audio output device
    device: Device,
    /// Stream configuration
    config: StreamConfig,
    /// Output stream (when active)
    stream: Option<Stream>,
    /// Sample rate
    sample_rate: u32,
}

impl AudioEngine {
    /// Create a new audio engine with the default output device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceError("No output device available".to_string()))?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceError(format!("Failed to get default config: {}", e)))?;

        let sample_rate = config.sample_rate().0;
        let config: StreamConfig = config.into();

        log::info!(
            "Using output device {:?} ({} Hz, {} channels)",
            device.name().unwrap_or_default(),
            sample_rate,
            config.channels
        );

        Ok(AudioEngine {
            device,
            config,
            stream: None,
            sample_rate,
        })
    }
}

impl OutputSink for AudioEngine {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.config.channels
    }

    fn start(&mut self, mut callback: RenderCallback) -> Result<()> {
        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback(data);
                },
                |err| {
                    log::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::DeviceError(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::DeviceError(format!("Failed to play stream: {}", e)))?;

        self.stream = Some(stream);

        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(s) = self.stream.take() {
            s.pause()
                .map_err(|e| AudioError::DeviceError(format!("Failed to stop stream: {}", e)))?;
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

struct ManualState {
    callback: Option<RenderCallback>,
    frames_rendered: u64,
}

/// Device-less sink driven by its holder
///
/// Clones share the same callback slot: hand one clone to the controller and
/// keep another to pull audio with [`ManualSink::render`].
#[derive(Clone)]
pub struct ManualSink {
    state: Arc<Mutex<ManualState>>,
    sample_rate: u32,
    channels: u16,
}

impl ManualSink {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        ManualSink {
            state: Arc::new(Mutex::new(ManualState {
                callback: None,
                frames_rendered: 0,
            })),
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Render `frames` frames of interleaved audio
    ///
    /// Returns silence when the sink has not been started.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut buffer = vec![0.0; frames * self.channels as usize];
        self.render_into(&mut buffer);
        buffer
    }

    /// Fill `buffer` (interleaved) from the callback
    pub fn render_into(&self, buffer: &mut [f32]) {
        let mut state = self.state.lock();
        match state.callback.as_mut() {
            Some(callback) => callback(buffer),
            None => buffer.fill(0.0),
        }
        state.frames_rendered += (buffer.len() / self.channels as usize) as u64;
    }

    /// Render `seconds` of audio in blocks of `block_frames`, discarding it
    pub fn advance(&self, seconds: f32, block_frames: usize) {
        let total = (seconds.max(0.0) * self.sample_rate as f32).round() as usize;
        let mut buffer = vec![0.0; block_frames.max(1) * self.channels as usize];
        let mut done = 0;
        while done < total {
            let frames = (total - done).min(block_frames.max(1));
            self.render_into(&mut buffer[..frames * self.channels as usize]);
            done += frames;
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.state.lock().frames_rendered
    }
}

impl OutputSink for ManualSink {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn start(&mut self, callback: RenderCallback) -> Result<()> {
        self.state.lock().callback = Some(callback);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.state.lock().callback = None;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.state.lock().callback.is_some()
    }
}
