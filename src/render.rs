//! Offline rendering of a soundscape to a WAV file

use ambience_audio::{AudioError, AudioPlaybackController, ControllerConfig, ManualSink};
use ambience_core::WeatherData;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::{Seek, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

const BLOCK_FRAMES: usize = 1024;
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hound error: {0}")]
    Hound(#[from] hound::Error),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Playback error: {0}")]
    Audio(#[from] AudioError),

    #[error("Timed out waiting for {0} sound(s) to load")]
    LoadTimeout(usize),
}

#[derive(Debug, Clone)]
pub struct RenderParams {
    pub output_path: PathBuf,
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub seconds: f32,
    /// Closing fade, taken from the end of the render
    pub fade_out_seconds: f32,
}

/// What ended up in the file
#[derive(Debug, Clone)]
pub struct RenderSummary {
    pub frames: u64,
    pub layers: Vec<String>,
}

impl RenderParams {
    pub fn validate(&self) -> Result<(), RenderError> {
        if ![16, 24, 32].contains(&self.bit_depth) {
            return Err(RenderError::InvalidParams(format!(
                "Bit depth must be 16, 24, or 32, got {}",
                self.bit_depth
            )));
        }

        if ![44100, 48000, 96000].contains(&self.sample_rate) {
            return Err(RenderError::InvalidParams(format!(
                "Sample rate must be 44100, 48000, or 96000 Hz, got {}",
                self.sample_rate
            )));
        }

        if !self.seconds.is_finite() || self.seconds <= 0.0 {
            return Err(RenderError::InvalidParams("Duration must be positive".to_string()));
        }

        if !self.fade_out_seconds.is_finite() || self.fade_out_seconds < 0.0 {
            return Err(RenderError::InvalidParams(
                "Fade-out must be zero or positive".to_string(),
            ));
        }

        Ok(())
    }

    fn spec(&self) -> WavSpec {
        WavSpec {
            channels: 2,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bit_depth,
            sample_format: if self.bit_depth == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Write interleaved stereo samples at the writer's bit depth
fn write_samples<W: Write + Seek>(
    writer: &mut WavWriter<W>,
    interleaved: &[f32],
    bit_depth: u16,
) -> Result<(), RenderError> {
    match bit_depth {
        16 => {
            for s in interleaved {
                writer.write_sample((s.clamp(-1.0, 1.0) * 32767.0) as i16)?;
            }
        }
        24 => {
            for s in interleaved {
                writer.write_sample((s.clamp(-1.0, 1.0) * 8388607.0) as i32)?;
            }
        }
        32 => {
            for s in interleaved {
                writer.write_sample(*s)?;
            }
        }
        other => {
            return Err(RenderError::InvalidParams(format!("Unsupported bit depth {}", other)));
        }
    }
    Ok(())
}

/// Wait until every layer either has its audio or was dropped
fn wait_for_loads(controller: &AudioPlaybackController) -> Result<(), RenderError> {
    let deadline = Instant::now() + LOAD_TIMEOUT;
    loop {
        let loading = controller.snapshot().layers.iter().filter(|l| !l.loaded).count();
        if loading == 0 {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(RenderError::LoadTimeout(loading));
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Compose the soundscape for `weather` and render it to `params.output_path`
pub fn render_to_wav(
    weather: &WeatherData,
    config: ControllerConfig,
    params: &RenderParams,
) -> Result<RenderSummary, RenderError> {
    params.validate()?;

    let mut controller = AudioPlaybackController::new(config);
    let sink = ManualSink::new(params.sample_rate, 2);
    controller.initialize_with_sink(Box::new(sink.clone()))?;

    let report = controller.update_soundscape(weather);
    for (id, reason) in &report.failed {
        log::warn!("Rendering without {}: {}", id, reason);
    }
    wait_for_loads(&controller)?;

    let layers: Vec<String> = controller
        .snapshot()
        .layers
        .into_iter()
        .map(|l| l.sound_id)
        .collect();
    log::info!("Rendering {:.1}s with {} layers", params.seconds, layers.len());

    let total = (params.seconds * params.sample_rate as f32).round() as u64;
    let fade = params.fade_out_seconds.min(params.seconds);
    let fade_start = total - (fade * params.sample_rate as f32).round() as u64;

    let mut writer = WavWriter::create(&params.output_path, params.spec())?;
    let mut buffer = vec![0.0f32; BLOCK_FRAMES * 2];
    let mut done: u64 = 0;
    let mut fading = false;

    while done < total {
        if !fading && done >= fade_start {
            controller.stop_soundscape(fade);
            fading = true;
        }
        let mut frames = (total - done).min(BLOCK_FRAMES as u64);
        if !fading {
            frames = frames.min(fade_start - done);
        }
        let block = &mut buffer[..frames as usize * 2];
        sink.render_into(block);
        write_samples(&mut writer, block, params.bit_depth)?;
        done += frames;
    }

    writer.finalize()?;
    controller.shutdown();

    log::info!("Wrote {} frames to {}", done, params.output_path.display());
    Ok(RenderSummary { frames: done, layers })
}
