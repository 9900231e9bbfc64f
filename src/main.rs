//! Ambience - weather-driven ambient soundscapes
//!
//! - `compose`: print the layers a biome/weather combination produces
//! - `play`: play a weather file through the default output device
//! - `render`: render a weather file to WAV offline

mod config;
mod render;

use ambience_audio::AudioPlaybackController;
use ambience_core::{compose_soundscape, BiomeType, TimeOfDay, WeatherData};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::load_config;
use render::{render_to_wav, RenderParams};

#[derive(Parser, Debug)]
#[command(name = "ambience")]
#[command(about = "Weather-driven ambient soundscapes", long_about = None)]
struct Args {
    /// JSON config file (missing file means defaults)
    #[arg(short, long, default_value = "ambience.json", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the layers composed for an environment
    Compose {
        /// city, forest, field, beach, lake, ocean or desert
        #[arg(short, long)]
        biome: BiomeType,

        /// day, evening or night
        #[arg(short, long, default_value = "day")]
        time: TimeOfDay,

        /// WMO weather code
        #[arg(short = 'w', long, default_value = "0")]
        code: u32,

        /// Wind speed in km/h
        #[arg(long, default_value = "0.0")]
        wind: f32,

        /// Relative humidity in percent
        #[arg(long, default_value = "50.0")]
        humidity: f32,

        /// Seed for the accent draws
        #[arg(short, long)]
        seed: Option<u64>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Play a weather file through the default output device
    Play {
        /// Weather JSON file
        #[arg(long)]
        weather: PathBuf,

        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(short, long)]
        seconds: Option<f32>,

        /// Master volume, 0.0 to 1.0
        #[arg(short, long)]
        volume: Option<f32>,

        /// Muffle everything as if heard from indoors
        #[arg(long)]
        inside: bool,

        /// Re-read the weather file every N seconds
        #[arg(short, long)]
        refresh: Option<u64>,
    },

    /// Render a weather file to a WAV file
    Render {
        /// Weather JSON file
        #[arg(long)]
        weather: PathBuf,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, default_value = "30.0")]
        seconds: f32,

        #[arg(long, default_value = "48000")]
        sample_rate: u32,

        /// 16, 24 or 32 (float)
        #[arg(long, default_value = "16")]
        bit_depth: u16,

        /// Closing fade in seconds
        #[arg(long, default_value = "2.0")]
        fade_out: f32,
    },
}

fn main() -> Result<()> {
    // RUST_LOG overrides the default filter
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    match args.command {
        Command::Compose {
            biome,
            time,
            code,
            wind,
            humidity,
            seed,
            json,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let layers = compose_soundscape(biome, time, code, wind, humidity, &mut rng);
            if json {
                println!("{}", serde_json::to_string_pretty(&layers)?);
            } else {
                for layer in &layers {
                    println!(
                        "{:<8} {:<18} vol {:.2}  fade {:>4.1}s  delay {:>4.1}s  {}",
                        layer.category.to_string(),
                        layer.sound_id,
                        layer.volume,
                        layer.fade_in_duration,
                        layer.start_delay,
                        if layer.looping { "loop" } else { "once" }
                    );
                }
            }
        }

        Command::Play {
            weather,
            seconds,
            volume,
            inside,
            refresh,
        } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to start runtime")?;
            runtime.block_on(play(config.audio, &weather, seconds, volume, inside, refresh))?;
        }

        Command::Render {
            weather,
            output,
            seconds,
            sample_rate,
            bit_depth,
            fade_out,
        } => {
            let data = read_weather(&weather)?;
            let params = RenderParams {
                output_path: output,
                sample_rate,
                bit_depth,
                seconds,
                fade_out_seconds: fade_out,
            };
            let summary = render_to_wav(&data, config.audio, &params)
                .with_context(|| format!("Failed to render {}", params.output_path.display()))?;
            eprintln!(
                "Rendered {} frames ({} layers) to {}",
                summary.frames,
                summary.layers.len(),
                params.output_path.display()
            );
        }
    }

    Ok(())
}

fn read_weather(path: &Path) -> Result<WeatherData> {
    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    WeatherData::from_json(&json).with_context(|| format!("Failed to parse weather in {}", path.display()))
}

async fn play(
    config: ambience_audio::ControllerConfig,
    weather_path: &Path,
    seconds: Option<f32>,
    volume: Option<f32>,
    inside: bool,
    refresh: Option<u64>,
) -> Result<()> {
    let release = config.release_seconds;
    let mut controller = AudioPlaybackController::new(config);
    controller.initialize().context("Failed to open audio output")?;

    if let Some(volume) = volume {
        controller.set_master_volume(volume);
    }
    controller.set_inside_mode(inside);

    let weather = read_weather(weather_path)?;
    controller.update_soundscape(&weather);

    let stop_after = async {
        match seconds {
            Some(s) if s.is_finite() && s > 0.0 => tokio::time::sleep(Duration::from_secs_f32(s)).await,
            _ => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(stop_after);

    let mut ticker = tokio::time::interval(Duration::from_secs(refresh.unwrap_or(60).max(1)));
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    log::error!("Failed to listen for Ctrl-C: {}", e);
                }
                break;
            }
            _ = &mut stop_after => break,
            _ = ticker.tick(), if refresh.is_some() => {
                match read_weather(weather_path) {
                    Ok(weather) => {
                        let report = controller.update_soundscape(&weather);
                        log::info!(
                            "Refreshed: {} started, {} stopped, {} retargeted",
                            report.started.len(),
                            report.stopped.len(),
                            report.retargeted.len()
                        );
                    }
                    Err(e) => log::warn!("Keeping current soundscape: {:#}", e),
                }
            }
        }
    }

    controller.stop_soundscape(release);
    tokio::time::sleep(Duration::from_secs_f32(release.max(0.0))).await;
    controller.shutdown();
    Ok(())
}
