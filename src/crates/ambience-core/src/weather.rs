//! Weather intensity derived from WMO codes, and wind loudness

use serde::{Deserialize, Serialize};

/// Sound-relevant attributes of a WMO weather code
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherIntensity {
    /// Rain loudness (0.0 to 1.0)
    pub rain: f32,
    /// Thunder loudness (0.0 to 1.0)
    pub thunder: f32,
    pub snow: bool,
    pub fog: bool,
    pub has_precipitation: bool,
}

/// Map a WMO weather code to its intensity attributes
///
/// Within each category a more severe code never yields a lower value than a
/// milder one; codes sitting exactly on a breakpoint take the heavier value.
pub fn map_weather_to_intensity(code: u32) -> WeatherIntensity {
    let mut intensity = WeatherIntensity::default();

    match code {
        45 | 48 => intensity.fog = true,
        51..=57 => {
            intensity.rain = if code <= 53 {
                0.2
            } else if code <= 55 {
                0.35
            } else {
                0.5
            };
        }
        61..=67 => {
            intensity.rain = if code <= 63 {
                0.4
            } else if code <= 65 {
                0.7
            } else {
                0.9
            };
        }
        71..=77 | 85 | 86 => {
            intensity.snow = true;
            intensity.rain = 0.3;
        }
        80..=82 => {
            intensity.rain = match code {
                80 => 0.5,
                81 => 0.75,
                _ => 1.0,
            };
        }
        95..=99 => {
            intensity.rain = 0.8;
            intensity.thunder = if code <= 95 {
                0.6
            } else if code <= 96 {
                0.8
            } else {
                1.0
            };
        }
        _ => {}
    }

    intensity.has_precipitation = intensity.rain > 0.0
        || intensity.snow
        || matches!(code, 51..=67 | 80..=82 | 95..=99);

    intensity
}

/// Map wind speed (km/h) to a wind layer loudness in `[0.2, 1.0]`
///
/// Four segments: flat below 10, then linear 0.2→0.5 up to 25, 0.5→0.8 up to
/// 40, and 0.8→1.0 between 40 and 60 where it saturates.
pub fn calculate_wind_volume(wind_kph: f32) -> f32 {
    if !wind_kph.is_finite() || wind_kph < 10.0 {
        return 0.2;
    }
    if wind_kph < 25.0 {
        return 0.2 + (wind_kph - 10.0) / 15.0 * 0.3;
    }
    if wind_kph < 40.0 {
        return 0.5 + (wind_kph - 25.0) / 15.0 * 0.3;
    }
    (0.8 + (wind_kph - 40.0) / 20.0 * 0.2).min(1.0)
}
