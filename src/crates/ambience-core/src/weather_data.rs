//! Weather payload received from the weather/biome service

use crate::{time_of_day_from_localtime, BiomeType, TimeOfDay};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub location: Location,
    pub current: Current,
    pub biome: Biome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    /// Local wall-clock time, `"YYYY-MM-DD HH:MM"`
    pub localtime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Current {
    #[serde(default)]
    pub temp_c: f32,
    #[serde(default)]
    pub temp_f: f32,
    pub condition: Condition,
    #[serde(default)]
    pub wind_kph: f32,
    #[serde(default)]
    pub wind_mph: f32,
    #[serde(default)]
    pub wind_dir: String,
    #[serde(default)]
    pub humidity: f32,
    #[serde(default)]
    pub feelslike_c: f32,
    #[serde(default)]
    pub feelslike_f: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub text: String,
    /// WMO weather code
    pub code: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    #[serde(rename = "type")]
    pub kind: BiomeType,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl WeatherData {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        time_of_day_from_localtime(&self.location.localtime)
    }

    pub fn biome_type(&self) -> BiomeType {
        self.biome.kind
    }
}
