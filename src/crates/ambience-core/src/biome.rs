//! Environment classification: terrain biome and time of day

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse environment category used to pick a base sound palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiomeType {
    City,
    Forest,
    Field,
    Beach,
    Lake,
    Ocean,
    Desert,
    /// Any biome name the classifier produced that has no sound palette
    #[serde(other)]
    Unknown,
}

impl BiomeType {
    /// All biomes that have a sound palette
    pub const ALL: [BiomeType; 7] = [
        BiomeType::City,
        BiomeType::Forest,
        BiomeType::Field,
        BiomeType::Beach,
        BiomeType::Lake,
        BiomeType::Ocean,
        BiomeType::Desert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BiomeType::City => "city",
            BiomeType::Forest => "forest",
            BiomeType::Field => "field",
            BiomeType::Beach => "beach",
            BiomeType::Lake => "lake",
            BiomeType::Ocean => "ocean",
            BiomeType::Desert => "desert",
            BiomeType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BiomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown biome: {0}")]
pub struct ParseBiomeError(pub String);

impl FromStr for BiomeType {
    type Err = ParseBiomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "city" => Ok(BiomeType::City),
            "forest" => Ok(BiomeType::Forest),
            "field" => Ok(BiomeType::Field),
            "beach" => Ok(BiomeType::Beach),
            "lake" => Ok(BiomeType::Lake),
            "ocean" => Ok(BiomeType::Ocean),
            "desert" => Ok(BiomeType::Desert),
            _ => Err(ParseBiomeError(s.to_string())),
        }
    }
}

/// Period of the day at the location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Day,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Day => "day",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time of day: {0}")]
pub struct ParseTimeOfDayError(pub String);

impl FromStr for TimeOfDay {
    type Err = ParseTimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(TimeOfDay::Day),
            "evening" => Ok(TimeOfDay::Evening),
            "night" => Ok(TimeOfDay::Night),
            _ => Err(ParseTimeOfDayError(s.to_string())),
        }
    }
}

/// Classify a local wall-clock hour (0-23)
pub fn time_of_day_for_hour(hour: u32) -> TimeOfDay {
    match hour {
        6..=16 => TimeOfDay::Day,
        17..=19 => TimeOfDay::Evening,
        _ => TimeOfDay::Night,
    }
}

/// Derive the time of day from a `"YYYY-MM-DD HH:MM"` local timestamp
///
/// Weather providers are not consistent about zero padding the hour, so both
/// `"2024-01-15 9:05"` and `"2024-01-15 09:05"` are accepted. Anything that
/// cannot be parsed falls back to day.
pub fn time_of_day_from_localtime(localtime: &str) -> TimeOfDay {
    match NaiveDateTime::parse_from_str(localtime.trim(), "%Y-%m-%d %H:%M") {
        Ok(dt) => time_of_day_for_hour(dt.hour()),
        Err(e) => {
            log::warn!("Unparseable local time {:?} ({}), assuming day", localtime, e);
            TimeOfDay::Day
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biome_parse() {
        assert_eq!("Ocean".parse::<BiomeType>(), Ok(BiomeType::Ocean));
        assert_eq!(" desert ".parse::<BiomeType>(), Ok(BiomeType::Desert));
        assert!("tundra".parse::<BiomeType>().is_err());
    }

    #[test]
    fn test_biome_serde_unknown() {
        let b: BiomeType = serde_json::from_str("\"tundra\"").unwrap();
        assert_eq!(b, BiomeType::Unknown);
        let b: BiomeType = serde_json::from_str("\"lake\"").unwrap();
        assert_eq!(b, BiomeType::Lake);
        assert_eq!(serde_json::to_string(&BiomeType::Field).unwrap(), "\"field\"");
    }

    #[test]
    fn test_hour_boundaries() {
        assert_eq!(time_of_day_for_hour(5), TimeOfDay::Night);
        assert_eq!(time_of_day_for_hour(6), TimeOfDay::Day);
        assert_eq!(time_of_day_for_hour(16), TimeOfDay::Day);
        assert_eq!(time_of_day_for_hour(17), TimeOfDay::Evening);
        assert_eq!(time_of_day_for_hour(19), TimeOfDay::Evening);
        assert_eq!(time_of_day_for_hour(20), TimeOfDay::Night);
        assert_eq!(time_of_day_for_hour(0), TimeOfDay::Night);
    }

    #[test]
    fn test_localtime_parsing() {
        assert_eq!(time_of_day_from_localtime("2024-06-01 14:30"), TimeOfDay::Day);
        assert_eq!(time_of_day_from_localtime("2024-06-01 18:05"), TimeOfDay::Evening);
        assert_eq!(time_of_day_from_localtime("2024-06-01 9:05"), TimeOfDay::Day);
        assert_eq!(time_of_day_from_localtime("2024-06-01 23:59"), TimeOfDay::Night);
        assert_eq!(time_of_day_from_localtime("garbage"), TimeOfDay::Day);
    }
}
