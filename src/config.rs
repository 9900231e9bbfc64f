//! Application configuration file
//!
//! ```json
//! { "audio": { "assetRoot": "/usr/share/ambience/sounds", "releaseSeconds": 3.0 } }
//! ```

use ambience_audio::ControllerConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: ControllerConfig,
}

/// Load configuration from a JSON file
///
/// A missing file yields the defaults; a file that exists but does not parse
/// is an error.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        log::info!("Config file {} not found, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: AppConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;

    log::info!(
        "Loaded config from {} (assets in {})",
        path.display(),
        config.audio.asset_root.display()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = load_config(Path::new("/nonexistent/ambience.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let file = temp_file(r#"{"audio": {"releaseSeconds": 3.5, "fallbackUrl": "https://cdn.example"}}"#);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.audio.release_seconds, 3.5);
        assert_eq!(config.audio.fallback_url.as_deref(), Some("https://cdn.example"));
        assert_eq!(config.audio.retarget_seconds, 1.0);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let file = temp_file("{ audio: ");
        assert!(load_config(file.path()).is_err());
    }
}
