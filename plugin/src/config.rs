//! Loading configuration documents from disk.

use crate::error::{LetMeOutError, Result};
use letmeout_shared::config::{HarnessConfig, ModConfig};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read and parse a JSON config file. Missing fields take their defaults.
pub fn load_from_path<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn load_mod_config(path: &Path) -> Result<ModConfig> {
    let config: ModConfig = load_from_path(path)?;
    config.validate().map_err(LetMeOutError::InvalidConfig)?;
    Ok(config)
}

pub fn load_harness_config(path: &Path) -> Result<HarnessConfig> {
    let config: HarnessConfig = load_from_path(path)?;
    config.validate().map_err(LetMeOutError::InvalidConfig)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn partial_document_fills_defaults() {
        let file = write_temp(r#"{ "containment": { "nudgeGain": 0.25 }, "rngSeed": 7 }"#);
        let config = load_mod_config(file.path()).unwrap();
        assert_eq!(config.containment.nudge_gain, 0.25);
        assert_eq!(config.containment.inner_band_factor, 0.98);
        assert_eq!(config.rng_seed, 7);
        assert_eq!(config.shell.layer, 11);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let file = write_temp(r#"{ "lifecycle": { "chargeStartDelay": -1.0 } }"#);
        let err = load_mod_config(file.path()).unwrap_err();
        assert!(matches!(err, LetMeOutError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let file = write_temp("{ not json");
        assert!(matches!(
            load_harness_config(file.path()),
            Err(LetMeOutError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_mod_config(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LetMeOutError::Io(_)));
    }
}
