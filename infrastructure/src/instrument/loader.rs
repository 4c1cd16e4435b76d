//! Loads an [`InstrumentProfile`] from TOML, falling back to the built-in 8-ID-I sheet.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use xpcs_domain::{DomainError, InstrumentProfile};

#[derive(Error, Debug)]
pub enum InstrumentLoadError {
    #[error("Failed to read instrument profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse instrument profile {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid instrument profile {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: DomainError,
    },
}

/// The profile at `path`, or the built-in profile when `path` is `None`.
///
/// Either way the result is validated.
pub fn load_instrument_profile(path: Option<&Path>) -> Result<InstrumentProfile, InstrumentLoadError> {
    let Some(path) = path else {
        debug!("Using built-in 8-ID-I instrument profile");
        let profile = InstrumentProfile::aps_8id_i();
        profile.validate().map_err(|source| InstrumentLoadError::Invalid {
            path: PathBuf::from("<built-in>"),
            source,
        })?;
        return Ok(profile);
    };

    let text = std::fs::read_to_string(path).map_err(|source| InstrumentLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let profile: InstrumentProfile = toml::from_str(&text).map_err(|e| InstrumentLoadError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;
    profile.validate().map_err(|source| InstrumentLoadError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Loaded instrument profile '{}' from {}", profile.name, path.display());
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xpcs_domain::Geometry;

    const CSSI: &str = r#"
name = "CSSI"
facility = "Advanced Photon Source"
energy_kev = [8.0, 12.0]
max_series_duration_s = 1800.0
beam_size_um = [2.0, 2.0]

[[geometries]]
geometry = "gixpcs"
q_range = [0.002, 0.08]

[[detectors]]
name = "Lambda 750k"
min_frame_time_s = 1e-4
max_frames = 500000
pixel_size_um = 55.0
"#;

    #[test]
    fn test_builtin_when_no_path() {
        let profile = load_instrument_profile(None).unwrap();
        assert_eq!(profile, InstrumentProfile::aps_8id_i());
    }

    #[test]
    fn test_loads_profile_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cssi.toml");
        std::fs::write(&path, CSSI).unwrap();

        let profile = load_instrument_profile(Some(&path)).unwrap();
        assert_eq!(profile.name, "CSSI");
        assert!(profile.geometry(Geometry::GrazingIncidence).is_some());
        assert!(profile.geometry(Geometry::Saxs).is_none());
        assert!(profile.environments.is_empty());
    }

    #[test]
    fn test_missing_file_error_names_path() {
        let err = load_instrument_profile(Some(Path::new("/no/such/profile.toml"))).unwrap_err();
        assert!(matches!(err, InstrumentLoadError::Io { .. }));
        assert!(err.to_string().contains("/no/such/profile.toml"));
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, CSSI.replace("min_frame_time_s = 1e-4", "min_frame_time_s = 0.0")).unwrap();

        let err = load_instrument_profile(Some(&path)).unwrap_err();
        assert!(matches!(err, InstrumentLoadError::Invalid { .. }));
    }

    #[test]
    fn test_parse_error_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "name = ").unwrap();
        assert!(matches!(
            load_instrument_profile(Some(&path)).unwrap_err(),
            InstrumentLoadError::Parse { .. }
        ));
    }
}
