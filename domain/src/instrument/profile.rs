//! Declared capabilities of a beamline endstation.

use crate::core::error::DomainError;
use crate::hypothesis::{Geometry, Span, format_number};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write;

/// q-range reachable in one scattering geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryCapability {
    pub geometry: Geometry,
    pub q_range: Span,
}

/// Area detector available for XPCS series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detector {
    pub name: String,
    /// Shortest frame period, seconds.
    pub min_frame_time_s: f64,
    /// Longest series the detector can buffer at once.
    pub max_frames: u64,
    pub pixel_size_um: f64,
}

impl Detector {
    pub fn max_frame_rate_hz(&self) -> f64 {
        1.0 / self.min_frame_time_s
    }
}

/// Sample environment (cryostat, furnace, rheometer...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleEnvironment {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub temperature_k: Span,
}

impl SampleEnvironment {
    /// Case-insensitive match on the name or any alias.
    pub fn matches(&self, name: &str) -> bool {
        let needle = name.trim();
        self.name.eq_ignore_ascii_case(needle)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(needle))
    }
}

/// Capability sheet an experiment is checked against (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentProfile {
    pub name: String,
    pub facility: String,
    pub energy_kev: Span,
    pub max_series_duration_s: f64,
    /// Horizontal x vertical, micrometres.
    pub beam_size_um: (f64, f64),
    pub geometries: Vec<GeometryCapability>,
    pub detectors: Vec<Detector>,
    #[serde(default)]
    pub environments: Vec<SampleEnvironment>,
}

impl InstrumentProfile {
    /// Built-in profile for the APS 8-ID-I XPCS endstation.
    ///
    /// The figures are representative of a post-upgrade coherent SAXS/WAXS
    /// endstation and are meant to be replaced by facility-maintained data
    /// through `[instrument] profile`.
    pub fn aps_8id_i() -> Self {
        Self {
            name: "8-ID-I".to_string(),
            facility: "Advanced Photon Source".to_string(),
            energy_kev: Span { min: 7.0, max: 15.0 },
            max_series_duration_s: 3600.0,
            beam_size_um: (10.0, 10.0),
            geometries: vec![
                GeometryCapability {
                    geometry: Geometry::Saxs,
                    q_range: Span { min: 0.0015, max: 0.15 },
                },
                GeometryCapability {
                    geometry: Geometry::Waxs,
                    q_range: Span { min: 0.1, max: 3.5 },
                },
                GeometryCapability {
                    geometry: Geometry::GrazingIncidence,
                    q_range: Span { min: 0.003, max: 0.1 },
                },
            ],
            detectors: vec![
                Detector {
                    name: "Rigaku XPCS 3M".to_string(),
                    min_frame_time_s: 2.0e-5,
                    max_frames: 1_000_000,
                    pixel_size_um: 76.0,
                },
                Detector {
                    name: "Eiger2 4M".to_string(),
                    min_frame_time_s: 5.0e-4,
                    max_frames: 200_000,
                    pixel_size_um: 75.0,
                },
            ],
            environments: vec![
                SampleEnvironment {
                    name: "ambient".to_string(),
                    aliases: vec!["room temperature".to_string(), "none".to_string()],
                    temperature_k: Span { min: 290.0, max: 300.0 },
                },
                SampleEnvironment {
                    name: "cryostat".to_string(),
                    aliases: vec!["cryo".to_string(), "cold finger".to_string()],
                    temperature_k: Span { min: 10.0, max: 350.0 },
                },
                SampleEnvironment {
                    name: "furnace".to_string(),
                    aliases: vec!["heater".to_string(), "hot stage".to_string()],
                    temperature_k: Span { min: 300.0, max: 1200.0 },
                },
                SampleEnvironment {
                    name: "rheometer".to_string(),
                    aliases: vec!["rheo-xpcs".to_string(), "shear cell".to_string()],
                    temperature_k: Span { min: 263.0, max: 423.0 },
                },
            ],
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |msg: String| DomainError::InvalidInstrument(format!("{}: {msg}", self.name));

        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInstrument("profile name is empty".into()));
        }
        self.energy_kev.check_positive("energy_kev").map_err(invalid)?;
        if !(self.max_series_duration_s.is_finite() && self.max_series_duration_s > 0.0) {
            return Err(invalid("max_series_duration_s must be positive".into()));
        }
        if self.geometries.is_empty() {
            return Err(invalid("at least one geometry is required".into()));
        }
        if self.detectors.is_empty() {
            return Err(invalid("at least one detector is required".into()));
        }

        let mut seen = HashSet::new();
        for capability in &self.geometries {
            if !seen.insert(capability.geometry) {
                return Err(invalid(format!("geometry {} listed twice", capability.geometry)));
            }
            capability
                .q_range
                .check_positive(&format!("{} q_range", capability.geometry))
                .map_err(invalid)?;
        }

        let mut names = HashSet::new();
        for detector in &self.detectors {
            if !names.insert(detector.name.to_lowercase()) {
                return Err(invalid(format!("detector '{}' listed twice", detector.name)));
            }
            if !(detector.min_frame_time_s.is_finite() && detector.min_frame_time_s > 0.0) {
                return Err(invalid(format!(
                    "detector '{}': min_frame_time_s must be positive",
                    detector.name
                )));
            }
            if detector.max_frames == 0 {
                return Err(invalid(format!(
                    "detector '{}': max_frames must be at least 1",
                    detector.name
                )));
            }
        }

        let mut env_names = HashSet::new();
        for env in &self.environments {
            if !env_names.insert(env.name.to_lowercase()) {
                return Err(invalid(format!("environment '{}' listed twice", env.name)));
            }
            env.temperature_k
                .check(&format!("environment '{}' temperature_k", env.name))
                .map_err(invalid)?;
        }
        Ok(())
    }

    /// Detector with the shortest frame time.
    pub fn fastest_detector(&self) -> Option<&Detector> {
        self.detectors
            .iter()
            .min_by(|a, b| a.min_frame_time_s.total_cmp(&b.min_frame_time_s))
    }

    pub fn geometry(&self, geometry: Geometry) -> Option<&GeometryCapability> {
        self.geometries.iter().find(|c| c.geometry == geometry)
    }

    pub fn find_environment(&self, name: &str) -> Option<&SampleEnvironment> {
        self.environments.iter().find(|e| e.matches(name))
    }

    /// Compact multi-line description embedded into prompts.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Instrument: {} ({})", self.name, self.facility);
        let _ = writeln!(out, "Energy: {} keV", self.energy_kev);
        let _ = writeln!(
            out,
            "Beam: {} x {} um, longest continuous series: {} s",
            format_number(self.beam_size_um.0),
            format_number(self.beam_size_um.1),
            format_number(self.max_series_duration_s)
        );
        for capability in &self.geometries {
            let _ = writeln!(
                out,
                "Geometry {} ({}): q = {} 1/A",
                capability.geometry,
                capability.geometry.description(),
                capability.q_range
            );
        }
        for detector in &self.detectors {
            let _ = writeln!(
                out,
                "Detector {}: frame time >= {} s, up to {} frames, {} um pixels",
                detector.name,
                format_number(detector.min_frame_time_s),
                detector.max_frames,
                format_number(detector.pixel_size_um)
            );
        }
        for env in &self.environments {
            let _ = writeln!(out, "Environment {}: {} K", env.name, env.temperature_k);
        }
        out
    }
}

impl Default for InstrumentProfile {
    fn default() -> Self {
        Self::aps_8id_i()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profile_is_valid() {
        InstrumentProfile::aps_8id_i().validate().unwrap();
    }

    #[test]
    fn test_fastest_detector() {
        let profile = InstrumentProfile::aps_8id_i();
        assert_eq!(profile.fastest_detector().unwrap().name, "Rigaku XPCS 3M");
    }

    #[test]
    fn test_find_environment_by_alias_case_insensitive() {
        let profile = InstrumentProfile::aps_8id_i();
        assert_eq!(profile.find_environment("CRYO").unwrap().name, "cryostat");
        assert_eq!(profile.find_environment("Hot Stage").unwrap().name, "furnace");
        assert!(profile.find_environment("magnet").is_none());
    }

    #[test]
    fn test_validate_rejects_duplicate_geometry() {
        let mut profile = InstrumentProfile::aps_8id_i();
        let dup = profile.geometries[0].clone();
        profile.geometries.push(dup);
        let err = profile.validate().unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_validate_rejects_missing_detectors() {
        let mut profile = InstrumentProfile::aps_8id_i();
        profile.detectors.clear();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_frame_time() {
        let mut profile = InstrumentProfile::aps_8id_i();
        profile.detectors[0].min_frame_time_s = 0.0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_summary_mentions_every_capability() {
        let summary = InstrumentProfile::aps_8id_i().summary();
        assert!(summary.contains("8-ID-I"));
        assert!(summary.contains("Geometry waxs"));
        assert!(summary.contains("Eiger2 4M"));
        assert!(summary.contains("Environment furnace"));
    }

    #[test]
    fn test_profile_from_toml() {
        let src = r#"
name = "Test-ID"
facility = "Somewhere"
energy_kev = [8.0, 12.0]
max_series_duration_s = 600.0
beam_size_um = [5.0, 5.0]

[[geometries]]
geometry = "saxs"
q_range = [0.002, 0.1]

[[detectors]]
name = "fast"
min_frame_time_s = 1e-4
max_frames = 10000
pixel_size_um = 55.0
"#;
        let profile: InstrumentProfile = toml::from_str(src).unwrap();
        profile.validate().unwrap();
        assert!(profile.environments.is_empty());
        assert_eq!(profile.beam_size_um, (5.0, 5.0));
    }
}
