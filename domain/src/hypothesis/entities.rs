//! Hypothesis entity and the value objects it is made of.

use super::span::Span;
use crate::core::error::DomainError;
use crate::core::string::slugify;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Scattering geometry requested by an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Geometry {
    /// Transmission small-angle scattering
    #[default]
    Saxs,
    /// Wide-angle scattering
    Waxs,
    /// Grazing-incidence XPCS on surfaces and thin films
    GrazingIncidence,
}

impl Geometry {
    pub const ALL: [Geometry; 3] = [Geometry::Saxs, Geometry::Waxs, Geometry::GrazingIncidence];

    pub fn as_str(&self) -> &'static str {
        match self {
            Geometry::Saxs => "saxs",
            Geometry::Waxs => "waxs",
            Geometry::GrazingIncidence => "gixpcs",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Geometry::Saxs => "transmission small-angle",
            Geometry::Waxs => "wide-angle",
            Geometry::GrazingIncidence => "grazing-incidence",
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Geometry {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['_', ' '], "-");
        match key.as_str() {
            "saxs" | "xpcs-saxs" | "small-angle" | "transmission" | "usaxs" => Ok(Geometry::Saxs),
            "waxs" | "xpcs-waxs" | "wide-angle" => Ok(Geometry::Waxs),
            "gixpcs" | "gi-xpcs" | "gisaxs" | "gi" | "grazing" | "grazing-incidence" => {
                Ok(Geometry::GrazingIncidence)
            }
            _ => Err(DomainError::InvalidHypothesis(format!(
                "unknown geometry '{s}' (expected saxs, waxs or gixpcs)"
            ))),
        }
    }
}

impl TryFrom<String> for Geometry {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Geometry> for String {
    fn from(value: Geometry) -> Self {
        value.as_str().to_string()
    }
}

/// Broad class of the sample material.
///
/// Drives the radiation dose rule; unknown classes are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SampleClass {
    Colloid,
    Polymer,
    Glass,
    Metal,
    Magnetic,
    ChargeDensityWave,
    Biological,
    Other(String),
}

impl SampleClass {
    pub fn as_str(&self) -> &str {
        match self {
            SampleClass::Colloid => "colloid",
            SampleClass::Polymer => "polymer",
            SampleClass::Glass => "glass",
            SampleClass::Metal => "metal",
            SampleClass::Magnetic => "magnetic",
            SampleClass::ChargeDensityWave => "charge_density_wave",
            SampleClass::Biological => "biological",
            SampleClass::Other(s) => s,
        }
    }

    /// Soft matter that degrades under a focused coherent beam.
    pub fn is_radiation_sensitive(&self) -> bool {
        matches!(self, SampleClass::Polymer | SampleClass::Biological)
    }
}

impl Default for SampleClass {
    fn default() -> Self {
        SampleClass::Other("unspecified".to_string())
    }
}

impl fmt::Display for SampleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SampleClass {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        Ok(match key.as_str() {
            "colloid" | "colloids" | "colloidal" | "suspension" => SampleClass::Colloid,
            "polymer" | "polymers" | "polymer_melt" | "gel" | "hydrogel" => SampleClass::Polymer,
            "glass" | "glasses" | "metallic_glass" | "supercooled_liquid" => SampleClass::Glass,
            "metal" | "alloy" => SampleClass::Metal,
            "magnetic" | "magnet" | "magnetic_domains" => SampleClass::Magnetic,
            "charge_density_wave" | "cdw" => SampleClass::ChargeDensityWave,
            "biological" | "bio" | "protein" | "proteins" => SampleClass::Biological,
            _ => SampleClass::Other(s.trim().to_string()),
        })
    }
}

impl Serialize for SampleClass {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SampleClass {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(class) = s.parse::<SampleClass>();
        Ok(class)
    }
}

/// What is put in the beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSpec {
    pub material: String,
    #[serde(default)]
    pub class: SampleClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness_mm: Option<f64>,
}

impl SampleSpec {
    pub fn new(material: impl Into<String>, class: SampleClass) -> Self {
        Self {
            material: material.into(),
            class,
            thickness_mm: None,
        }
    }
}

/// A structured, testable XPCS experiment hypothesis (Entity)
///
/// `q_range` is in inverse Ångström, `timescale` is the band of relaxation
/// times (seconds) the experiment must resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub statement: String,
    #[serde(default)]
    pub geometry: Geometry,
    pub q_range: Span,
    pub timescale: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_kev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_k: Option<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    pub sample: SampleSpec,
}

impl Hypothesis {
    /// Check every invariant the evaluator relies on.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::InvalidHypothesis("title is empty".into()));
        }
        if self.statement.trim().is_empty() {
            return Err(DomainError::InvalidHypothesis("statement is empty".into()));
        }
        if self.sample.material.trim().is_empty() {
            return Err(DomainError::InvalidHypothesis(
                "sample.material is empty".into(),
            ));
        }
        if let Some(thickness) = self.sample.thickness_mm
            && !(thickness.is_finite() && thickness > 0.0)
        {
            return Err(DomainError::InvalidHypothesis(format!(
                "sample.thickness_mm must be positive (got {thickness})"
            )));
        }
        self.q_range.validate_positive("q_range")?;
        self.timescale.validate_positive("timescale")?;
        if let Some(energy) = self.energy_kev
            && !(energy.is_finite() && energy > 0.0)
        {
            return Err(DomainError::InvalidHypothesis(format!(
                "energy_kev must be positive (got {energy})"
            )));
        }
        if let Some(temperature) = &self.temperature_k {
            temperature.validate("temperature_k")?;
            if temperature.min < 0.0 {
                return Err(DomainError::InvalidHypothesis(format!(
                    "temperature_k is in kelvin and cannot be negative (got {})",
                    temperature.min
                )));
            }
        }
        if let Some(environment) = &self.environment
            && environment.trim().is_empty()
        {
            return Err(DomainError::InvalidHypothesis(
                "environment is set but empty".into(),
            ));
        }
        Ok(())
    }

    /// Trim text fields, drop empty optionals and derive `id` from the title.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.statement = self.statement.trim().to_string();
        self.sample.material = self.sample.material.trim().to_string();
        self.environment = self
            .environment
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self.rationale = self
            .rationale
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self.references.retain(|r| !r.trim().is_empty());
        if self.id.trim().is_empty() {
            self.id = slugify(&self.title);
        }
        self
    }
}

/// Fluent construction of a [`Hypothesis`], validated on [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct HypothesisBuilder {
    id: Option<String>,
    title: String,
    statement: String,
    sample: Option<SampleSpec>,
    q_range: Option<Span>,
    timescale: Option<Span>,
    geometry: Geometry,
    energy_kev: Option<f64>,
    temperature_k: Option<Span>,
    environment: Option<String>,
    rationale: Option<String>,
    references: Vec<String>,
}

impl HypothesisBuilder {
    pub fn new(title: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            statement: statement.into(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn sample(mut self, material: impl Into<String>, class: SampleClass) -> Self {
        self.sample = Some(SampleSpec::new(material, class));
        self
    }

    pub fn thickness_mm(mut self, thickness: f64) -> Self {
        if let Some(sample) = self.sample.as_mut() {
            sample.thickness_mm = Some(thickness);
        }
        self
    }

    pub fn q_range(mut self, min: f64, max: f64) -> Self {
        self.q_range = Some(Span { min, max });
        self
    }

    pub fn timescale(mut self, min_s: f64, max_s: f64) -> Self {
        self.timescale = Some(Span {
            min: min_s,
            max: max_s,
        });
        self
    }

    pub fn geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn energy_kev(mut self, energy: f64) -> Self {
        self.energy_kev = Some(energy);
        self
    }

    pub fn temperature_k(mut self, min: f64, max: f64) -> Self {
        self.temperature_k = Some(Span { min, max });
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.references.push(reference.into());
        self
    }

    pub fn build(self) -> Result<Hypothesis, DomainError> {
        let sample = self
            .sample
            .ok_or_else(|| DomainError::InvalidHypothesis("sample is required".into()))?;
        let q_range = self
            .q_range
            .ok_or_else(|| DomainError::InvalidHypothesis("q_range is required".into()))?;
        let timescale = self
            .timescale
            .ok_or_else(|| DomainError::InvalidHypothesis("timescale is required".into()))?;

        let hypothesis = Hypothesis {
            id: self.id.unwrap_or_default(),
            title: self.title,
            statement: self.statement,
            geometry: self.geometry,
            q_range,
            timescale,
            energy_kev: self.energy_kev,
            temperature_k: self.temperature_k,
            environment: self.environment,
            rationale: self.rationale,
            references: self.references,
            sample,
        }
        .normalized();
        hypothesis.validate()?;
        Ok(hypothesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colloid() -> HypothesisBuilder {
        HypothesisBuilder::new(
            "Silica colloid diffusion",
            "Dilute silica spheres in glycerol show Stokes-Einstein diffusion.",
        )
        .sample("silica in glycerol", SampleClass::Colloid)
        .q_range(0.002, 0.02)
        .timescale(0.01, 10.0)
    }

    #[test]
    fn test_builder_generates_id_from_title() {
        let h = colloid().build().unwrap();
        assert_eq!(h.id, "silica-colloid-diffusion");
        assert_eq!(h.geometry, Geometry::Saxs);
    }

    #[test]
    fn test_builder_requires_q_range() {
        let err = HypothesisBuilder::new("t", "s")
            .sample("x", SampleClass::Glass)
            .timescale(1.0, 2.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("q_range"));
    }

    #[test]
    fn test_validate_rejects_non_positive_q() {
        let err = colloid().q_range(0.0, 0.02).build().unwrap_err();
        assert!(err.is_invalid_hypothesis());
        assert!(err.to_string().contains("q_range"));
    }

    #[test]
    fn test_validate_rejects_inverted_timescale() {
        let err = colloid().timescale(10.0, 1.0).build().unwrap_err();
        assert!(err.to_string().contains("timescale"));
    }

    #[test]
    fn test_validate_rejects_negative_temperature() {
        assert!(colloid().temperature_k(-5.0, 300.0).build().is_err());
        assert!(colloid().temperature_k(4.0, 300.0).build().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert!(HypothesisBuilder::new("  ", "s")
            .sample("x", SampleClass::Glass)
            .q_range(0.01, 0.1)
            .timescale(1.0, 2.0)
            .build()
            .is_err());
        assert!(colloid().environment("   ").build().is_ok());
        assert!(colloid().energy_kev(-1.0).build().is_err());
    }

    #[test]
    fn test_geometry_aliases() {
        assert_eq!("SAXS".parse::<Geometry>().unwrap(), Geometry::Saxs);
        assert_eq!("wide angle".parse::<Geometry>().unwrap(), Geometry::Waxs);
        assert_eq!(
            "GI-XPCS".parse::<Geometry>().unwrap(),
            Geometry::GrazingIncidence
        );
        assert!("powder".parse::<Geometry>().is_err());
    }

    #[test]
    fn test_sample_class_parsing_and_sensitivity() {
        assert_eq!("CDW".parse::<SampleClass>().unwrap(), SampleClass::ChargeDensityWave);
        assert_eq!("protein".parse::<SampleClass>().unwrap(), SampleClass::Biological);
        assert!(SampleClass::Polymer.is_radiation_sensitive());
        assert!(!SampleClass::Metal.is_radiation_sensitive());
        assert_eq!(
            "liquid crystal".parse::<SampleClass>().unwrap(),
            SampleClass::Other("liquid crystal".into())
        );
    }

    #[test]
    fn test_toml_roundtrip_shape() {
        let src = r#"
title = "Polymer melt reptation"
statement = "Entangled PS melt dynamics slow down as q^-2 at low q."
geometry = "saxs"
q_range = [0.003, 0.03]
timescale = [1.0, 1000.0]
temperature_k = [400.0, 450.0]
environment = "furnace"

[sample]
material = "polystyrene"
class = "polymer"
"#;
        let h: Hypothesis = toml::from_str(src).unwrap();
        let h = h.normalized();
        h.validate().unwrap();
        assert_eq!(h.id, "polymer-melt-reptation");
        assert_eq!(h.sample.class, SampleClass::Polymer);
        assert_eq!(h.temperature_k, Some(Span { min: 400.0, max: 450.0 }));

        let rendered = toml::to_string(&h).unwrap();
        let back: Hypothesis = toml::from_str(&rendered).unwrap();
        assert_eq!(back, h);
    }
}
