//! Closed numeric interval used for q-ranges, timescales, energies and temperatures.

use crate::core::error::DomainError;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};

/// Closed interval `[min, max]` (Value Object)
///
/// Serialized as a two-element array (`[0.001, 0.02]`) so TOML hypothesis
/// files stay compact; `{ min = .., max = .. }` tables are accepted as well.
/// Deserialization does not validate, callers go through [`Span::validate`]
/// or the owning entity's `validate()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    /// Create a validated span.
    pub fn new(min: f64, max: f64) -> Result<Self, DomainError> {
        let span = Self { min, max };
        span.validate("span")?;
        Ok(span)
    }

    /// Degenerate span holding a single value.
    pub fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Check finiteness and ordering; `what` names the field in the message.
    pub fn check(&self, what: &str) -> Result<(), String> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(format!("{what}: bounds must be finite numbers"));
        }
        if self.min > self.max {
            return Err(format!(
                "{what}: min ({}) is greater than max ({})",
                self.min, self.max
            ));
        }
        Ok(())
    }

    /// [`check`](Self::check) plus `min > 0`.
    pub fn check_positive(&self, what: &str) -> Result<(), String> {
        self.check(what)?;
        if self.min <= 0.0 {
            return Err(format!(
                "{what}: values must be positive (got min = {})",
                self.min
            ));
        }
        Ok(())
    }

    pub fn validate(&self, what: &str) -> Result<(), DomainError> {
        self.check(what).map_err(DomainError::InvalidHypothesis)
    }

    pub fn validate_positive(&self, what: &str) -> Result<(), DomainError> {
        self.check_positive(what)
            .map_err(DomainError::InvalidHypothesis)
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// True when `other` lies entirely inside this span.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    /// Fraction of `self` that lies inside `other`, in `[0, 1]`.
    ///
    /// A degenerate span is either fully covered (1.0) or not at all (0.0).
    pub fn coverage_by(&self, other: &Span) -> f64 {
        let width = self.width();
        if width <= 0.0 {
            return if other.contains(self.min) { 1.0 } else { 0.0 };
        }
        let lo = self.min.max(other.min);
        let hi = self.max.min(other.max);
        if hi <= lo {
            0.0
        } else {
            ((hi - lo) / width).clamp(0.0, 1.0)
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.min == self.max {
            write!(f, "{}", format_number(self.min))
        } else {
            write!(f, "{} – {}", format_number(self.min), format_number(self.max))
        }
    }
}

/// Compact human formatting: scientific notation outside `[1e-3, 1e4)`.
pub fn format_number(value: f64) -> String {
    let abs = value.abs();
    if value == 0.0 {
        "0".to_string()
    } else if !(1e-3..1e4).contains(&abs) {
        format!("{value:.1e}")
    } else {
        let s = format!("{value:.4}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

impl Serialize for Span {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.min)?;
        tuple.serialize_element(&self.max)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for Span {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Pair(f64, f64),
            Table { min: f64, max: f64 },
            Single(f64),
        }

        match Repr::deserialize(deserializer) {
            Ok(Repr::Pair(min, max)) | Ok(Repr::Table { min, max }) => Ok(Span { min, max }),
            Ok(Repr::Single(v)) => Ok(Span::point(v)),
            Err(_) => Err(de::Error::custom(
                "expected [min, max], { min, max } or a single number",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_inverted() {
        assert!(Span::new(2.0, 1.0).is_err());
        assert!(Span::new(f64::NAN, 1.0).is_err());
        assert!(Span::new(1.0, 1.0).is_ok());
    }

    #[test]
    fn test_validate_positive() {
        assert!(Span { min: 0.0, max: 1.0 }.validate_positive("q").is_err());
        assert!(Span { min: 1e-3, max: 1.0 }.validate_positive("q").is_ok());
    }

    #[test]
    fn test_coverage_full_partial_none() {
        let instrument = Span { min: 0.002, max: 0.1 };
        assert_eq!(Span { min: 0.01, max: 0.05 }.coverage_by(&instrument), 1.0);

        // Half of [0.0, 0.004] lies above 0.002
        let partial = Span { min: 0.0, max: 0.004 }.coverage_by(&instrument);
        assert!((partial - 0.5).abs() < 1e-12);

        assert_eq!(Span { min: 0.2, max: 0.3 }.coverage_by(&instrument), 0.0);
    }

    #[test]
    fn test_coverage_degenerate() {
        let instrument = Span { min: 1.0, max: 2.0 };
        assert_eq!(Span::point(1.5).coverage_by(&instrument), 1.0);
        assert_eq!(Span::point(3.0).coverage_by(&instrument), 0.0);
    }

    #[test]
    fn test_overlaps_and_contains_span() {
        let a = Span { min: 1.0, max: 5.0 };
        assert!(a.overlaps(&Span { min: 4.0, max: 9.0 }));
        assert!(!a.overlaps(&Span { min: 6.0, max: 9.0 }));
        assert!(a.contains_span(&Span { min: 2.0, max: 3.0 }));
        assert!(!a.contains_span(&Span { min: 2.0, max: 6.0 }));
    }

    #[test]
    fn test_deserialize_forms() {
        let pair: Span = serde_json::from_str("[0.001, 0.02]").unwrap();
        assert_eq!(pair, Span { min: 0.001, max: 0.02 });

        let table: Span = serde_json::from_str(r#"{"min": 10.0, "max": 300.0}"#).unwrap();
        assert_eq!(table, Span { min: 10.0, max: 300.0 });

        let single: Span = serde_json::from_str("7.35").unwrap();
        assert_eq!(single, Span::point(7.35));

        assert!(serde_json::from_str::<Span>(r#""wide""#).is_err());
    }

    #[test]
    fn test_serialize_as_pair() {
        let json = serde_json::to_string(&Span { min: 1.0, max: 2.5 }).unwrap();
        assert_eq!(json, "[1.0,2.5]");
    }

    #[test]
    fn test_display() {
        assert_eq!(Span { min: 0.002, max: 0.1 }.to_string(), "0.002 – 0.1");
        assert_eq!(Span { min: 1e-5, max: 1e5 }.to_string(), "1.0e-5 – 1.0e5");
        assert_eq!(Span::point(300.0).to_string(), "300");
    }
}
