//! Rule-based feasibility evaluation.
//!
//! Pure and deterministic: one [`Finding`] per [`CheckKind`], in declaration
//! order, for every hypothesis/instrument pair.

use super::report::FeasibilityReport;
use super::rule::{CheckKind, FeasibilityThresholds, Finding, Verdict};
use crate::hypothesis::{Hypothesis, Span, format_number};
use crate::instrument::InstrumentProfile;

/// Compares a [`Hypothesis`] with an [`InstrumentProfile`].
#[derive(Debug, Clone, Default)]
pub struct FeasibilityEvaluator {
    thresholds: FeasibilityThresholds,
}

impl FeasibilityEvaluator {
    pub fn new(thresholds: FeasibilityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &FeasibilityThresholds {
        &self.thresholds
    }

    pub fn evaluate(&self, hypothesis: &Hypothesis, profile: &InstrumentProfile) -> FeasibilityReport {
        let (geometry, q_range) = self.check_geometry_and_q(hypothesis, profile);
        let findings = vec![
            self.check_energy(hypothesis, profile),
            geometry,
            q_range,
            self.check_fastest_timescale(hypothesis, profile),
            self.check_slowest_timescale(hypothesis, profile),
            self.check_temperature(hypothesis, profile),
            self.check_environment(hypothesis, profile),
            self.check_radiation_dose(hypothesis),
        ];
        debug_assert!(findings.iter().map(|f| f.check).eq(CheckKind::ALL));

        FeasibilityReport::new(&hypothesis.id, &profile.name, findings)
    }

    fn check_energy(&self, hypothesis: &Hypothesis, profile: &InstrumentProfile) -> Finding {
        let Some(energy) = hypothesis.energy_kev else {
            return Finding::new(
                CheckKind::Energy,
                Verdict::NotApplicable,
                "no photon energy requested",
            );
        };
        if profile.energy_kev.contains(energy) {
            Finding::new(
                CheckKind::Energy,
                Verdict::Pass,
                format!(
                    "{} keV is within the {} keV range",
                    format_number(energy),
                    profile.energy_kev
                ),
            )
        } else {
            Finding::new(
                CheckKind::Energy,
                Verdict::Fail,
                format!(
                    "{} keV is outside the {} keV range",
                    format_number(energy),
                    profile.energy_kev
                ),
            )
        }
    }

    fn check_geometry_and_q(
        &self,
        hypothesis: &Hypothesis,
        profile: &InstrumentProfile,
    ) -> (Finding, Finding) {
        let Some(capability) = profile.geometry(hypothesis.geometry) else {
            let offered: Vec<String> = profile.geometries.iter().map(|c| c.geometry.to_string()).collect();
            return (
                Finding::new(
                    CheckKind::Geometry,
                    Verdict::Fail,
                    format!(
                        "{} geometry is not offered (available: {})",
                        hypothesis.geometry,
                        offered.join(", ")
                    ),
                ),
                Finding::new(
                    CheckKind::QRange,
                    Verdict::NotApplicable,
                    "not checked because the geometry is unavailable",
                ),
            );
        };

        let geometry = Finding::new(
            CheckKind::Geometry,
            Verdict::Pass,
            format!(
                "{} ({}) is supported",
                hypothesis.geometry,
                hypothesis.geometry.description()
            ),
        );

        let coverage = hypothesis.q_range.coverage_by(&capability.q_range);
        let detail = format!(
            "requested q = {} 1/A, {} covers {} 1/A ({:.0}% coverage)",
            hypothesis.q_range,
            hypothesis.geometry,
            capability.q_range,
            coverage * 100.0
        );
        let verdict = if capability.q_range.contains_span(&hypothesis.q_range) {
            Verdict::Pass
        } else if coverage >= self.thresholds.min_q_coverage {
            Verdict::Marginal
        } else {
            Verdict::Fail
        };
        (geometry, Finding::new(CheckKind::QRange, verdict, detail))
    }

    fn check_fastest_timescale(&self, hypothesis: &Hypothesis, profile: &InstrumentProfile) -> Finding {
        let Some(detector) = profile.fastest_detector() else {
            return Finding::new(
                CheckKind::FastestTimescale,
                Verdict::Fail,
                "the instrument declares no detector",
            );
        };
        let frame = detector.min_frame_time_s;
        let t_min = hypothesis.timescale.min;
        let needed = self.thresholds.frames_per_decay * frame;

        if t_min >= needed {
            Finding::new(
                CheckKind::FastestTimescale,
                Verdict::Pass,
                format!(
                    "{} s is resolved with {} s frames on {}",
                    format_number(t_min),
                    format_number(frame),
                    detector.name
                ),
            )
        } else if t_min >= frame {
            Finding::new(
                CheckKind::FastestTimescale,
                Verdict::Marginal,
                format!(
                    "{} s spans fewer than {} frames of {} s on {}; the decay will be undersampled",
                    format_number(t_min),
                    format_number(self.thresholds.frames_per_decay),
                    format_number(frame),
                    detector.name
                ),
            )
        } else {
            Finding::new(
                CheckKind::FastestTimescale,
                Verdict::Fail,
                format!(
                    "{} s is faster than the shortest frame time ({} s on {})",
                    format_number(t_min),
                    format_number(frame),
                    detector.name
                ),
            )
        }
    }

    fn check_slowest_timescale(&self, hypothesis: &Hypothesis, profile: &InstrumentProfile) -> Finding {
        let t_max = hypothesis.timescale.max;
        let limit = profile.max_series_duration_s;

        let (mut verdict, mut message) = if t_max <= limit {
            (
                Verdict::Pass,
                format!(
                    "{} s fits in one {} s series",
                    format_number(t_max),
                    format_number(limit)
                ),
            )
        } else if t_max <= 2.0 * limit {
            (
                Verdict::Marginal,
                format!(
                    "{} s exceeds the {} s series limit; needs stitched series or two-time analysis",
                    format_number(t_max),
                    format_number(limit)
                ),
            )
        } else {
            (
                Verdict::Fail,
                format!(
                    "{} s is more than twice the {} s series limit",
                    format_number(t_max),
                    format_number(limit)
                ),
            )
        };

        if verdict != Verdict::Fail
            && let Some(detector) = profile.fastest_detector()
        {
            let period = detector
                .min_frame_time_s
                .max(hypothesis.timescale.min / self.thresholds.frames_per_decay);
            let frames = (t_max / period).ceil();
            if frames > detector.max_frames as f64 {
                verdict = verdict.max(Verdict::Marginal);
                message.push_str(&format!(
                    "; at {} s frames the series needs {} frames but {} buffers {}, so lower the frame rate for the slow end",
                    format_number(period),
                    format_number(frames),
                    detector.name,
                    detector.max_frames
                ));
            }
        }

        Finding::new(CheckKind::SlowestTimescale, verdict, message)
    }

    fn check_temperature(&self, hypothesis: &Hypothesis, profile: &InstrumentProfile) -> Finding {
        let Some(range) = hypothesis.temperature_k else {
            return Finding::new(
                CheckKind::Temperature,
                Verdict::NotApplicable,
                "no temperature range requested",
            );
        };

        if let Some(name) = hypothesis.environment.as_deref() {
            return match profile.find_environment(name) {
                Some(env) if env.temperature_k.contains_span(&range) => Finding::new(
                    CheckKind::Temperature,
                    Verdict::Pass,
                    format!("{} K is within {} ({} K)", range, env.name, env.temperature_k),
                ),
                Some(env) => Finding::new(
                    CheckKind::Temperature,
                    Verdict::Fail,
                    format!("{} K is outside {} ({} K)", range, env.name, env.temperature_k),
                ),
                None => Finding::new(
                    CheckKind::Temperature,
                    Verdict::Fail,
                    format!("{range} K cannot be checked: environment '{name}' is not available"),
                ),
            };
        }

        match covering_environment(profile, &range) {
            Some(env_name) => Finding::new(
                CheckKind::Temperature,
                Verdict::Pass,
                format!("{range} K is reachable with {env_name}"),
            ),
            None => Finding::new(
                CheckKind::Temperature,
                Verdict::Fail,
                format!("no sample environment covers {range} K"),
            ),
        }
    }

    fn check_environment(&self, hypothesis: &Hypothesis, profile: &InstrumentProfile) -> Finding {
        let Some(name) = hypothesis.environment.as_deref() else {
            return Finding::new(
                CheckKind::Environment,
                Verdict::NotApplicable,
                "no sample environment requested",
            );
        };
        match profile.find_environment(name) {
            Some(env) => Finding::new(
                CheckKind::Environment,
                Verdict::Pass,
                format!("'{name}' is available as {}", env.name),
            ),
            None => {
                let available: Vec<&str> = profile.environments.iter().map(|e| e.name.as_str()).collect();
                let available = if available.is_empty() {
                    "none declared".to_string()
                } else {
                    available.join(", ")
                };
                Finding::new(
                    CheckKind::Environment,
                    Verdict::Fail,
                    format!("'{name}' is not available (available: {available})"),
                )
            }
        }
    }

    fn check_radiation_dose(&self, hypothesis: &Hypothesis) -> Finding {
        let class = &hypothesis.sample.class;
        if !class.is_radiation_sensitive() {
            return Finding::new(
                CheckKind::RadiationDose,
                Verdict::NotApplicable,
                format!("{class} samples are not flagged as radiation sensitive"),
            );
        }
        let t_max = hypothesis.timescale.max;
        let limit = self.thresholds.dose_warning_duration_s;
        if t_max > limit {
            Finding::new(
                CheckKind::RadiationDose,
                Verdict::Marginal,
                format!(
                    "{class} sample exposed for {} s (> {} s); attenuate, defocus or move the spot between series",
                    format_number(t_max),
                    format_number(limit)
                ),
            )
        } else {
            Finding::new(
                CheckKind::RadiationDose,
                Verdict::Pass,
                format!(
                    "{} s exposure stays under the {} s dose warning",
                    format_number(t_max),
                    format_number(limit)
                ),
            )
        }
    }
}

fn covering_environment<'a>(profile: &'a InstrumentProfile, range: &Span) -> Option<&'a str> {
    profile
        .environments
        .iter()
        .find(|env| env.temperature_k.contains_span(range))
        .map(|env| env.name.as_str())
}
