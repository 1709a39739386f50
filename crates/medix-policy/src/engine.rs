//! Rulebook-driven safety gate.
//!
//! `RuleSafetyGate` compiles a `Rulebook` once and implements the
//! `SafetyGate` trait from medix-core.
//!
//! Evaluation algorithm:
//!
//! 1. Test every emergency rule against the symptom text. Each match sets
//!    `emergency_detected` and appends its reason to `warnings`.
//! 2. If the patient is pregnant, append the pregnancy note (and block).
//! 3. If the age parses, apply the first matching age tier.
//!
//! The gate never fails and never does I/O. Pattern errors surface when the
//! gate is built, not when it runs.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use medix_contracts::{
    error::{MedixError, MedixResult},
    patient::PatientInput,
    safety::SafetyAssessment,
};
use medix_core::traits::SafetyGate;

use crate::rule::{AgeTier, PregnancyRule, Rulebook};

/// A compiled emergency detector.
#[derive(Debug)]
struct Detector {
    id: String,
    regex: Regex,
    reason: String,
}

/// A `SafetyGate` backed by a compiled rulebook.
///
/// ```rust,ignore
/// use medix_policy::{engine::RuleSafetyGate, rule::Rulebook};
///
/// let gate = RuleSafetyGate::from_rulebook(&Rulebook::builtin()?)?;
/// ```
#[derive(Debug)]
pub struct RuleSafetyGate {
    detectors: Vec<Detector>,
    pregnancy: PregnancyRule,
    age_tiers: Vec<AgeTier>,
}

impl RuleSafetyGate {
    /// Compile every emergency pattern in `rulebook`.
    ///
    /// Returns `MedixError::ConfigError` naming the first rule whose pattern
    /// is not a valid regex.
    pub fn from_rulebook(rulebook: &Rulebook) -> MedixResult<Self> {
        let detectors = rulebook
            .emergency
            .iter()
            .map(|rule| {
                Ok(Detector {
                    id: rule.id.clone(),
                    regex: compile(&rule.id, &rule.pattern)?,
                    reason: rule.reason.clone(),
                })
            })
            .collect::<MedixResult<Vec<_>>>()?;

        Ok(Self {
            detectors,
            pregnancy: rulebook.pregnancy.clone(),
            age_tiers: rulebook.age_tiers.clone(),
        })
    }

    /// The gate built from the crate's built-in rulebook.
    pub fn builtin() -> MedixResult<Self> {
        Self::from_rulebook(&Rulebook::builtin()?)
    }
}

impl SafetyGate for RuleSafetyGate {
    fn assess(&self, input: &PatientInput) -> SafetyAssessment {
        let mut assessment = SafetyAssessment::default();

        for detector in &self.detectors {
            if detector.regex.is_match(&input.symptoms) {
                debug!(rule_id = %detector.id, "emergency rule matched");
                assessment.emergency_detected = true;
                assessment.warnings.push(detector.reason.clone());
            }
        }

        if input.pregnant {
            assessment.safety_notes.push(self.pregnancy.note.clone());
            assessment.blocked |= self.pregnancy.blocks;
        }

        if let Some(age) = input.age_years() {
            if let Some(tier) = self.age_tiers.iter().find(|tier| tier.matches(age)) {
                debug!(tier = %tier.id, "age tier applied");
                assessment.safety_notes.push(tier.note.clone());
                assessment.blocked |= tier.blocks;
            }
        }

        debug!(
            emergency = assessment.emergency_detected,
            blocked = assessment.blocked,
            notes = assessment.safety_notes.len(),
            "safety assessment complete"
        );
        assessment
    }
}

/// Compile `pattern` case-insensitively, naming `rule_id` on failure.
pub(crate) fn compile(rule_id: &str, pattern: &str) -> MedixResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| MedixError::ConfigError {
            reason: format!("rule '{}' has an invalid pattern: {}", rule_id, e),
        })
}
