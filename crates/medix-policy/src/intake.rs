//! Caller-facing input checks.
//!
//! These run before a request reaches the pipeline. A rejected intake is an
//! input error, not a pipeline outcome.

use std::sync::LazyLock;

use regex::Regex;

use medix_contracts::{
    error::{MedixError, MedixResult},
    patient::PatientInput,
};
use medix_core::traits::SafetyGate;

/// Shortest symptom text the triage route accepts.
pub const MIN_SYMPTOM_CHARS: usize = 3;

/// Shortest symptom text the medicine route considers specific enough.
pub const MIN_DETAILED_SYMPTOM_CHARS: usize = 10;

pub const TOO_SHORT_MESSAGE: &str =
    "Please provide more detail about your symptoms for accurate guidance.";

pub const TOO_VAGUE_MESSAGE: &str = "Your description is too general. Please describe specific symptoms (e.g., \"headache with fever for 2 days\").";

static VAGUE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(?:i\s*)?(?:feel|am)\s*(?:bad|sick|ill|unwell)$",
        r"(?i)^(?:help|medicine|drug)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Reject missing or near-empty symptom text.
pub fn check_symptoms(symptoms: &str) -> MedixResult<()> {
    if symptoms.trim().chars().count() < MIN_SYMPTOM_CHARS {
        return Err(MedixError::InvalidInput {
            reason: "Please describe your symptoms".to_string(),
        });
    }
    Ok(())
}

/// Explain why `symptoms` is too thin for medicine suggestions, if it is.
pub fn needs_more_detail(symptoms: &str) -> Option<&'static str> {
    let trimmed = symptoms.trim();
    if trimmed.chars().count() < MIN_DETAILED_SYMPTOM_CHARS {
        return Some(TOO_SHORT_MESSAGE);
    }
    if VAGUE_PATTERNS.iter().any(|p| p.is_match(trimmed)) {
        return Some(TOO_VAGUE_MESSAGE);
    }
    None
}

/// Intake for the medicine route.
///
/// Short or vague descriptions are sent back for more detail unless `gate`
/// sees an emergency in them. Those pass so the pipeline's emergency guard
/// answers.
pub fn check_diagnose_intake(gate: &dyn SafetyGate, input: &PatientInput) -> MedixResult<()> {
    check_symptoms(&input.symptoms)?;
    if gate.assess(input).emergency_detected {
        return Ok(());
    }
    match needs_more_detail(&input.symptoms) {
        Some(message) => Err(MedixError::InvalidInput { reason: message.to_string() }),
        None => Ok(()),
    }
}
