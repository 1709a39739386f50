//! Deterministic safe-default results.
//!
//! These are the answers of last resort. They are hardcoded, schema-valid by
//! construction, and cannot fail.

use medix_contracts::{
    diagnose::DiagnoseResult,
    safety::SafetyAssessment,
    triage::{Citation, TriageResult, Urgency},
};

/// Answer for a request the safety gate flagged as an emergency.
///
/// `red_flags` carries the gate's warnings, so it is non-empty whenever an
/// emergency was detected.
pub fn emergency_triage(assessment: &SafetyAssessment) -> TriageResult {
    TriageResult {
        urgency: Urgency::Emergency,
        red_flags: assessment.warnings.clone(),
        summary: "Emergency symptoms detected. Please seek immediate medical attention or call emergency services."
            .to_string(),
        next_steps: vec![
            "Call your local emergency number immediately".to_string(),
            "Do not drive yourself — have someone take you or wait for an ambulance".to_string(),
            "If available, use any prescribed emergency medication (e.g., EpiPen, nitroglycerin)".to_string(),
        ],
        questions: Vec::new(),
        citations: vec![Citation::new(
            "WHO Emergency Care",
            "https://www.who.int/emergencies",
            "Seek immediate medical attention for life-threatening symptoms.",
        )],
    }
}

/// Answer when no backend could be reached.
pub fn unreachable_triage() -> TriageResult {
    TriageResult {
        urgency: Urgency::Routine,
        red_flags: Vec::new(),
        summary: "Unable to reach AI services. Based on general guidance, please monitor your symptoms."
            .to_string(),
        next_steps: vec![
            "Visit a healthcare provider if symptoms persist beyond 48 hours".to_string(),
            "Stay hydrated and rest".to_string(),
        ],
        questions: vec![
            "How long have you experienced these symptoms?".to_string(),
            "Do you have any chronic conditions?".to_string(),
        ],
        citations: vec![Citation::new(
            "WHO General Health",
            "https://www.who.int",
            "Seek medical advice if symptoms persist.",
        )],
    }
}

/// Answer when a backend replied but its output could not be validated or
/// repaired.
pub fn unvalidated_triage() -> TriageResult {
    TriageResult {
        urgency: Urgency::Routine,
        red_flags: Vec::new(),
        summary: "AI analysis completed but output could not be validated. Please consult a healthcare professional."
            .to_string(),
        next_steps: vec!["Visit a doctor for proper evaluation".to_string()],
        questions: Vec::new(),
        citations: Vec::new(),
    }
}

/// Medicine answer for a patient the gate blocked or flagged as an emergency.
pub fn blocked_diagnose(assessment: &SafetyAssessment) -> DiagnoseResult {
    let advice = if assessment.emergency_detected {
        "Emergency symptoms detected. Do not self-medicate — seek immediate medical attention or call emergency services."
    } else {
        "Based on your risk factors (pregnancy, age, or specific symptoms), we cannot provide automated medicine suggestions. Please consult a specialist."
    };
    DiagnoseResult::see_doctor(advice, merged_notes(&[], assessment))
}

/// Medicine answer when no validated model output is available.
pub fn fallback_diagnose(assessment: &SafetyAssessment) -> DiagnoseResult {
    DiagnoseResult::see_doctor(
        "We could not generate medicine guidance right now. Please consult a healthcare professional or pharmacist.",
        merged_notes(&[], assessment),
    )
}

/// Combine model-supplied notes with the gate's notes.
///
/// Model notes come first, then the gate's safety notes, then emergency
/// warnings. Exact duplicates are dropped.
pub fn merged_notes(model_notes: &[String], assessment: &SafetyAssessment) -> Vec<String> {
    let mut notes: Vec<String> = Vec::new();
    let gate = assessment.safety_notes.iter().chain(assessment.warnings.iter());
    for note in model_notes.iter().chain(gate) {
        if !notes.contains(note) {
            notes.push(note.clone());
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use medix_contracts::safety::SafetyAssessment;
    use medix_contracts::triage::Urgency;

    use super::*;

    fn pregnant_assessment() -> SafetyAssessment {
        SafetyAssessment {
            blocked: true,
            emergency_detected: false,
            warnings: vec![],
            safety_notes: vec!["Patient is pregnant".to_string()],
        }
    }

    #[test]
    fn test_emergency_triage_copies_warnings() {
        let assessment = SafetyAssessment {
            emergency_detected: true,
            warnings: vec!["Seizure activity".to_string()],
            ..SafetyAssessment::default()
        };
        let result = emergency_triage(&assessment);
        assert_eq!(result.urgency, Urgency::Emergency);
        assert_eq!(result.red_flags, vec!["Seizure activity".to_string()]);
        assert!(!result.summary.is_empty());
    }

    #[test]
    fn test_fallback_triage_is_routine_with_next_steps() {
        for result in [unreachable_triage(), unvalidated_triage()] {
            assert_eq!(result.urgency, Urgency::Routine);
            assert!(!result.next_steps.is_empty());
            assert!(!result.summary.is_empty());
        }
    }

    #[test]
    fn test_blocked_diagnose_has_no_medicines() {
        let result = blocked_diagnose(&pregnant_assessment());
        assert!(result.medicines.is_empty());
        assert!(result.see_doctor);
        assert_eq!(result.safety_notes, vec!["Patient is pregnant".to_string()]);
    }

    #[test]
    fn test_merged_notes_keeps_order_and_drops_duplicates() {
        let model = vec!["Avoid alcohol".to_string(), "Patient is pregnant".to_string()];
        let merged = merged_notes(&model, &pregnant_assessment());
        assert_eq!(merged, vec!["Avoid alcohol".to_string(), "Patient is pregnant".to_string()]);
    }
}
