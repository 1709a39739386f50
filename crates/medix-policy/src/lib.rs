//! # medix-policy
//!
//! Deterministic, TOML-driven safety rules for the MEDIX pipeline.
//!
//! ## Overview
//!
//! This crate provides [`RuleSafetyGate`], which implements the
//! [`SafetyGate`](medix_core::traits::SafetyGate) trait, and
//! [`DenylistFilter`], which implements
//! [`MedicineFilter`](medix_core::traits::MedicineFilter). Both are compiled
//! from one [`Rulebook`]: the built-in one embedded in this crate, or a
//! replacement loaded with [`Rulebook::from_file`].
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use medix_policy::{DenylistFilter, RuleSafetyGate, Rulebook};
//!
//! let rulebook = Rulebook::builtin()?;
//! let gate = RuleSafetyGate::from_rulebook(&rulebook)?;
//! let filter = DenylistFilter::from_rulebook(&rulebook)?;
//! // Pass both to `medix_core::Pipeline::new(...)`.
//! ```

pub mod engine;
pub mod filter;
pub mod intake;
pub mod rule;

pub use engine::RuleSafetyGate;
pub use filter::DenylistFilter;
pub use intake::{check_diagnose_intake, check_symptoms, needs_more_detail};
pub use rule::Rulebook;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use medix_contracts::{
        diagnose::Medicine,
        error::MedixError,
        patient::PatientInput,
        safety::SafetyAssessment,
    };
    use medix_core::traits::{MedicineFilter, SafetyGate};

    use crate::intake::{TOO_SHORT_MESSAGE, TOO_VAGUE_MESSAGE};
    use crate::{
        check_diagnose_intake, check_symptoms, needs_more_detail, DenylistFilter, RuleSafetyGate,
        Rulebook,
    };

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn assess(input: &PatientInput) -> SafetyAssessment {
        RuleSafetyGate::builtin().unwrap().assess(input)
    }

    fn medicine(name: &str, formula: &str, usage: &str) -> Medicine {
        let mut med: Medicine =
            serde_json::from_value(serde_json::json!({ "name": name })).unwrap();
        med.formula = formula.to_string();
        med.usage = usage.to_string();
        med
    }

    // ── 1. emergency detection ────────────────────────────────────────────────

    /// Chest pain with breathing trouble and "can't breathe" both fire.
    #[test]
    fn test_chest_pain_and_cannot_breathe() {
        let a = assess(&PatientInput::new("chest pain and can't breathe"));
        assert!(a.emergency_detected);
        assert!(a.warnings.iter().any(|w| w.contains("Severe breathing difficulty")));
        assert!(!a.blocked, "an emergency alone does not set blocked");
    }

    /// Every matching rule contributes a warning, in rulebook order.
    #[test]
    fn test_multiple_emergency_rules_accumulate() {
        let a = assess(&PatientInput::new(
            "Chest pain with shortness of breath, then a seizure",
        ));
        assert!(a.warnings.len() >= 2);
        assert!(a.warnings[0].starts_with("Chest pain with breathing difficulty"));
        assert!(a.warnings.iter().any(|w| w.starts_with("Seizure activity")));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert!(assess(&PatientInput::new("SEVERE BLEEDING from a cut")).emergency_detected);
        assert!(assess(&PatientInput::new("he Passed Out")).emergency_detected);
    }

    #[test]
    fn test_ordinary_symptoms_are_not_emergencies() {
        let a = assess(&PatientInput::new("mild headache and runny nose"));
        assert!(!a.emergency_detected);
        assert!(a.warnings.is_empty());
        assert!(a.safety_notes.is_empty());
    }

    // ── 2. pregnancy and age tiers ────────────────────────────────────────────

    #[test]
    fn test_pregnancy_blocks_with_obgyn_note() {
        let a = assess(&PatientInput::new("back pain").with_pregnancy());
        assert!(a.blocked);
        assert!(a.safety_notes[0].contains("OB/GYN"));
    }

    #[test]
    fn test_infant_is_blocked() {
        for age in ["1", "0"] {
            let a = assess(&PatientInput::new("fever").with_age(age));
            assert!(a.blocked, "age {age} must block");
            assert!(a.safety_notes[0].contains("infant"));
        }
    }

    #[test]
    fn test_child_gets_pediatric_note_without_block() {
        let a = assess(&PatientInput::new("fever").with_age("7"));
        assert!(!a.blocked);
        assert_eq!(a.safety_notes.len(), 1);
        assert!(a.safety_notes[0].contains("pediatric-appropriate"));
    }

    #[test]
    fn test_age_boundaries() {
        assert!(assess(&PatientInput::new("fever").with_age("2")).safety_notes[0].contains("child"));
        assert!(assess(&PatientInput::new("fever").with_age("12")).safety_notes.is_empty());
        assert!(assess(&PatientInput::new("fever").with_age("65")).safety_notes.is_empty());
        assert!(assess(&PatientInput::new("fever").with_age("66")).safety_notes[0].contains("elderly"));
    }

    #[test]
    fn test_unknown_age_applies_no_tier() {
        for age in ["adult", "-3", ""] {
            let a = assess(&PatientInput::new("fever").with_age(age));
            assert!(a.safety_notes.is_empty(), "age {age:?} should be unknown");
        }
    }

    /// Pregnancy note comes before the age note.
    #[test]
    fn test_notes_follow_evaluation_order() {
        let a = assess(&PatientInput::new("nausea").with_age("70").with_pregnancy());
        assert_eq!(a.safety_notes.len(), 2);
        assert!(a.safety_notes[0].contains("pregnant"));
        assert!(a.safety_notes[1].contains("elderly"));
    }

    // ── 3. denylist ───────────────────────────────────────────────────────────

    #[test]
    fn test_denylist_drops_antibiotic_keeps_topical_steroid() {
        let filter = DenylistFilter::builtin().unwrap();
        let kept = filter.filter(vec![
            medicine("Amoxicillin", "C16H19N3O5S", "broad-spectrum antibiotic"),
            medicine("Hydrocortisone", "C21H30O5", "topical steroid cream for itching"),
            medicine("Paracetamol", "C8H9NO2", "pain and fever"),
        ]);
        let names: Vec<&str> = kept.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Hydrocortisone", "Paracetamol"]);
    }

    #[test]
    fn test_denylist_drops_opioids_and_systemic_steroids() {
        let filter = DenylistFilter::builtin().unwrap();
        let kept = filter.filter(vec![
            medicine("Codeine linctus", "C18H21NO3", "cough"),
            medicine("Oxycodone", "C18H21NO4", "severe pain"),
            medicine("Prednisolone", "C21H28O5", "oral steroid for inflammation"),
        ]);
        assert!(kept.is_empty());
    }

    /// The topical exemption holds whichever field names the form.
    #[test]
    fn test_topical_steroid_kept_when_form_is_in_the_name() {
        let filter = DenylistFilter::builtin().unwrap();
        let kept = filter.filter(vec![
            medicine("Hydrocortisone Cream 1%", "C21H30O5", "Topical corticosteroid for itching and eczema"),
            medicine("Clobetasone ointment", "C22H26ClFO4", "corticosteroid for eczema flare"),
        ]);
        assert_eq!(kept.len(), 2);
    }

    /// Named agents are caught without their class word.
    #[test]
    fn test_denylist_drops_named_agents() {
        let filter = DenylistFilter::builtin().unwrap();
        let cases = [
            ("Amoxicillin", "chest infection", "antibiotic"),
            ("Doxycycline", "acne", "antibiotic"),
            ("Diazepam", "anxiety", "benzodiazepine"),
            ("Dexamethasone", "inflammation", "systemic-steroid"),
        ];
        for (name, usage, rule_id) in cases {
            assert_eq!(filter.denied_by(&medicine(name, "", usage)), Some(rule_id), "{name}");
        }
    }

    #[test]
    fn test_survivors_are_normalized() {
        let filter = DenylistFilter::builtin().unwrap();
        let mut blank = medicine("Ibuprofen", "C13H18O2", "pain");
        blank.warning = "  ".to_string();
        let mut kept_warning = medicine("Cetirizine", "C21H25ClN2O3", "allergy");
        kept_warning.warning = "May cause drowsiness".to_string();

        let out = filter.filter(vec![blank, kept_warning]);
        assert!(out[0].warning.starts_with("Consult a healthcare professional"));
        assert_eq!(out[1].warning, "May cause drowsiness");
        assert!(out.iter().all(|m| m.kind == "OTC Guidance"));
    }

    // ── 4. rulebook loading ───────────────────────────────────────────────────

    #[test]
    fn test_custom_rulebook() {
        let toml = r#"
            [[emergency]]
            id = "fainting"
            pattern = 'faint'
            reason = "Fainting"

            [[age_tiers]]
            id = "senior"
            above_years = 80
            note = "Senior patient"
        "#;
        let gate = RuleSafetyGate::from_rulebook(&Rulebook::from_toml_str(toml).unwrap()).unwrap();

        let a = gate.assess(&PatientInput::new("felt FAINT").with_age("81").with_pregnancy());
        assert_eq!(a.warnings, vec!["Fainting".to_string()]);
        assert!(a.blocked, "pregnancy blocks by default");
        assert_eq!(a.safety_notes.last().map(String::as_str), Some("Senior patient"));
    }

    /// Malformed TOML must produce a `MedixError::ConfigError`.
    #[test]
    fn test_toml_parse_error() {
        match Rulebook::from_toml_str("this is not valid toml ][[[") {
            Err(MedixError::ConfigError { reason }) => {
                assert!(reason.contains("failed to parse rulebook TOML"), "got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_pattern_names_the_rule() {
        let toml = r#"
            [[denylist]]
            id = "broken"
            pattern = '(unclosed'
            reason = "x"
        "#;
        match DenylistFilter::from_rulebook(&Rulebook::from_toml_str(toml).unwrap()) {
            Err(MedixError::ConfigError { reason }) => assert!(reason.contains("broken")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    // ── 5. intake ─────────────────────────────────────────────────────────────

    #[test]
    fn test_check_symptoms_rejects_short_text() {
        assert!(check_symptoms("  ").is_err());
        assert!(check_symptoms("ok").is_err());
        assert!(check_symptoms("flu").is_ok());
    }

    #[test]
    fn test_needs_more_detail() {
        assert_eq!(needs_more_detail("headache"), Some(TOO_SHORT_MESSAGE));
        assert_eq!(needs_more_detail("I feel sick"), Some(TOO_VAGUE_MESSAGE));
        assert_eq!(needs_more_detail("headache with fever for 2 days"), None);
    }

    /// Terse emergency words reach the gate instead of a request for detail.
    #[test]
    fn test_diagnose_intake_lets_short_emergencies_through() {
        let gate = RuleSafetyGate::builtin().unwrap();
        for symptoms in ["seizure", "overdose", "stroke"] {
            assert!(check_diagnose_intake(&gate, &PatientInput::new(symptoms)).is_ok(), "{symptoms}");
        }
    }

    #[test]
    fn test_diagnose_intake_rejects_thin_descriptions() {
        let gate = RuleSafetyGate::builtin().unwrap();
        match check_diagnose_intake(&gate, &PatientInput::new("cough")) {
            Err(MedixError::InvalidInput { reason }) => assert_eq!(reason, TOO_SHORT_MESSAGE),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
        match check_diagnose_intake(&gate, &PatientInput::new("I feel sick")) {
            Err(MedixError::InvalidInput { reason }) => assert_eq!(reason, TOO_VAGUE_MESSAGE),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
        assert!(check_diagnose_intake(&gate, &PatientInput::new("x")).is_err());
        assert!(check_diagnose_intake(&gate, &PatientInput::new("runny nose for two days")).is_ok());
    }
}
