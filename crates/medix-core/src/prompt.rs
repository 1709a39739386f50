//! Prompt assets and deterministic prompt composition.
//!
//! System prompts are static text. User content is derived from the patient
//! input one line per present field, in a fixed order, with no placeholders
//! for absent fields.

use serde_json::Value;

use medix_contracts::{
    patient::PatientInput,
    provider::ReferenceDoc,
    verify::ValidationFailure,
};

pub const TRIAGE_SYSTEM_PROMPT: &str = r#"You are the Medix Triage Engine, a medical triage assistant.
Your job is to classify the urgency of a patient's symptoms and provide structured guidance.

You MUST return ONLY valid JSON. No markdown, no code blocks, no extra text.

JSON Schema:
{
  "urgency": "EMERGENCY" | "URGENT" | "ROUTINE" | "SELF_CARE",
  "redFlags": ["list of dangerous symptoms detected"],
  "summary": "Brief clinical summary of the situation",
  "nextSteps": ["actionable steps the patient should take"],
  "questions": ["follow-up questions to ask for better assessment"],
  "citations": [{"title": "source name", "url": "source URL", "quote": "relevant excerpt"}]
}

Classification Rules:
1. EMERGENCY: Chest pain with shortness of breath, severe bleeding, stroke symptoms (FAST), anaphylaxis, loss of consciousness, seizures, severe burns, poisoning
2. URGENT: High fever (>103°F/39.4°C) persisting >48h, moderate dehydration, persistent vomiting, severe pain, head injury with confusion
3. ROUTINE: Mild-moderate symptoms, chronic conditions flare-up, infections needing antibiotics, injuries needing medical evaluation
4. SELF_CARE: Common cold, mild headache, minor cuts, mild allergies, muscle soreness

Safety Rules:
- If pregnant: escalate urgency by one level and recommend OB/GYN consultation
- If child (<12): escalate urgency by one level
- If elderly (>65): note age-related risks
- Always include at least one citation from WHO, NHS, or MedlinePlus
- When in doubt, classify higher urgency (safety first)
- NEVER diagnose definitively — use phrases like "may indicate", "could suggest"

Your response must be a single JSON object matching the schema above."#;

pub const DIAGNOSE_SYSTEM_PROMPT: &str = r#"You are Medix, a safe medical assistant.
Your goal is to suggest OTC (Over-The-Counter) medicines and general health advice.
NEVER suggest prescription-only drugs, antibiotics, or controlled substances.
ALWAYS advise the user to consult a doctor.

CRITICAL INSTRUCTIONS:
1. Provide at least 4 to 5 distinct medicine options.
2. STRICTLY respect the patient's age.
   - If patient is a CHILD (<12 years): Suggest ONLY pediatric formulations (Syrups, Drops, Chewable). NO tablets/capsules unless specified for kids.
   - Dosage MUST be age-appropriate (e.g., "5ml every 6 hours" for syrup).
   - Do NOT suggest adult dosages for children.

You MUST return ONLY valid JSON matching this schema:
{
  "medicines": [
    {
      "name": "Generic Name",
      "formula": "Chemical Structure (e.g., C13H18O2) - NOT the drug name",
      "brands": ["Brand 1", "Brand 2"],
      "dosage": "General adult dosage (e.g., 500mg every 6 hours)",
      "usage": "Indication",
      "type": "OTC",
      "warning": "Key interactions/warnings"
    }
  ],
  "general_advice": "Non-pharmacological advice (diet, rest, etc.)",
  "see_doctor": true,
  "safety_notes": ["Specific safety warnings based on patient data"]
}"#;

/// System prompt for the repair call when the caller has none to reuse.
pub const REPAIR_SYSTEM_PROMPT: &str =
    "You are a JSON repair assistant. Output only valid JSON.";

const DIAGNOSE_TASK: &str = "Task: Recommend safe OTC medicines. If symptoms are severe, suggest only \"See Doctor\".";

/// Invalid output embedded in a repair prompt is clipped to this many chars.
const MAX_REPAIR_SUBJECT_CHARS: usize = 6_000;

/// Render the patient summary sent as user content.
///
/// Order: symptoms, age, gender, duration, allergies, current medications,
/// pregnancy flag. Absent or blank fields produce no line.
pub fn build_user_content(input: &PatientInput) -> String {
    let mut lines = vec![format!("Symptoms: {}", input.symptoms.trim())];

    let present = |field: &Option<String>| {
        field
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(age) = present(&input.age) {
        lines.push(format!("Age: {age}"));
    }
    if let Some(gender) = input.gender {
        lines.push(format!("Gender: {gender}"));
    }
    if let Some(duration) = present(&input.duration) {
        lines.push(format!("Duration: {duration}"));
    }
    if let Some(allergies) = present(&input.allergies) {
        lines.push(format!("Known Allergies: {allergies}"));
    }
    if let Some(meds) = present(&input.current_medications) {
        lines.push(format!("Current Medications: {meds}"));
    }
    if input.pregnant {
        lines.push("Patient is pregnant".to_string());
    }

    lines.join("\n")
}

/// User content for the medicine suggestion route.
pub fn build_diagnose_content(input: &PatientInput) -> String {
    format!("{}\n\n{}", build_user_content(input), DIAGNOSE_TASK)
}

/// Format retrieved references as a grounding block for the prompt.
///
/// Returns an empty string when there is nothing to cite.
pub fn format_reference_context(references: &[ReferenceDoc]) -> String {
    if references.is_empty() {
        return String::new();
    }

    let formatted = references
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!("[Source {}: {}]\n{}\nURL: {}", i + 1, doc.title, doc.excerpt, doc.url)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "\n\n--- REFERENCE MEDICAL LITERATURE ---\n\
         Use the following sources to ground your response. Cite them in your citations array.\n\n\
         {formatted}\n\
         --- END REFERENCES ---\n"
    )
}

/// Build the single self-correction instruction.
pub fn build_repair_prompt(invalid: &Value, failures: &[ValidationFailure]) -> String {
    let errors = serde_json::to_string(failures).unwrap_or_else(|_| "[]".to_string());
    let subject = match invalid {
        Value::String(raw) => raw.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    let subject: String = subject.chars().take(MAX_REPAIR_SUBJECT_CHARS).collect();

    format!(
        "The following JSON output failed validation. Fix it to match the required schema.\n\n\
         Validation errors: {errors}\n\n\
         Original output:\n{subject}\n\n\
         Return ONLY the corrected JSON object. No explanation, no markdown."
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use medix_contracts::patient::{Gender, PatientInput};
    use medix_contracts::provider::ReferenceDoc;
    use medix_contracts::verify::ValidationFailure;

    use super::*;

    #[test]
    fn test_symptoms_only_produces_single_line() {
        let content = build_user_content(&PatientInput::new("mild headache"));
        assert_eq!(content, "Symptoms: mild headache");
    }

    #[test]
    fn test_fields_render_in_fixed_order() {
        let input = PatientInput {
            symptoms: "cough".to_string(),
            age: Some("34".to_string()),
            gender: Some(Gender::Female),
            duration: Some("3 days".to_string()),
            allergies: Some("penicillin".to_string()),
            current_medications: Some("none".to_string()),
            pregnant: true,
        };

        let lines: Vec<String> = build_user_content(&input).lines().map(str::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "Symptoms: cough",
                "Age: 34",
                "Gender: female",
                "Duration: 3 days",
                "Known Allergies: penicillin",
                "Current Medications: none",
                "Patient is pregnant",
            ]
        );
    }

    #[test]
    fn test_blank_optional_fields_are_omitted() {
        let input = PatientInput {
            duration: Some("   ".to_string()),
            ..PatientInput::new("sore throat").with_age("40")
        };
        let content = build_user_content(&input);
        assert!(!content.contains("Duration"));
        assert!(content.contains("Age: 40"));
    }

    #[test]
    fn test_diagnose_content_appends_task() {
        let content = build_diagnose_content(&PatientInput::new("runny nose"));
        assert!(content.starts_with("Symptoms: runny nose"));
        assert!(content.contains("Recommend safe OTC medicines"));
    }

    #[test]
    fn test_reference_context_empty_without_references() {
        assert_eq!(format_reference_context(&[]), "");
    }

    #[test]
    fn test_reference_context_numbers_sources() {
        let docs = vec![
            ReferenceDoc {
                title: "NHS: Fever in Adults".to_string(),
                url: "https://www.nhs.uk/conditions/fever-in-adults/".to_string(),
                excerpt: "Drink plenty of fluids.".to_string(),
            },
            ReferenceDoc {
                title: "MedlinePlus: Common Cold".to_string(),
                url: "https://medlineplus.gov/commoncold.html".to_string(),
                excerpt: "There is no cure for the common cold.".to_string(),
            },
        ];
        let block = format_reference_context(&docs);
        assert!(block.contains("[Source 1: NHS: Fever in Adults]"));
        assert!(block.contains("[Source 2: MedlinePlus: Common Cold]"));
        assert!(block.contains("END REFERENCES"));
    }

    #[test]
    fn test_repair_prompt_embeds_errors_and_value() {
        let failures = vec![ValidationFailure {
            path: "/urgency".to_string(),
            message: "\"SOON\" is not one of the allowed values".to_string(),
        }];
        let prompt = build_repair_prompt(&json!({ "urgency": "SOON" }), &failures);
        assert!(prompt.contains("/urgency"));
        assert!(prompt.contains("\"SOON\""));
        assert!(prompt.contains("Return ONLY the corrected JSON object"));
    }

    #[test]
    fn test_system_prompts_carry_safety_rules() {
        assert!(TRIAGE_SYSTEM_PROMPT.contains("escalate urgency by one level"));
        assert!(TRIAGE_SYSTEM_PROMPT.contains("NEVER diagnose definitively"));
        assert!(DIAGNOSE_SYSTEM_PROMPT.contains("NEVER suggest prescription-only drugs"));
    }
}
