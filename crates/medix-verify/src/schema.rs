//! JSON Schema documents for the two result contracts.
//!
//! These are the structural half of validation. Field defaults are not
//! described here; they live on the serde types in medix-contracts.

use serde_json::{json, Value};

use medix_contracts::triage::Urgency;

fn string_array() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

/// Structural schema for a triage answer.
pub fn triage_schema() -> Value {
    json!({
        "type": "object",
        "required": ["urgency", "summary"],
        "properties": {
            "urgency": { "type": "string", "enum": Urgency::ALL },
            "summary": { "type": "string", "pattern": "\\S" },
            "redFlags": string_array(),
            "nextSteps": string_array(),
            "questions": string_array(),
            "citations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "url": { "type": "string" },
                        "quote": { "type": "string" }
                    }
                }
            }
        }
    })
}

/// Structural schema for a medicine suggestion answer.
pub fn diagnose_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "medicines": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": { "type": "string", "pattern": "\\S" },
                        "formula": { "type": "string" },
                        "brands": string_array(),
                        "dosage": { "type": "string" },
                        "usage": { "type": "string" },
                        "type": { "type": "string" },
                        "warning": { "type": "string" }
                    }
                }
            },
            "general_advice": { "type": "string" },
            "see_doctor": { "type": "boolean" },
            "safety_notes": string_array()
        }
    })
}
