//! Patient intake types.
//!
//! `PatientInput` is the only thing a caller hands to the pipeline. It is
//! never mutated after it is received; every stage reads it by reference.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Self-reported gender of the patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        };
        f.write_str(label)
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender '{other}' (expected male, female or other)")),
        }
    }
}

/// Free-text patient intake.
///
/// `age` is kept as the caller supplied it. Intake forms send both numbers and
/// strings ("30", "30 years"); `age_years()` does the lenient parse and the
/// safety gate treats anything unparseable as an unknown age.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    pub symptoms: String,
    #[serde(default, deserialize_with = "deserialize_age", skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, alias = "currentMeds", skip_serializing_if = "Option::is_none")]
    pub current_medications: Option<String>,
    #[serde(default)]
    pub pregnant: bool,
}

impl PatientInput {
    /// Intake with only a symptom description.
    pub fn new(symptoms: impl Into<String>) -> Self {
        Self {
            symptoms: symptoms.into(),
            ..Self::default()
        }
    }

    /// Set the age (builder style).
    pub fn with_age(mut self, age: impl Into<String>) -> Self {
        self.age = Some(age.into());
        self
    }

    /// Mark the patient as pregnant (builder style).
    pub fn with_pregnancy(mut self) -> Self {
        self.pregnant = true;
        self
    }

    /// The age in whole years, if the supplied text starts with a number.
    ///
    /// Leading whitespace is skipped and parsing stops at the first non-digit,
    /// so "30 years" yields 30. Negative or non-numeric text yields `None`.
    pub fn age_years(&self) -> Option<u32> {
        let raw = self.age.as_deref()?.trim_start();
        let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok()
    }
}

/// Accept the age as a JSON number or string.
fn deserialize_age<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}
