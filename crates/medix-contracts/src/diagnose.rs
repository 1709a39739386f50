//! OTC medicine suggestion contract.

use serde::{Deserialize, Serialize};

use crate::provider::ProviderUsed;

pub const DEFAULT_FORMULA: &str = "N/A";
pub const DEFAULT_DOSAGE: &str = "Consult a doctor";
pub const DEFAULT_MEDICINE_TYPE: &str = "OTC";
pub const DEFAULT_MEDICINE_WARNING: &str = "Consult healthcare professional before use";
pub const DEFAULT_GENERAL_ADVICE: &str = "Please consult a healthcare professional.";

fn default_formula() -> String {
    DEFAULT_FORMULA.to_string()
}

fn default_dosage() -> String {
    DEFAULT_DOSAGE.to_string()
}

fn default_medicine_type() -> String {
    DEFAULT_MEDICINE_TYPE.to_string()
}

fn default_medicine_warning() -> String {
    DEFAULT_MEDICINE_WARNING.to_string()
}

fn default_general_advice() -> String {
    DEFAULT_GENERAL_ADVICE.to_string()
}

fn default_true() -> bool {
    true
}

/// One suggested over-the-counter medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    /// Generic drug name.
    pub name: String,
    /// Chemical formula (e.g. "C13H18O2"), not the drug name.
    #[serde(default = "default_formula")]
    pub formula: String,
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default = "default_dosage")]
    pub dosage: String,
    /// Indication.
    #[serde(default)]
    pub usage: String,
    #[serde(rename = "type", default = "default_medicine_type")]
    pub kind: String,
    #[serde(default = "default_medicine_warning")]
    pub warning: String,
}

/// The schema-valid core of a medicine suggestion answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnoseResult {
    #[serde(default)]
    pub medicines: Vec<Medicine>,
    #[serde(default = "default_general_advice")]
    pub general_advice: String,
    #[serde(default = "default_true")]
    pub see_doctor: bool,
    #[serde(default)]
    pub safety_notes: Vec<String>,
}

impl DiagnoseResult {
    /// An answer with no medicines that sends the patient to a doctor.
    pub fn see_doctor(general_advice: impl Into<String>, safety_notes: Vec<String>) -> Self {
        Self {
            medicines: Vec::new(),
            general_advice: general_advice.into(),
            see_doctor: true,
            safety_notes,
        }
    }
}

/// What `run_diagnose` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseReport {
    #[serde(flatten)]
    pub result: DiagnoseResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_used: Option<ProviderUsed>,
    pub repaired: bool,
    pub latency_ms: u64,
}
