//! Urgency evaluation harness.
//!
//! Runs a list of labelled cases through `run_triage` and compares the
//! returned urgency with the expected one. Cases are JSON:
//!
//! ```json
//! [{ "id": "S01", "description": "...", "input": { "symptoms": "..." }, "expectedUrgency": "SELF_CARE" }]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use medix_contracts::{
    error::{MedixError, MedixResult},
    patient::PatientInput,
    provider::ProviderUsed,
    triage::Urgency,
};
use medix_core::Pipeline;
use medix_policy::check_symptoms;

const BUILTIN_CASES: &str = include_str!("../eval/cases.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalCase {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub input: PatientInput,
    pub expected_urgency: Urgency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseResult {
    pub id: String,
    pub description: String,
    pub expected: Urgency,
    /// Absent when the case was rejected at intake.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Urgency>,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_used: Option<ProviderUsed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_flags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Whole percent, rounded.
    pub pass_rate: u32,
    pub results: Vec<CaseResult>,
}

/// Parse a JSON case list.
pub fn parse_cases(json: &str) -> MedixResult<Vec<EvalCase>> {
    serde_json::from_str(json).map_err(|e| MedixError::ConfigError {
        reason: format!("failed to parse evaluation cases: {}", e),
    })
}

pub fn load_cases(path: &Path) -> MedixResult<Vec<EvalCase>> {
    let contents = std::fs::read_to_string(path).map_err(|e| MedixError::ConfigError {
        reason: format!("failed to read evaluation cases '{}': {}", path.display(), e),
    })?;
    parse_cases(&contents)
}

/// The cases shipped with this crate.
pub fn builtin_cases() -> MedixResult<Vec<EvalCase>> {
    parse_cases(BUILTIN_CASES)
}

/// Run every case in order. Intake rejections count as failures.
pub async fn run_eval(pipeline: &Pipeline, cases: &[EvalCase]) -> EvalReport {
    let mut results = Vec::with_capacity(cases.len());

    for case in cases {
        let result = match check_symptoms(&case.input.symptoms) {
            Err(e) => CaseResult {
                id: case.id.clone(),
                description: case.description.clone(),
                expected: case.expected_urgency,
                actual: None,
                passed: false,
                provider_used: None,
                red_flags: None,
                error: Some(e.to_string()),
            },
            Ok(()) => {
                let report = pipeline.run_triage(&case.input).await;
                let passed = report.result.urgency == case.expected_urgency;
                CaseResult {
                    id: case.id.clone(),
                    description: case.description.clone(),
                    expected: case.expected_urgency,
                    actual: Some(report.result.urgency),
                    passed,
                    provider_used: report.provider_used,
                    red_flags: (!passed).then_some(report.result.red_flags),
                    error: None,
                }
            }
        };

        if result.passed {
            info!(case = %result.id, expected = %result.expected, "eval case passed");
        } else {
            warn!(case = %result.id, expected = %result.expected, actual = ?result.actual, "eval case failed");
        }
        results.push(result);
    }

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let pass_rate = if total == 0 {
        0
    } else {
        ((passed as f64 / total as f64) * 100.0).round() as u32
    };

    EvalReport {
        total,
        passed,
        failed: total - passed,
        pass_rate,
        results,
    }
}
