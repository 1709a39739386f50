//! Deterministic safety assessment produced before any model call.

use serde::{Deserialize, Serialize};

/// The safety gate's verdict for one request.
///
/// Produced exactly once per request and attached to the final result on
/// every code path. `warnings` holds emergency reasons; `safety_notes` holds
/// contraindication notes (pregnancy, age tiers). Both keep rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAssessment {
    /// Medicine suggestions must not be produced for this patient.
    pub blocked: bool,
    /// At least one emergency pattern matched the symptom text.
    pub emergency_detected: bool,
    pub warnings: Vec<String>,
    pub safety_notes: Vec<String>,
}
