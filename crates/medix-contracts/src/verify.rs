//! Output validation types.
//!
//! Model output is checked against one of two fixed contracts. Validation
//! never fails as a Rust error: the verifier always returns a
//! `ValidationOutcome`, and only a `Valid` outcome carries typed data.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{diagnose::DiagnoseResult, triage::TriageResult};

/// Which result contract a model output must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Triage,
    Diagnose,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Triage => f.write_str("triage"),
            SchemaKind::Diagnose => f.write_str("diagnose"),
        }
    }
}

/// A single structural problem found in a model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// JSON pointer to the offending value ("" for the root).
    pub path: String,
    pub message: String,
}

/// Typed data that passed validation, defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validated {
    Triage(TriageResult),
    Diagnose(DiagnoseResult),
}

/// Result of validating one extracted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid(Validated),
    Invalid(Vec<ValidationFailure>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }
}
