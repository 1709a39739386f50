//! Schema-based output verifier for the MEDIX pipeline.
//!
//! `SchemaVerifier` implements the `Verifier` trait from `medix-core`.
//! Validation runs in two phases:
//!
//! 1. **Structural**: the extracted value is validated against the JSON
//!    Schema for its kind using the `jsonschema` crate. Every violation is
//!    collected so a repair prompt can list them all at once.
//! 2. **Typed**: a structurally valid value is deserialized into the
//!    contract type, which is where absent optional fields get their
//!    defaults.
//!
//! `null` is a wrong type everywhere; it is never read as "absent".

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use medix_contracts::{
    error::MedixError,
    verify::{SchemaKind, Validated, ValidationFailure, ValidationOutcome},
};
use medix_core::traits::Verifier;

use crate::extract::extract_json;
use crate::schema::{diagnose_schema, triage_schema};

/// The MEDIX output verifier.
pub struct SchemaVerifier {
    triage: Value,
    diagnose: Value,
}

impl SchemaVerifier {
    /// A verifier for the built-in triage and diagnose contracts.
    pub fn new() -> Self {
        Self::with_schemas(triage_schema(), diagnose_schema())
    }

    /// A verifier using caller-supplied schema documents.
    pub fn with_schemas(triage: Value, diagnose: Value) -> Self {
        Self { triage, diagnose }
    }

    fn schema(&self, kind: SchemaKind) -> &Value {
        match kind {
            SchemaKind::Triage => &self.triage,
            SchemaKind::Diagnose => &self.diagnose,
        }
    }

    /// Run the structural phase and return every violation found.
    fn structural_failures(&self, value: &Value, kind: SchemaKind) -> Vec<ValidationFailure> {
        match jsonschema::validator_for(self.schema(kind)) {
            Ok(validator) => validator
                .iter_errors(value)
                .map(|error| {
                    let failure = ValidationFailure {
                        path: error.instance_path.to_string(),
                        message: error.to_string(),
                    };
                    debug!(schema = %kind, path = %failure.path, message = %failure.message, "structural validation failure");
                    failure
                })
                .collect(),
            Err(e) => {
                // A broken schema document fails every value.
                let error = MedixError::SchemaValidation {
                    reason: format!("invalid JSON Schema document for {kind}: {e}"),
                };
                warn!(schema = %kind, error = %error, "schema compilation failure");
                vec![ValidationFailure { path: String::new(), message: error.to_string() }]
            }
        }
    }
}

impl Default for SchemaVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserialize `value` into `T`, reporting a serde error as one failure.
fn typed<T: DeserializeOwned>(value: &Value) -> Result<T, Vec<ValidationFailure>> {
    serde_json::from_value(value.clone()).map_err(|e| {
        vec![ValidationFailure {
            path: String::new(),
            message: format!("contract mismatch: {e}"),
        }]
    })
}

impl Verifier for SchemaVerifier {
    fn extract(&self, raw: &str) -> Option<Value> {
        extract_json(raw)
    }

    fn validate(&self, value: &Value, kind: SchemaKind) -> ValidationOutcome {
        let failures = self.structural_failures(value, kind);
        if !failures.is_empty() {
            warn!(schema = %kind, failures = failures.len(), "value failed structural validation");
            return ValidationOutcome::Invalid(failures);
        }

        let data = match kind {
            SchemaKind::Triage => typed(value).map(Validated::Triage),
            SchemaKind::Diagnose => typed(value).map(Validated::Diagnose),
        };

        match data {
            Ok(data) => ValidationOutcome::Valid(data),
            Err(failures) => {
                warn!(schema = %kind, "value failed typed validation");
                ValidationOutcome::Invalid(failures)
            }
        }
    }
}
