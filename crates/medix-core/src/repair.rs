//! Single-shot self-correction of invalid model output.
//!
//! The repair loop asks one fixed backend, at low temperature, to rewrite an
//! invalid value so it satisfies the contract. The answer goes back through
//! the same extract + validate path as any other completion. There is no
//! second attempt.

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use medix_contracts::{
    provider::{GenerationOptions, ProviderCallRecord},
    verify::{SchemaKind, Validated, ValidationFailure, ValidationOutcome},
};

use crate::chain::log_call;
use crate::prompt::{build_repair_prompt, REPAIR_SYSTEM_PROMPT};
use crate::traits::{Generator, Verifier};

/// Borrowed view of the components a repair needs.
pub struct RepairLoop<'a> {
    backend: &'a dyn Generator,
    verifier: &'a dyn Verifier,
    timeout: Duration,
}

impl<'a> RepairLoop<'a> {
    pub fn new(backend: &'a dyn Generator, verifier: &'a dyn Verifier, timeout: Duration) -> Self {
        Self { backend, verifier, timeout }
    }

    /// Attempt one repair of `invalid`.
    ///
    /// Returns `None` when the backend call fails or times out, when nothing
    /// can be extracted from its answer, or when the answer still fails
    /// validation. Callers fall back to a deterministic result on `None`.
    pub async fn repair(
        &self,
        invalid: &Value,
        failures: &[ValidationFailure],
        kind: SchemaKind,
        system_prompt: &str,
    ) -> Option<Validated> {
        let system_prompt = if system_prompt.trim().is_empty() {
            REPAIR_SYSTEM_PROMPT
        } else {
            system_prompt
        };
        let prompt = build_repair_prompt(invalid, failures);
        let provider = self.backend.name().to_string();

        debug!(provider = %provider, schema = %kind, failures = failures.len(), "attempting repair");

        let started = Instant::now();
        let call = tokio::time::timeout(
            self.timeout,
            self.backend.generate(system_prompt, &prompt, &GenerationOptions::repair()),
        )
        .await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let text = match call {
            Ok(Ok(text)) => {
                log_call(&ProviderCallRecord {
                    provider_name: provider.clone(),
                    latency_ms,
                    success: true,
                    used_fallback: false,
                    error: None,
                });
                text
            }
            Ok(Err(e)) => {
                log_call(&ProviderCallRecord {
                    provider_name: provider,
                    latency_ms,
                    success: false,
                    used_fallback: false,
                    error: Some(e.to_string()),
                });
                return None;
            }
            Err(_) => {
                log_call(&ProviderCallRecord {
                    provider_name: provider,
                    latency_ms,
                    success: false,
                    used_fallback: false,
                    error: Some(format!("timed out after {}ms", self.timeout.as_millis())),
                });
                return None;
            }
        };

        let Some(value) = self.verifier.extract(&text) else {
            warn!(schema = %kind, "repair answer contained no JSON object");
            return None;
        };

        match self.verifier.validate(&value, kind) {
            ValidationOutcome::Valid(data) => {
                info!(schema = %kind, "repair succeeded");
                Some(data)
            }
            ValidationOutcome::Invalid(still_failing) => {
                warn!(
                    schema = %kind,
                    failures = still_failing.len(),
                    "repaired output still fails validation"
                );
                None
            }
        }
    }
}
