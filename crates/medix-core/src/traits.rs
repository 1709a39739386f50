//! Core trait definitions for the MEDIX pipeline.
//!
//! These traits define the complete trust boundary:
//!
//! - `Generator`: untrusted text generation (an LLM backend)
//! - `Retriever`: optional reference lookup, allowed to fail
//! - `SafetyGate`: trusted gate (evaluated before any generation)
//! - `Verifier`: trusted checker (extracts and validates model output)
//! - `MedicineFilter`: trusted scrub (last stage before the caller)
//!
//! The pipeline wires them together in that order. A `Generator` is never
//! called for a request the safety gate has short-circuited.

use async_trait::async_trait;
use serde_json::Value;

use medix_contracts::{
    diagnose::Medicine,
    error::MedixResult,
    patient::PatientInput,
    provider::{GenerationOptions, ReferenceDoc},
    safety::SafetyAssessment,
    verify::{SchemaKind, ValidationOutcome},
};

/// A text-generation backend.
///
/// Implementations are **untrusted**: their output is raw text that must go
/// through a `Verifier` before anything reaches the caller. Each backend
/// normalizes its own request/response envelope to a plain string.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short stable name used in logs and call records (e.g. "groq").
    fn name(&self) -> &str;

    /// Produce a completion for the given prompts.
    ///
    /// Any network, auth, status or envelope problem is an `Err`; the
    /// fallback chain treats every error the same way.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> MedixResult<String>;
}

/// Reference-document retrieval used to ground citations.
///
/// Optional and degradable: the pipeline turns an `Err` into an empty list.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, top_k: usize) -> MedixResult<Vec<ReferenceDoc>>;
}

/// A retriever that never finds anything. Used when no library is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRetriever;

#[async_trait]
impl Retriever for NoRetriever {
    async fn retrieve(&self, _query: &str, _top_k: usize) -> MedixResult<Vec<ReferenceDoc>> {
        Ok(Vec::new())
    }
}

/// The deterministic pre-check over patient input.
///
/// Implementations are **trusted**, pure and infallible. They must not do I/O.
pub trait SafetyGate: Send + Sync {
    fn assess(&self, input: &PatientInput) -> SafetyAssessment;
}

/// The output verifier: turns raw model text into typed, schema-valid data.
///
/// Implementations are **trusted** and must never call a generator.
pub trait Verifier: Send + Sync {
    /// Recover a JSON value from a possibly malformed completion.
    ///
    /// `None` is an expected outcome, not an error.
    fn extract(&self, raw: &str) -> Option<Value>;

    /// Check `value` against the contract for `kind`, applying defaults.
    fn validate(&self, value: &Value, kind: SchemaKind) -> ValidationOutcome;
}

/// The final enforcement boundary for medicine suggestions.
pub trait MedicineFilter: Send + Sync {
    /// Drop disallowed medicines and normalize the survivors.
    fn filter(&self, medicines: Vec<Medicine>) -> Vec<Medicine>;
}
