//! The MEDIX pipeline: the structured-output reliability runner.
//!
//! The pipeline enforces the MEDIX execution model for every request:
//!
//!   SafetyGate → Prompt → ProviderChain → Extract → Validate → [Repair] → Filter
//!
//! Two invariants are enforced structurally:
//!
//! - No generator is called for a request the safety gate short-circuits. The
//!   code path to `ProviderChain::complete()` is only reachable after the gate
//!   has run and allowed the request.
//! - Nothing unvalidated reaches the caller. Every exit returns either typed
//!   data that passed the verifier or a hardcoded fallback.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use medix_contracts::{
    diagnose::{DiagnoseReport, DiagnoseResult},
    patient::PatientInput,
    provider::{GenerationOptions, ProviderSlot, ProviderUsed},
    triage::{TriageReport, TriageResult},
    verify::{SchemaKind, Validated, ValidationFailure, ValidationOutcome},
};

use crate::chain::{ChainOutcome, ProviderChain};
use crate::fallback;
use crate::prompt::{
    build_diagnose_content, build_user_content, format_reference_context, DIAGNOSE_SYSTEM_PROMPT,
    TRIAGE_SYSTEM_PROMPT,
};
use crate::repair::RepairLoop;
use crate::traits::{Generator, MedicineFilter, NoRetriever, Retriever, SafetyGate, Verifier};

/// How many reference documents to request per triage.
pub const DEFAULT_REFERENCE_LIMIT: usize = 5;

/// What the generation stages produced for one request.
#[derive(Debug)]
enum Generated {
    /// Schema-valid data, possibly after one repair.
    Valid {
        data: Validated,
        slot: ProviderSlot,
        repaired: bool,
    },
    /// A backend answered but nothing valid could be recovered.
    Unvalidated { slot: ProviderSlot },
    /// No backend answered.
    Exhausted,
}

/// The request runner.
///
/// Construct one pipeline at process start and share it across requests. It
/// holds only read-only configuration; each call to `run_triage` or
/// `run_diagnose` is independent.
pub struct Pipeline {
    gate: Box<dyn SafetyGate>,
    providers: ProviderChain,
    verifier: Box<dyn Verifier>,
    filter: Box<dyn MedicineFilter>,
    retriever: Box<dyn Retriever>,
    repair_backend: Option<Arc<dyn Generator>>,
    reference_limit: usize,
}

impl Pipeline {
    /// Create a pipeline with no retrieval and no repair backend.
    pub fn new(
        gate: Box<dyn SafetyGate>,
        providers: ProviderChain,
        verifier: Box<dyn Verifier>,
        filter: Box<dyn MedicineFilter>,
    ) -> Self {
        Self {
            gate,
            providers,
            verifier,
            filter,
            retriever: Box::new(NoRetriever),
            repair_backend: None,
            reference_limit: DEFAULT_REFERENCE_LIMIT,
        }
    }

    /// Enrich triage prompts with reference documents from `retriever`.
    pub fn with_retriever(mut self, retriever: Box<dyn Retriever>) -> Self {
        self.retriever = retriever;
        self
    }

    /// Use `backend` for the single repair attempt.
    pub fn with_repair_backend(mut self, backend: Arc<dyn Generator>) -> Self {
        self.repair_backend = Some(backend);
        self
    }

    pub fn with_reference_limit(mut self, top_k: usize) -> Self {
        self.reference_limit = top_k;
        self
    }

    pub fn providers(&self) -> &ProviderChain {
        &self.providers
    }

    /// Triage a patient. Never fails.
    ///
    /// # Pipeline
    ///
    /// 1. Run the safety gate; an emergency returns `EMERGENCY` immediately,
    ///    with no backend contacted and `provider_used` absent
    /// 2. Retrieve reference documents (errors degrade to none)
    /// 3. Build the prompt and run the provider chain
    /// 4. Extract, validate, and repair at most once
    /// 5. Fall back to a hardcoded `ROUTINE` answer if nothing valid remains
    /// 6. Attach the gate's safety notes and provenance
    pub async fn run_triage(&self, input: &PatientInput) -> TriageReport {
        let span = info_span!("triage", request_id = %Uuid::new_v4());
        self.triage_inner(input).instrument(span).await
    }

    async fn triage_inner(&self, input: &PatientInput) -> TriageReport {
        let started = Instant::now();

        // ── Step 1: Safety gate ──────────────────────────────────────────────
        let assessment = self.gate.assess(input);
        let safety_notes = assessment.safety_notes.clone();

        if assessment.emergency_detected {
            warn!(
                warnings = assessment.warnings.len(),
                "emergency detected by safety rules, skipping generation"
            );
            return TriageReport {
                result: fallback::emergency_triage(&assessment),
                safety_notes,
                provider_used: None,
                repaired: false,
                latency_ms: elapsed_ms(started),
            };
        }

        // ── Step 2: Reference enrichment ─────────────────────────────────────
        let references = match self.retriever.retrieve(&input.symptoms, self.reference_limit).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "reference retrieval failed, continuing without references");
                Vec::new()
            }
        };
        debug!(references = references.len(), "reference retrieval complete");

        // ── Steps 3 & 4: Generate, extract, validate, repair ─────────────────
        let user_content = format!(
            "{}{}",
            build_user_content(input),
            format_reference_context(&references)
        );
        let generated = self
            .generate_validated(SchemaKind::Triage, TRIAGE_SYSTEM_PROMPT, &user_content)
            .await;

        // ── Steps 5 & 6: Assemble ────────────────────────────────────────────
        let (result, provider_used, repaired): (TriageResult, ProviderUsed, bool) = match generated {
            Generated::Valid { data: Validated::Triage(result), slot, repaired } => {
                (result, slot.into(), repaired)
            }
            Generated::Valid { slot, .. } | Generated::Unvalidated { slot } => {
                warn!(slot = %slot, "no valid triage output, using deterministic fallback");
                (fallback::unvalidated_triage(), ProviderUsed::DeterministicFallback, false)
            }
            Generated::Exhausted => {
                (fallback::unreachable_triage(), ProviderUsed::DeterministicFallback, false)
            }
        };

        info!(
            urgency = %result.urgency,
            provider_used = ?provider_used,
            repaired,
            "triage complete"
        );

        TriageReport {
            result,
            safety_notes,
            provider_used: Some(provider_used),
            repaired,
            latency_ms: elapsed_ms(started),
        }
    }

    /// Suggest OTC medicines for a patient. Never fails.
    ///
    /// A blocked patient (pregnancy, infant) or an emergency gets an empty
    /// medicine list and see-doctor advice without any backend call. Every
    /// validated medicine list passes through the filter, and the gate's notes
    /// are merged into `safety_notes` on every path.
    pub async fn run_diagnose(&self, input: &PatientInput) -> DiagnoseReport {
        let span = info_span!("diagnose", request_id = %Uuid::new_v4());
        self.diagnose_inner(input).instrument(span).await
    }

    async fn diagnose_inner(&self, input: &PatientInput) -> DiagnoseReport {
        let started = Instant::now();

        // ── Step 1: Safety gate ──────────────────────────────────────────────
        let assessment = self.gate.assess(input);

        if assessment.blocked || assessment.emergency_detected {
            info!(
                blocked = assessment.blocked,
                emergency = assessment.emergency_detected,
                "medicine suggestions withheld by safety rules"
            );
            return DiagnoseReport {
                result: fallback::blocked_diagnose(&assessment),
                provider_used: None,
                repaired: false,
                latency_ms: elapsed_ms(started),
            };
        }

        // ── Steps 2 & 3: Generate, extract, validate, repair ─────────────────
        let generated = self
            .generate_validated(
                SchemaKind::Diagnose,
                DIAGNOSE_SYSTEM_PROMPT,
                &build_diagnose_content(input),
            )
            .await;

        // ── Step 4: Filter and merge ─────────────────────────────────────────
        let (result, provider_used, repaired) = match generated {
            Generated::Valid { data: Validated::Diagnose(data), slot, repaired } => {
                let before = data.medicines.len();
                let medicines = self.filter.filter(data.medicines);
                if medicines.len() < before {
                    warn!(removed = before - medicines.len(), "denylisted medicines removed");
                }
                let result = DiagnoseResult {
                    medicines,
                    general_advice: data.general_advice,
                    see_doctor: data.see_doctor,
                    safety_notes: fallback::merged_notes(&data.safety_notes, &assessment),
                };
                (result, ProviderUsed::from(slot), repaired)
            }
            Generated::Valid { slot, .. } | Generated::Unvalidated { slot } => {
                warn!(slot = %slot, "no valid diagnose output, using deterministic fallback");
                (fallback::fallback_diagnose(&assessment), ProviderUsed::DeterministicFallback, false)
            }
            Generated::Exhausted => {
                (fallback::fallback_diagnose(&assessment), ProviderUsed::DeterministicFallback, false)
            }
        };

        info!(
            medicines = result.medicines.len(),
            provider_used = ?provider_used,
            repaired,
            "diagnose complete"
        );

        DiagnoseReport {
            result,
            provider_used: Some(provider_used),
            repaired,
            latency_ms: elapsed_ms(started),
        }
    }

    /// Run the chain and turn its answer into validated data if possible.
    async fn generate_validated(
        &self,
        kind: SchemaKind,
        system_prompt: &str,
        user_content: &str,
    ) -> Generated {
        let completion = match self
            .providers
            .complete(system_prompt, user_content, &GenerationOptions::structured())
            .await
        {
            ChainOutcome::Completed(c) => c,
            ChainOutcome::Exhausted { .. } => return Generated::Exhausted,
        };
        let slot = completion.slot;

        let (subject, failures) = match self.verifier.extract(&completion.text) {
            Some(value) => match self.verifier.validate(&value, kind) {
                ValidationOutcome::Valid(data) => {
                    return Generated::Valid { data, slot, repaired: false };
                }
                ValidationOutcome::Invalid(failures) => {
                    warn!(schema = %kind, failures = failures.len(), "model output failed validation");
                    (value, failures)
                }
            },
            None => {
                warn!(schema = %kind, "no JSON object could be extracted from model output");
                let failures = vec![ValidationFailure {
                    path: String::new(),
                    message: "response did not contain a parseable JSON object".to_string(),
                }];
                (Value::String(completion.text), failures)
            }
        };

        let Some(backend) = self.repair_backend.as_deref() else {
            debug!("no repair backend configured");
            return Generated::Unvalidated { slot };
        };

        let repair = RepairLoop::new(backend, self.verifier.as_ref(), self.repair_timeout());
        match repair.repair(&subject, &failures, kind, system_prompt).await {
            Some(data) => Generated::Valid { data, slot, repaired: true },
            None => Generated::Unvalidated { slot },
        }
    }

    fn repair_timeout(&self) -> Duration {
        self.providers.timeout()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;

    use medix_contracts::{
        diagnose::{DiagnoseResult, Medicine},
        error::{MedixError, MedixResult},
        patient::PatientInput,
        provider::{GenerationOptions, ProviderSlot, ProviderUsed, ReferenceDoc},
        safety::SafetyAssessment,
        triage::{TriageResult, Urgency},
        verify::{SchemaKind, Validated, ValidationFailure, ValidationOutcome},
    };

    use crate::chain::ProviderChain;
    use crate::traits::{Generator, MedicineFilter, Retriever, SafetyGate, Verifier};

    use super::Pipeline;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A gate that flags emergencies on the word "collapse" and blocks on
    /// pregnancy. Just enough to drive the pipeline branches.
    struct MockGate;

    impl SafetyGate for MockGate {
        fn assess(&self, input: &PatientInput) -> SafetyAssessment {
            let mut assessment = SafetyAssessment::default();
            if input.symptoms.contains("collapse") {
                assessment.emergency_detected = true;
                assessment.warnings.push("Loss of consciousness".to_string());
            }
            if input.pregnant {
                assessment.blocked = true;
                assessment.safety_notes.push("Patient is pregnant".to_string());
            }
            assessment
        }
    }

    /// A verifier that parses strictly and deserializes with serde defaults.
    struct MockVerifier;

    impl Verifier for MockVerifier {
        fn extract(&self, raw: &str) -> Option<Value> {
            serde_json::from_str(raw.trim()).ok()
        }

        fn validate(&self, value: &Value, kind: SchemaKind) -> ValidationOutcome {
            let fail = |e: serde_json::Error| {
                ValidationOutcome::Invalid(vec![ValidationFailure {
                    path: String::new(),
                    message: e.to_string(),
                }])
            };
            match kind {
                SchemaKind::Triage => match serde_json::from_value::<TriageResult>(value.clone()) {
                    Ok(r) => ValidationOutcome::Valid(Validated::Triage(r)),
                    Err(e) => fail(e),
                },
                SchemaKind::Diagnose => match serde_json::from_value::<DiagnoseResult>(value.clone()) {
                    Ok(r) => ValidationOutcome::Valid(Validated::Diagnose(r)),
                    Err(e) => fail(e),
                },
            }
        }
    }

    /// Drops anything whose name mentions "antibiotic".
    struct MockFilter;

    impl MedicineFilter for MockFilter {
        fn filter(&self, medicines: Vec<Medicine>) -> Vec<Medicine> {
            medicines
                .into_iter()
                .filter(|m| !m.name.to_lowercase().contains("antibiotic"))
                .collect()
        }
    }

    /// A backend that replays scripted replies and counts calls.
    struct ScriptedBackend {
        name: &'static str,
        replies: Mutex<VecDeque<MedixResult<String>>>,
        calls: Arc<Mutex<u32>>,
    }

    impl ScriptedBackend {
        fn new(name: &'static str, replies: Vec<MedixResult<String>>) -> Self {
            Self {
                name,
                replies: Mutex::new(replies.into()),
                calls: Arc::new(Mutex::new(0)),
            }
        }

        fn replying(name: &'static str, reply: &str) -> Self {
            Self::new(name, vec![Ok(reply.to_string())])
        }

        fn down(name: &'static str) -> Self {
            Self::new(name, vec![])
        }
    }

    #[async_trait]
    impl Generator for ScriptedBackend {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _options: &GenerationOptions,
        ) -> MedixResult<String> {
            *self.calls.lock().unwrap() += 1;
            self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(MedixError::ProviderFailed {
                    provider: self.name.to_string(),
                    reason: "connection refused".to_string(),
                })
            })
        }
    }

    struct FailingRetriever;

    #[async_trait]
    impl Retriever for FailingRetriever {
        async fn retrieve(&self, _query: &str, _top_k: usize) -> MedixResult<Vec<ReferenceDoc>> {
            Err(MedixError::Retrieval { reason: "index offline".to_string() })
        }
    }

    /// Records the `top_k` each lookup asks for.
    #[derive(Default)]
    struct RecordingRetriever {
        requested: Arc<Mutex<Vec<usize>>>,
    }

    #[async_trait]
    impl Retriever for RecordingRetriever {
        async fn retrieve(&self, _query: &str, top_k: usize) -> MedixResult<Vec<ReferenceDoc>> {
            self.requested.lock().unwrap().push(top_k);
            Ok(Vec::new())
        }
    }

    const VALID_TRIAGE: &str = r#"{"urgency":"SELF_CARE","summary":"May indicate a tension headache.","nextSteps":["Rest"]}"#;

    fn pipeline(chain: ProviderChain) -> Pipeline {
        Pipeline::new(Box::new(MockGate), chain, Box::new(MockVerifier), Box::new(MockFilter))
    }

    fn chain_with(backend: Arc<dyn Generator>) -> ProviderChain {
        ProviderChain::new(Duration::from_secs(1)).with_backend(ProviderSlot::Primary, backend)
    }

    // ── Triage ───────────────────────────────────────────────────────────────

    /// Core safety test: an emergency must never reach a backend.
    #[tokio::test]
    async fn test_emergency_short_circuits_before_any_call() {
        let backend = ScriptedBackend::replying("groq", VALID_TRIAGE);
        let calls = backend.calls.clone();
        let pipeline = pipeline(chain_with(Arc::new(backend)));

        let report = pipeline.run_triage(&PatientInput::new("sudden collapse at work")).await;

        assert_eq!(*calls.lock().unwrap(), 0, "no backend call on emergency");
        assert_eq!(report.result.urgency, Urgency::Emergency);
        assert!(!report.result.red_flags.is_empty());
        assert_eq!(report.provider_used, None);
    }

    #[tokio::test]
    async fn test_valid_primary_output_is_returned() {
        let pipeline = pipeline(chain_with(Arc::new(ScriptedBackend::replying("groq", VALID_TRIAGE))));

        let report = pipeline.run_triage(&PatientInput::new("mild headache").with_age("30")).await;

        assert_eq!(report.result.urgency, Urgency::SelfCare);
        assert_eq!(report.provider_used, Some(ProviderUsed::Primary));
        assert!(!report.repaired);
        assert!(report.result.questions.is_empty(), "absent arrays default to empty");
    }

    #[tokio::test]
    async fn test_exhaustion_returns_routine_fallback() {
        let chain = ProviderChain::new(Duration::from_secs(1))
            .with_backend(ProviderSlot::Primary, Arc::new(ScriptedBackend::down("groq")))
            .with_backend(ProviderSlot::Secondary, Arc::new(ScriptedBackend::down("sambanova")))
            .with_backend(ProviderSlot::Tertiary, Arc::new(ScriptedBackend::down("gemini")));
        let pipeline = pipeline(chain);

        let report = pipeline.run_triage(&PatientInput::new("sore throat").with_pregnancy()).await;

        assert_eq!(report.result.urgency, Urgency::Routine);
        assert_eq!(report.provider_used, Some(ProviderUsed::DeterministicFallback));
        assert!(!report.result.next_steps.is_empty());
        assert_eq!(report.safety_notes, vec!["Patient is pregnant".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_output_is_repaired_once() {
        let primary = ScriptedBackend::replying("groq", r#"{"urgency":"SOON","summary":"x"}"#);
        let repairer = ScriptedBackend::replying(
            "groq-repair",
            r#"{"urgency":"ROUTINE","summary":"Could suggest a viral infection."}"#,
        );
        let repair_calls = repairer.calls.clone();
        let pipeline = pipeline(chain_with(Arc::new(primary))).with_repair_backend(Arc::new(repairer));

        let report = pipeline.run_triage(&PatientInput::new("cough and fever")).await;

        assert_eq!(*repair_calls.lock().unwrap(), 1);
        assert!(report.repaired);
        assert_eq!(report.result.urgency, Urgency::Routine);
        assert_eq!(report.provider_used, Some(ProviderUsed::Primary));
    }

    #[tokio::test]
    async fn test_failed_repair_falls_back() {
        let primary = ScriptedBackend::replying("groq", "I am not JSON at all");
        let repairer = ScriptedBackend::replying("groq-repair", r#"{"urgency":"LATER"}"#);
        let repair_calls = repairer.calls.clone();
        let pipeline = pipeline(chain_with(Arc::new(primary))).with_repair_backend(Arc::new(repairer));

        let report = pipeline.run_triage(&PatientInput::new("cough and fever")).await;

        assert_eq!(*repair_calls.lock().unwrap(), 1, "repair is attempted exactly once");
        assert!(!report.repaired);
        assert_eq!(report.result.urgency, Urgency::Routine);
        assert_eq!(report.provider_used, Some(ProviderUsed::DeterministicFallback));
    }

    #[tokio::test]
    async fn test_invalid_output_without_repair_backend_falls_back() {
        let pipeline = pipeline(chain_with(Arc::new(ScriptedBackend::replying("groq", "{}"))));
        let report = pipeline.run_triage(&PatientInput::new("itchy eyes")).await;
        assert_eq!(report.provider_used, Some(ProviderUsed::DeterministicFallback));
        assert!(!report.result.summary.is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_failure_does_not_break_triage() {
        let pipeline = pipeline(chain_with(Arc::new(ScriptedBackend::replying("groq", VALID_TRIAGE))))
            .with_retriever(Box::new(FailingRetriever));
        let report = pipeline.run_triage(&PatientInput::new("mild headache")).await;
        assert_eq!(report.provider_used, Some(ProviderUsed::Primary));
    }

    #[tokio::test]
    async fn test_reference_limit_reaches_the_retriever() {
        let retriever = RecordingRetriever::default();
        let requested = retriever.requested.clone();
        let pipeline = pipeline(chain_with(Arc::new(ScriptedBackend::replying("groq", VALID_TRIAGE))))
            .with_retriever(Box::new(retriever))
            .with_reference_limit(2);
        assert_eq!(pipeline.providers().len(), 1);

        pipeline.run_triage(&PatientInput::new("mild headache")).await;

        assert_eq!(*requested.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_default_reference_limit() {
        let retriever = RecordingRetriever::default();
        let requested = retriever.requested.clone();
        let pipeline = pipeline(chain_with(Arc::new(ScriptedBackend::replying("groq", VALID_TRIAGE))))
            .with_retriever(Box::new(retriever));

        pipeline.run_triage(&PatientInput::new("mild headache")).await;

        assert_eq!(*requested.lock().unwrap(), vec![super::DEFAULT_REFERENCE_LIMIT]);
    }

    // ── Diagnose ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_pregnancy_blocks_medicines_regardless_of_provider() {
        let backend = ScriptedBackend::replying(
            "groq",
            r#"{"medicines":[{"name":"Ibuprofen"}],"see_doctor":false}"#,
        );
        let calls = backend.calls.clone();
        let pipeline = pipeline(chain_with(Arc::new(backend)));

        let report = pipeline.run_diagnose(&PatientInput::new("back pain").with_pregnancy()).await;

        assert_eq!(*calls.lock().unwrap(), 0);
        assert!(report.result.medicines.is_empty());
        assert!(report.result.see_doctor);
        assert!(report.result.safety_notes.contains(&"Patient is pregnant".to_string()));
    }

    #[tokio::test]
    async fn test_diagnose_filters_and_merges_notes() {
        let backend = ScriptedBackend::replying(
            "groq",
            r#"{"medicines":[{"name":"Paracetamol"},{"name":"Antibiotic X"}],"safety_notes":["Stay hydrated"]}"#,
        );
        let pipeline = pipeline(chain_with(Arc::new(backend)));

        let report = pipeline.run_diagnose(&PatientInput::new("fever and body ache")).await;

        let names: Vec<&str> = report.result.medicines.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Paracetamol"]);
        assert_eq!(report.result.safety_notes, vec!["Stay hydrated".to_string()]);
        assert_eq!(report.provider_used, Some(ProviderUsed::Primary));
    }

    #[tokio::test]
    async fn test_diagnose_exhaustion_sends_to_doctor() {
        let pipeline = pipeline(chain_with(Arc::new(ScriptedBackend::down("groq"))));
        let report = pipeline.run_diagnose(&PatientInput::new("runny nose and sneezing")).await;
        assert!(report.result.medicines.is_empty());
        assert!(report.result.see_doctor);
        assert_eq!(report.provider_used, Some(ProviderUsed::DeterministicFallback));
    }
}
