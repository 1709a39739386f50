//! Healthcare reference runtime demo scenarios.
//!
//! Each scenario wires the real MEDIX components (rulebook gate, denylist,
//! schema verifier, reference library, pipeline) to scripted backends and
//! demonstrates one reliability behavior. Nothing touches the network.

pub mod denylist;
pub mod emergency;
pub mod exhaustion;
pub mod headache;
pub mod pregnancy;
pub mod truncated_repair;

use std::sync::Arc;
use std::time::Duration;

use medix_contracts::{
    diagnose::DiagnoseReport,
    error::MedixResult,
    provider::{ProviderSlot, ProviderUsed},
    triage::TriageReport,
};
use medix_core::{chain::ProviderChain, traits::Generator, Pipeline};
use medix_policy::{DenylistFilter, RuleSafetyGate, Rulebook};
use medix_verify::SchemaVerifier;

use crate::library::ReferenceLibrary;
use crate::scripted::ScriptedBackend;

/// Per-backend budget for scripted chains.
const SCRIPTED_TIMEOUT: Duration = Duration::from_secs(2);

/// Build a chain from `(slot, backend)` pairs.
pub fn scripted_chain(backends: Vec<(ProviderSlot, Arc<dyn Generator>)>) -> ProviderChain {
    backends
        .into_iter()
        .fold(ProviderChain::new(SCRIPTED_TIMEOUT), |chain, (slot, backend)| {
            chain.with_backend(slot, backend)
        })
}

/// A chain with `backend` as its only (primary) member.
pub fn primary_chain(backend: ScriptedBackend) -> ProviderChain {
    ProviderChain::new(SCRIPTED_TIMEOUT).with_backend(ProviderSlot::Primary, Arc::new(backend))
}

/// Wire a pipeline with the built-in rulebook, verifier and reference library.
pub fn build_pipeline(
    chain: ProviderChain,
    repair: Option<Arc<dyn Generator>>,
) -> MedixResult<Pipeline> {
    let rulebook = Rulebook::builtin()?;
    let pipeline = Pipeline::new(
        Box::new(RuleSafetyGate::from_rulebook(&rulebook)?),
        chain,
        Box::new(SchemaVerifier::new()),
        Box::new(DenylistFilter::from_rulebook(&rulebook)?),
    )
    .with_retriever(Box::new(ReferenceLibrary::builtin()));

    Ok(match repair {
        Some(backend) => pipeline.with_repair_backend(backend),
        None => pipeline,
    })
}

// ── Output helpers ────────────────────────────────────────────────────────────

fn provenance(provider_used: &Option<ProviderUsed>) -> String {
    match provider_used {
        Some(used) => serde_json::to_value(used)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", used)),
        None => "(none: no backend contacted)".to_string(),
    }
}

pub(crate) fn print_triage(report: &TriageReport, calls: u32) {
    println!("  Urgency:        {}", report.result.urgency);
    println!("  Summary:        {}", report.result.summary);
    for flag in &report.result.red_flags {
        println!("  Red flag:       {}", flag);
    }
    for note in &report.safety_notes {
        println!("  Safety note:    {}", note);
    }
    println!("  Provider used:  {}", provenance(&report.provider_used));
    println!("  Repaired:       {}", report.repaired);
    println!("  Backend calls:  {}", calls);
    println!();
}

pub(crate) fn print_diagnose(report: &DiagnoseReport, calls: u32) {
    if report.result.medicines.is_empty() {
        println!("  Medicines:      (none)");
    }
    for medicine in &report.result.medicines {
        println!("  Medicine:       {} [{}] - {}", medicine.name, medicine.kind, medicine.warning);
    }
    println!("  See doctor:     {}", report.result.see_doctor);
    for note in &report.result.safety_notes {
        println!("  Safety note:    {}", note);
    }
    println!("  Provider used:  {}", provenance(&report.provider_used));
    println!("  Backend calls:  {}", calls);
    println!();
}

// ── Tests ─────────────────────────────────────────────────────────────────────
