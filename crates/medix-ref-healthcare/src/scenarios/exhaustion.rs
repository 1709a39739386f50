//! Scenario: Total Provider Exhaustion
//!
//! All three backends are unreachable. Each is tried exactly once in
//! priority order and the pipeline answers with the deterministic ROUTINE
//! fallback.

use std::sync::Arc;

use medix_contracts::{
    error::MedixResult, patient::PatientInput, provider::ProviderSlot, triage::TriageReport,
};

use medix_core::traits::Generator;

use crate::scenarios::{build_pipeline, print_triage, scripted_chain};
use crate::scripted::{calls, ScriptedBackend};

/// Returns the report and the total number of backend calls.
pub async fn run() -> MedixResult<(TriageReport, u32)> {
    let backends = [
        (ProviderSlot::Primary, ScriptedBackend::unreachable("groq")),
        (ProviderSlot::Secondary, ScriptedBackend::unreachable("sambanova")),
        (ProviderSlot::Tertiary, ScriptedBackend::unreachable("gemini")),
    ];
    let counters: Vec<_> = backends.iter().map(|(_, b)| b.call_counter()).collect();
    let chain = scripted_chain(
        backends
            .into_iter()
            .map(|(slot, backend)| (slot, Arc::new(backend) as Arc<dyn Generator>))
            .collect(),
    );
    let pipeline = build_pipeline(chain, None)?;

    let report = pipeline
        .run_triage(&PatientInput::new("sore throat and mild fever").with_age("70"))
        .await;
    let total: u32 = counters.iter().map(calls).sum();
    Ok((report, total))
}

pub async fn run_scenario() -> MedixResult<()> {
    println!("=== Scenario: Total Provider Exhaustion ===");
    println!();
    println!("  Backends: groq, sambanova, gemini (all unreachable)");
    println!();

    let (report, calls) = run().await?;
    print_triage(&report, calls);
    for step in &report.result.next_steps {
        println!("  Next step:      {}", step);
    }
    println!();
    Ok(())
}
