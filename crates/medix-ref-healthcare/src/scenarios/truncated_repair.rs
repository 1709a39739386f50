//! Scenario: Truncated Output Repair
//!
//! The primary answer is cut off mid-array and uses an urgency value outside
//! the contract. The extractor completes the truncated JSON; validation then
//! rejects "SOON", and the single repair call returns a corrected object.

use std::sync::Arc;

use medix_contracts::{error::MedixResult, patient::PatientInput, triage::TriageReport};

use crate::scenarios::{build_pipeline, primary_chain, print_triage};
use crate::scripted::{calls, ScriptedBackend};

const TRUNCATED_REPLY: &str =
    r#"{"urgency":"SOON","summary":"Pt has mild cold","nextSteps":["Rest","Drink warm flu"#;

const REPAIRED_REPLY: &str = r#"{"urgency":"SELF_CARE","summary":"Pt has mild cold","nextSteps":["Rest","Drink warm fluids"]}"#;

/// Returns the report with the primary's and the repairer's call counts.
pub async fn run() -> MedixResult<(TriageReport, u32, u32)> {
    let primary = ScriptedBackend::replying("groq", TRUNCATED_REPLY);
    let repairer = ScriptedBackend::replying("groq-repair", REPAIRED_REPLY);
    let primary_calls = primary.call_counter();
    let repair_calls = repairer.call_counter();

    let pipeline = build_pipeline(
        primary_chain(primary),
        Some(Arc::new(repairer)),
    )?;

    let report = pipeline
        .run_triage(&PatientInput::new("runny nose and sneezing for two days"))
        .await;
    Ok((report, calls(&primary_calls), calls(&repair_calls)))
}

pub async fn run_scenario() -> MedixResult<()> {
    println!("=== Scenario: Truncated Output Repair ===");
    println!();
    println!("  Primary reply:  {}", TRUNCATED_REPLY);
    println!("  Repair backend scripted with a corrected object");
    println!();

    let (report, primary_calls, repair_calls) = run().await?;
    print_triage(&report, primary_calls);
    println!("  Repair calls:   {}", repair_calls);
    println!();
    Ok(())
}
