//! Scenario: Emergency Short-Circuit
//!
//! "chest pain and can't breathe" matches two emergency rules. The gate
//! answers EMERGENCY before the provider chain is reached, so the scripted
//! primary, which holds a perfectly valid SELF_CARE answer, is never called.

use medix_contracts::{error::MedixResult, patient::PatientInput, triage::TriageReport};

use crate::scenarios::{build_pipeline, primary_chain, print_triage};
use crate::scripted::{calls, ScriptedBackend};

const SYMPTOMS: &str = "chest pain and can't breathe";

/// Run the scenario and return the report with the primary's call count.
pub async fn run() -> MedixResult<(TriageReport, u32)> {
    let primary = ScriptedBackend::replying(
        "groq",
        r#"{"urgency":"SELF_CARE","summary":"Probably nothing serious."}"#,
    );
    let counter = primary.call_counter();
    let pipeline = build_pipeline(
        primary_chain(primary),
        None,
    )?;

    let report = pipeline.run_triage(&PatientInput::new(SYMPTOMS).with_age("54")).await;
    Ok((report, calls(&counter)))
}

pub async fn run_scenario() -> MedixResult<()> {
    println!("=== Scenario: Emergency Short-Circuit ===");
    println!();
    println!("  Symptoms: \"{}\"", SYMPTOMS);
    println!("  Primary backend scripted with a SELF_CARE answer");
    println!();

    let (report, calls) = run().await?;
    print_triage(&report, calls);
    Ok(())
}
