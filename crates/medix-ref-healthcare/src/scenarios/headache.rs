//! Scenario: Routine Success
//!
//! A mild headache with a well-formed primary answer. The reference library
//! grounds the prompt with the WHO headache excerpt and the answer passes
//! validation untouched.

use medix_contracts::{error::MedixResult, patient::PatientInput, triage::TriageReport};

use crate::scenarios::{build_pipeline, primary_chain, print_triage};
use crate::scripted::{calls, ScriptedBackend};

const PRIMARY_REPLY: &str = r#"{
  "urgency": "SELF_CARE",
  "redFlags": [],
  "summary": "Symptoms may indicate a tension-type headache.",
  "nextSteps": ["Rest in a quiet room", "Stay hydrated", "Consider paracetamol or ibuprofen"],
  "questions": ["Have you had any vision changes?"],
  "citations": [{
    "title": "WHO: Headache Management",
    "url": "https://who.int/news-room/fact-sheets/detail/headache-disorders",
    "quote": "Treatment of tension-type headache include aspirin, paracetamol, and ibuprofen."
  }]
}"#;

pub async fn run() -> MedixResult<(TriageReport, u32)> {
    let primary = ScriptedBackend::replying("groq", PRIMARY_REPLY);
    let counter = primary.call_counter();
    let pipeline = build_pipeline(
        primary_chain(primary),
        None,
    )?;

    let report = pipeline.run_triage(&PatientInput::new("mild headache").with_age("30")).await;
    Ok((report, calls(&counter)))
}

pub async fn run_scenario() -> MedixResult<()> {
    println!("=== Scenario: Routine Success ===");
    println!();
    println!("  Symptoms: \"mild headache\", age 30");
    println!("  Primary backend scripted with a well-formed answer");
    println!();

    let (report, calls) = run().await?;
    print_triage(&report, calls);
    Ok(())
}
