//! Scenario: Denylist Scrub
//!
//! The primary suggests an antibiotic, an oral steroid, a topical steroid
//! cream and paracetamol. The denylist removes the first two; the survivors
//! are relabelled "OTC Guidance" and keep or receive a warning.

use medix_contracts::{diagnose::DiagnoseReport, error::MedixResult, patient::PatientInput};

use crate::scenarios::{build_pipeline, primary_chain, print_diagnose};
use crate::scripted::{calls, ScriptedBackend};

const PRIMARY_REPLY: &str = r#"{
  "medicines": [
    {"name": "Amoxicillin", "formula": "C16H19N3O5S", "usage": "Antibiotic for bacterial infection"},
    {"name": "Prednisolone", "formula": "C21H28O5", "usage": "Oral steroid for inflammation"},
    {"name": "Hydrocortisone 1%", "formula": "C21H30O5", "usage": "Mild steroid cream for itchy rash", "warning": ""},
    {"name": "Paracetamol", "formula": "C8H9NO2", "brands": ["Panadol"], "dosage": "500mg every 6 hours", "usage": "Pain and fever", "warning": "Do not exceed 4g per day"}
  ],
  "general_advice": "Keep the rash clean and dry.",
  "see_doctor": false,
  "safety_notes": []
}"#;

pub async fn run() -> MedixResult<(DiagnoseReport, u32)> {
    let primary = ScriptedBackend::replying("groq", PRIMARY_REPLY);
    let counter = primary.call_counter();
    let pipeline = build_pipeline(
        primary_chain(primary),
        None,
    )?;

    let input = PatientInput::new("itchy red rash on forearm with mild fever").with_age("40");
    let report = pipeline.run_diagnose(&input).await;
    Ok((report, calls(&counter)))
}

pub async fn run_scenario() -> MedixResult<()> {
    println!("=== Scenario: Denylist Scrub ===");
    println!();
    println!("  Primary suggests: Amoxicillin, Prednisolone, Hydrocortisone 1%, Paracetamol");
    println!();

    let (report, calls) = run().await?;
    print_diagnose(&report, calls);
    Ok(())
}
