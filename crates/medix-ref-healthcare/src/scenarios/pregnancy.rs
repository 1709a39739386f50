//! Scenario: Pregnancy Block
//!
//! A pregnant patient asks for medicine suggestions. The gate blocks the
//! request, so no backend is called and the answer carries the OB/GYN note.

use medix_contracts::{diagnose::DiagnoseReport, error::MedixResult, patient::PatientInput};

use crate::scenarios::{build_pipeline, primary_chain, print_diagnose};
use crate::scripted::{calls, ScriptedBackend};

pub async fn run() -> MedixResult<(DiagnoseReport, u32)> {
    let primary = ScriptedBackend::replying(
        "groq",
        r#"{"medicines":[{"name":"Ibuprofen","usage":"back pain"}],"see_doctor":false}"#,
    );
    let counter = primary.call_counter();
    let pipeline = build_pipeline(
        primary_chain(primary),
        None,
    )?;

    let input = PatientInput::new("lower back pain for a week")
        .with_age("31")
        .with_pregnancy();
    let report = pipeline.run_diagnose(&input).await;
    Ok((report, calls(&counter)))
}

pub async fn run_scenario() -> MedixResult<()> {
    println!("=== Scenario: Pregnancy Block ===");
    println!();
    println!("  Route: diagnose, pregnant = true");
    println!("  Primary backend scripted to suggest ibuprofen");
    println!();

    let (report, calls) = run().await?;
    print_diagnose(&report, calls);
    Ok(())
}
