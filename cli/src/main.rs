//! MEDIX command-line runner.
//!
//! Runs the triage and medicine-suggestion routes against the configured
//! providers, reports provider health, scores the evaluation cases, and
//! replays the offline demo scenarios.
//!
//! Usage:
//!   medix triage --symptoms "sore throat and mild fever" --age 34
//!   medix diagnose --symptoms "runny nose and sneezing for two days"
//!   medix health
//!   medix eval [CASES]
//!   medix demo run-all

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use medix_contracts::{
    error::{MedixError, MedixResult},
    patient::{Gender, PatientInput},
};
use medix_core::{pipeline::DEFAULT_REFERENCE_LIMIT, Pipeline};
use medix_policy::{check_diagnose_intake, check_symptoms, DenylistFilter, RuleSafetyGate, Rulebook};
use medix_providers::{HealthReport, ProvidersConfig};
use medix_ref_healthcare::{
    eval::{builtin_cases, load_cases, run_eval},
    scenarios::{denylist, emergency, exhaustion, headache, pregnancy, truncated_repair},
    ReferenceLibrary,
};
use medix_verify::SchemaVerifier;

/// Exit status for input the pipeline refuses to handle.
const EXIT_INPUT: u8 = 2;

// ── CLI definition ────────────────────────────────────────────────────────────

/// MEDIX: safety-gated, schema-validated triage and OTC guidance.
#[derive(Parser)]
#[command(
    name = "medix",
    version,
    about = "MEDIX triage and OTC guidance runner",
    long_about = "Runs the MEDIX pipeline: rule-based safety gate, provider fallback chain,\n\
                  JSON extraction, schema validation, one-shot repair and denylist scrub."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify the urgency of the given symptoms.
    Triage {
        #[command(flatten)]
        patient: PatientArgs,
        #[command(flatten)]
        runtime: RuntimeArgs,
    },
    /// Suggest over-the-counter medicines for the given symptoms.
    Diagnose {
        #[command(flatten)]
        patient: PatientArgs,
        #[command(flatten)]
        runtime: RuntimeArgs,
    },
    /// Report which provider slots are configured.
    Health {
        /// Provider configuration file (defaults to the built-in one).
        #[arg(long, value_name = "FILE")]
        providers: Option<PathBuf>,
    },
    /// Score labelled triage cases against the live pipeline.
    Eval {
        /// JSON case list (defaults to the built-in cases).
        cases: Option<PathBuf>,
        #[command(flatten)]
        runtime: RuntimeArgs,
    },
    /// Replay the offline demo scenarios.
    Demo {
        #[command(subcommand)]
        scenario: Scenario,
    },
}

#[derive(Subcommand)]
enum Scenario {
    /// Run every scenario in sequence.
    RunAll,
    /// Emergency symptoms short-circuit before any backend call.
    Emergency,
    /// Well-formed primary answer passes untouched.
    Headache,
    /// Truncated, off-contract output fixed by one repair call.
    TruncatedRepair,
    /// Every backend unreachable; deterministic fallback.
    Exhaustion,
    /// Pregnant patient; medicine suggestions withheld.
    Pregnancy,
    /// Prescription-only suggestions scrubbed from the answer.
    Denylist,
}

#[derive(Args)]
struct PatientArgs {
    /// Free-text description of the symptoms.
    #[arg(long)]
    symptoms: String,
    /// Age in years, e.g. "34" or "34 years".
    #[arg(long)]
    age: Option<String>,
    /// male, female or other.
    #[arg(long)]
    gender: Option<Gender>,
    /// How long the symptoms have lasted.
    #[arg(long)]
    duration: Option<String>,
    #[arg(long)]
    allergies: Option<String>,
    #[arg(long)]
    current_medications: Option<String>,
    #[arg(long)]
    pregnant: bool,
}

impl From<PatientArgs> for PatientInput {
    fn from(args: PatientArgs) -> Self {
        PatientInput {
            symptoms: args.symptoms,
            age: args.age,
            gender: args.gender,
            duration: args.duration,
            allergies: args.allergies,
            current_medications: args.current_medications,
            pregnant: args.pregnant,
        }
    }
}

#[derive(Args)]
struct RuntimeArgs {
    /// Provider configuration file (defaults to the built-in one).
    #[arg(long, value_name = "FILE")]
    providers: Option<PathBuf>,
    /// Safety rulebook file (defaults to the built-in one).
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,
    /// Reference documents to ground each triage prompt with.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_REFERENCE_LIMIT)]
    references: usize,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    // Set RUST_LOG=debug for per-call provider logs.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Triage { patient, runtime } => run_triage(patient.into(), &runtime).await,
        Command::Diagnose { patient, runtime } => run_diagnose(patient.into(), &runtime).await,
        Command::Health { providers } => run_health(providers.as_deref()),
        Command::Eval { cases, runtime } => run_eval_cases(cases.as_deref(), &runtime).await,
        Command::Demo { scenario } => run_demo(scenario).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(MedixError::InvalidInput { reason }) => {
            eprintln!("{}", reason);
            ExitCode::from(EXIT_INPUT)
        }
        Err(e) => {
            eprintln!("medix error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn run_triage(input: PatientInput, runtime: &RuntimeArgs) -> MedixResult<()> {
    check_symptoms(&input.symptoms)?;
    let rulebook = load_rulebook(runtime.rules.as_deref())?;
    let pipeline = build_pipeline(runtime, &rulebook)?;
    let report = pipeline.run_triage(&input).await;
    print_json(&report)
}

async fn run_diagnose(input: PatientInput, runtime: &RuntimeArgs) -> MedixResult<()> {
    let rulebook = load_rulebook(runtime.rules.as_deref())?;
    check_diagnose_intake(&RuleSafetyGate::from_rulebook(&rulebook)?, &input)?;
    let pipeline = build_pipeline(runtime, &rulebook)?;
    let report = pipeline.run_diagnose(&input).await;
    print_json(&report)
}

fn run_health(providers: Option<&Path>) -> MedixResult<()> {
    let config = load_providers(providers)?;
    print_json(&HealthReport::collect(&config, true))
}

async fn run_eval_cases(cases: Option<&Path>, runtime: &RuntimeArgs) -> MedixResult<()> {
    let cases = match cases {
        Some(path) => load_cases(path)?,
        None => builtin_cases()?,
    };
    let rulebook = load_rulebook(runtime.rules.as_deref())?;
    let pipeline = build_pipeline(runtime, &rulebook)?;
    let report = run_eval(&pipeline, &cases).await;
    print_json(&report)
}

// ── Demo dispatch ─────────────────────────────────────────────────────────────

async fn run_demo(scenario: Scenario) -> MedixResult<()> {
    print_banner();

    match scenario {
        Scenario::RunAll => {
            emergency::run_scenario().await?;
            headache::run_scenario().await?;
            truncated_repair::run_scenario().await?;
            exhaustion::run_scenario().await?;
            pregnancy::run_scenario().await?;
            denylist::run_scenario().await?;
        }
        Scenario::Emergency => emergency::run_scenario().await?,
        Scenario::Headache => headache::run_scenario().await?,
        Scenario::TruncatedRepair => truncated_repair::run_scenario().await?,
        Scenario::Exhaustion => exhaustion::run_scenario().await?,
        Scenario::Pregnancy => pregnancy::run_scenario().await?,
        Scenario::Denylist => denylist::run_scenario().await?,
    }

    println!("All selected scenarios completed successfully.");
    Ok(())
}

// ── Wiring ────────────────────────────────────────────────────────────────────

fn load_providers(path: Option<&Path>) -> MedixResult<ProvidersConfig> {
    match path {
        Some(path) => ProvidersConfig::from_file(path),
        None => ProvidersConfig::builtin(),
    }
}

fn load_rulebook(path: Option<&Path>) -> MedixResult<Rulebook> {
    match path {
        Some(path) => Rulebook::from_file(path),
        None => Rulebook::builtin(),
    }
}

fn build_pipeline(runtime: &RuntimeArgs, rulebook: &Rulebook) -> MedixResult<Pipeline> {
    let config = load_providers(runtime.providers.as_deref())?;

    let pipeline = Pipeline::new(
        Box::new(RuleSafetyGate::from_rulebook(rulebook)?),
        config.build_chain(),
        Box::new(SchemaVerifier::new()),
        Box::new(DenylistFilter::from_rulebook(rulebook)?),
    )
    .with_retriever(Box::new(ReferenceLibrary::builtin()))
    .with_reference_limit(runtime.references);

    let pipeline = match config.repair_backend() {
        Some(backend) => pipeline.with_repair_backend(backend),
        None => pipeline,
    };
    debug!(backends = ?pipeline.providers().slots(), "provider chain ready");
    Ok(pipeline)
}

fn print_json<T: Serialize>(value: &T) -> MedixResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| MedixError::ConfigError {
        reason: format!("failed to serialize output: {}", e),
    })?;
    println!("{}", json);
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("MEDIX - Structured Triage Runtime");
    println!("Offline Demo Scenarios");
    println!("=================================");
    println!();
    println!("MEDIX pipeline per request:");
    println!("  [1] Safety gate: emergency patterns, pregnancy and age tiers");
    println!("  [2] Provider chain: primary → secondary → tertiary, one attempt each");
    println!("  [3] Extractor recovers JSON from fenced, chatty or truncated output");
    println!("  [4] Schema validation; one low-temperature repair call on failure");
    println!("  [5] Denylist scrub of prescription-only medicines");
    println!("  [6] Deterministic safe default when nothing validates");
    println!();
}
