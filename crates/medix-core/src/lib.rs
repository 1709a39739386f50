//! # medix-core
//!
//! The structured-output reliability runtime for MEDIX.
//!
//! This crate provides:
//! - The trait seams (`Generator`, `Retriever`, `SafetyGate`, `Verifier`, `MedicineFilter`)
//! - The `ProviderChain` that tries generative backends in priority order
//! - The single-shot `RepairLoop`
//! - The `Pipeline` that wires them together in the correct trust order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medix_core::{Pipeline, ProviderChain};
//!
//! let pipeline = Pipeline::new(gate, chain, verifier, filter).with_repair_backend(repairer);
//! let report = pipeline.run_triage(&input).await;
//! ```

pub mod chain;
pub mod fallback;
pub mod pipeline;
pub mod prompt;
pub mod repair;
pub mod traits;

pub use chain::{ChainOutcome, Completion, ProviderChain, DEFAULT_BACKEND_TIMEOUT};
pub use pipeline::Pipeline;
pub use repair::RepairLoop;
