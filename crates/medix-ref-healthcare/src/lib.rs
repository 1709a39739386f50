//! # medix-ref-healthcare
//!
//! Healthcare reference runtime for the MEDIX triage pipeline.
//!
//! - [`library`]: a static WHO / NHS / MedlinePlus reference library that
//!   implements the `Retriever` trait.
//! - [`scripted`]: offline backends that replay fixed replies.
//! - [`scenarios`]: demo runs of the reliability behaviors (emergency
//!   short-circuit, truncated-output repair, provider exhaustion, pregnancy
//!   block, denylist scrub) with no network access.
//! - [`eval`]: the urgency evaluation harness.
//!
//! All patient data is fictional.

pub mod eval;
pub mod library;
pub mod scenarios;
pub mod scripted;

pub use library::ReferenceLibrary;
pub use scripted::ScriptedBackend;
