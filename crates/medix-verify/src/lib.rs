//! # medix-verify
//!
//! Output verification for the MEDIX pipeline.
//!
//! [`SchemaVerifier`] implements [`Verifier`](medix_core::traits::Verifier):
//! [`extract_json`] recovers a JSON object from raw model text, and
//! validation checks it structurally against a JSON Schema before handing it
//! to the typed contracts in medix-contracts.

pub mod engine;
pub mod extract;
pub mod schema;

pub use engine::SchemaVerifier;
pub use extract::extract_json;

// ── Tests ─────────────────────────────────────────────────────────────────────
