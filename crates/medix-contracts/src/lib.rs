//! # medix-contracts
//!
//! Shared types, result contracts, and errors for the MEDIX triage pipeline.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only data definitions, their defaults, and error types.

pub mod diagnose;
pub mod error;
pub mod patient;
pub mod provider;
pub mod safety;
pub mod triage;
pub mod verify;
