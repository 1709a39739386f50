//! Error types for the MEDIX pipeline.
//!
//! Only input errors and configuration errors ever reach a caller. Provider,
//! parsing and retrieval errors are recovered inside the pipeline and show up
//! as provenance (`providerUsed`, `repaired`) and log records instead.

use thiserror::Error;

/// The unified error type for the MEDIX crates.
#[derive(Debug, Error)]
pub enum MedixError {
    /// The patient input cannot be triaged as given.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A backend returned an error, a non-2xx status, or could not be reached.
    #[error("provider '{provider}' failed: {reason}")]
    ProviderFailed { provider: String, reason: String },

    /// A backend did not answer within its time budget.
    #[error("provider '{provider}' timed out after {after_ms}ms")]
    ProviderTimeout { provider: String, after_ms: u64 },

    /// A backend has no usable credentials.
    #[error("provider '{provider}' is not configured")]
    ProviderNotConfigured { provider: String },

    /// A backend answered with an envelope we could not read.
    #[error("could not parse response from '{provider}': {reason}")]
    ResponseParsing { provider: String, reason: String },

    /// The reference retrieval collaborator failed.
    #[error("reference retrieval failed: {reason}")]
    Retrieval { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A schema document could not be compiled or applied.
    #[error("schema validation error: {reason}")]
    SchemaValidation { reason: String },
}

/// Convenience alias used throughout the MEDIX crates.
pub type MedixResult<T> = Result<T, MedixError>;
