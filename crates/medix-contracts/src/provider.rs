//! Generative backend call types.
//!
//! These describe a call to a text-generation backend and its provenance. The
//! backends themselves live in `medix-providers`; the fallback chain that
//! orders them lives in `medix-core`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sampling options forwarded to every backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the backend for a JSON object response when it supports it.
    pub json_mode: bool,
}

impl GenerationOptions {
    /// Settings for the main triage/diagnose completion.
    pub const fn structured() -> Self {
        Self { temperature: 0.3, max_tokens: 2048, json_mode: true }
    }

    /// Settings for the single repair completion.
    pub const fn repair() -> Self {
        Self { temperature: 0.1, max_tokens: 2048, json_mode: true }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::structured()
    }
}

/// Position of a backend in the fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSlot {
    Primary,
    Secondary,
    Tertiary,
}

impl ProviderSlot {
    /// Slots in priority order.
    pub const ORDER: [ProviderSlot; 3] =
        [ProviderSlot::Primary, ProviderSlot::Secondary, ProviderSlot::Tertiary];
}

impl fmt::Display for ProviderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProviderSlot::Primary => "primary",
            ProviderSlot::Secondary => "secondary",
            ProviderSlot::Tertiary => "tertiary",
        };
        f.write_str(label)
    }
}

/// Provenance of the core result returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderUsed {
    Primary,
    Secondary,
    Tertiary,
    /// Every backend failed, or the output could not be validated or repaired.
    DeterministicFallback,
}

impl From<ProviderSlot> for ProviderUsed {
    fn from(slot: ProviderSlot) -> Self {
        match slot {
            ProviderSlot::Primary => ProviderUsed::Primary,
            ProviderSlot::Secondary => ProviderUsed::Secondary,
            ProviderSlot::Tertiary => ProviderUsed::Tertiary,
        }
    }
}

/// One attempt against one backend. Logged, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCallRecord {
    pub provider_name: String,
    pub latency_ms: u64,
    pub success: bool,
    /// True for any backend after the first in the chain.
    pub used_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A reference document returned by the retrieval collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDoc {
    pub title: String,
    pub url: String,
    pub excerpt: String,
}
