//! Triage result contract.
//!
//! The serde defaults on these types are the single authoritative definition
//! of what an absent optional field becomes. The validator relies on them and
//! nothing else re-implements them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::provider::ProviderUsed;

/// Urgency classification, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Emergency,
    Urgent,
    Routine,
    SelfCare,
}

impl Urgency {
    /// All variants in wire form, in severity order.
    pub const ALL: [&'static str; 4] = ["EMERGENCY", "URGENT", "ROUTINE", "SELF_CARE"];
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Urgency::Emergency => "EMERGENCY",
            Urgency::Urgent => "URGENT",
            Urgency::Routine => "ROUTINE",
            Urgency::SelfCare => "SELF_CARE",
        };
        f.write_str(label)
    }
}

pub const DEFAULT_CITATION_TITLE: &str = "Unknown Source";

fn default_citation_title() -> String {
    DEFAULT_CITATION_TITLE.to_string()
}

/// A source the model cites for its guidance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default = "default_citation_title")]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub quote: String,
}

impl Citation {
    pub fn new(title: &str, url: &str, quote: &str) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            quote: quote.to_string(),
        }
    }
}

/// The schema-valid core of a triage answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageResult {
    pub urgency: Urgency,
    #[serde(default)]
    pub red_flags: Vec<String>,
    pub summary: String,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// What `run_triage` hands back to the caller.
///
/// `provider_used` is absent when the safety gate short-circuited the request
/// before any backend was contacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageReport {
    #[serde(flatten)]
    pub result: TriageResult,
    pub safety_notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_used: Option<ProviderUsed>,
    pub repaired: bool,
    pub latency_ms: u64,
}
