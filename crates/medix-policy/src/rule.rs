//! Rulebook types and configuration schema.
//!
//! A `Rulebook` is deserialized from TOML and holds every deterministic
//! safety table the pipeline uses: emergency detectors, the pregnancy rule,
//! age tiers, and the medicine denylist. The built-in rulebook ships with the
//! crate; operators may load a replacement file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use medix_contracts::error::{MedixError, MedixResult};

const BUILTIN_RULEBOOK: &str = include_str!("../rules/default.toml");

/// A symptom pattern that signals an emergency.
///
/// Example in TOML:
/// ```toml
/// [[emergency]]
/// id = "seizure"
/// pattern = '(?:seizure|convulsion|fitting)'
/// reason = "Seizure activity — requires emergency evaluation"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyRule {
    /// Stable identifier used in logs.
    pub id: String,

    /// Regex matched case-insensitively against the symptom text.
    pub pattern: String,

    /// Appended to `SafetyAssessment::warnings` when the pattern matches.
    pub reason: String,
}

/// What to do when the patient reports a pregnancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PregnancyRule {
    /// Withhold medicine suggestions.
    #[serde(default = "default_true")]
    pub blocks: bool,
    pub note: String,
}

impl Default for PregnancyRule {
    fn default() -> Self {
        Self {
            blocks: true,
            note: "Patient is pregnant. Please consult your OB/GYN or healthcare provider.".to_string(),
        }
    }
}

/// An age band with its safety note.
///
/// A tier matches when every bound it sets holds: `age < below_years` and
/// `age > above_years`. Tiers are tested in declaration order and the first
/// match wins, so later tiers only see ages earlier tiers let through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeTier {
    pub id: String,

    #[serde(default)]
    pub below_years: Option<u32>,

    #[serde(default)]
    pub above_years: Option<u32>,

    /// Withhold medicine suggestions for this tier.
    #[serde(default)]
    pub blocks: bool,

    pub note: String,
}

impl AgeTier {
    /// Return true if `age` falls inside this tier's bounds.
    ///
    /// A tier with no bounds matches every known age.
    pub fn matches(&self, age: u32) -> bool {
        let under = self.below_years.map_or(true, |limit| age < limit);
        let over = self.above_years.map_or(true, |limit| age > limit);
        under && over
    }
}

/// A disallowed medicine class.
///
/// `unless` carves an exemption out of `pattern`; an entry only fires when
/// `pattern` matches and `unless` does not.
///
/// Example in TOML:
/// ```toml
/// [[denylist]]
/// id = "systemic-steroid"
/// pattern = '(?:steroid|prednisolone)'
/// unless = '(?:topical|cream|ointment)'
/// reason = "systemic steroids require a prescription"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenylistRule {
    pub id: String,
    pub pattern: String,
    #[serde(default)]
    pub unless: Option<String>,
    pub reason: String,
}

/// Normalization applied to medicines that survive the denylist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFilterConfig {
    /// Replaces an empty or blank `warning`.
    pub default_warning: String,

    /// Written to every survivor's `type`.
    pub guidance_label: String,
}

impl Default for PostFilterConfig {
    fn default() -> Self {
        Self {
            default_warning:
                "Consult a healthcare professional before use. This is general OTC guidance only."
                    .to_string(),
            guidance_label: "OTC Guidance".to_string(),
        }
    }
}

/// The top-level structure deserialized from a TOML rulebook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rulebook {
    #[serde(default)]
    pub emergency: Vec<EmergencyRule>,

    #[serde(default)]
    pub pregnancy: PregnancyRule,

    /// Ordered age tiers. First match wins.
    #[serde(default)]
    pub age_tiers: Vec<AgeTier>,

    #[serde(default)]
    pub denylist: Vec<DenylistRule>,

    #[serde(default)]
    pub post_filter: PostFilterConfig,
}

impl Rulebook {
    /// The rulebook compiled into this crate.
    pub fn builtin() -> MedixResult<Self> {
        Self::from_toml_str(BUILTIN_RULEBOOK)
    }

    /// Parse `s` as a TOML rulebook.
    ///
    /// Returns `MedixError::ConfigError` if the TOML is malformed or does not
    /// match the expected schema. Patterns are not compiled here.
    pub fn from_toml_str(s: &str) -> MedixResult<Self> {
        toml::from_str(s).map_err(|e| MedixError::ConfigError {
            reason: format!("failed to parse rulebook TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as a TOML rulebook.
    pub fn from_file(path: &Path) -> MedixResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| MedixError::ConfigError {
            reason: format!("failed to read rulebook '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }
}

fn default_true() -> bool {
    true
}
