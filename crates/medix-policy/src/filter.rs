//! The medicine denylist.
//!
//! `DenylistFilter` is the last stage before a medicine list reaches the
//! caller. It runs on every validated list regardless of which backend
//! produced it.

use regex::Regex;
use tracing::warn;

use medix_contracts::{diagnose::Medicine, error::MedixResult};
use medix_core::traits::MedicineFilter;

use crate::engine::compile;
use crate::rule::{PostFilterConfig, Rulebook};

#[derive(Debug)]
struct DenyEntry {
    id: String,
    regex: Regex,
    unless: Option<Regex>,
}

impl DenyEntry {
    fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text) && !self.unless.as_ref().is_some_and(|u| u.is_match(text))
    }
}

/// A `MedicineFilter` backed by the rulebook's denylist.
#[derive(Debug)]
pub struct DenylistFilter {
    entries: Vec<DenyEntry>,
    post_filter: PostFilterConfig,
}

impl DenylistFilter {
    /// Compile every denylist entry in `rulebook`.
    pub fn from_rulebook(rulebook: &Rulebook) -> MedixResult<Self> {
        let entries = rulebook
            .denylist
            .iter()
            .map(|rule| {
                Ok(DenyEntry {
                    id: rule.id.clone(),
                    regex: compile(&rule.id, &rule.pattern)?,
                    unless: rule
                        .unless
                        .as_deref()
                        .map(|p| compile(&rule.id, p))
                        .transpose()?,
                })
            })
            .collect::<MedixResult<Vec<_>>>()?;

        Ok(Self {
            entries,
            post_filter: rulebook.post_filter.clone(),
        })
    }

    pub fn builtin() -> MedixResult<Self> {
        Self::from_rulebook(&Rulebook::builtin()?)
    }

    /// The id of the first entry that denies `medicine`, if any.
    pub fn denied_by(&self, medicine: &Medicine) -> Option<&str> {
        let text = format!("{} {} {}", medicine.name, medicine.formula, medicine.usage);
        self.entries
            .iter()
            .find(|entry| entry.matches(&text))
            .map(|entry| entry.id.as_str())
    }
}

impl MedicineFilter for DenylistFilter {
    fn filter(&self, medicines: Vec<Medicine>) -> Vec<Medicine> {
        medicines
            .into_iter()
            .filter(|medicine| match self.denied_by(medicine) {
                Some(rule_id) => {
                    warn!(rule_id = %rule_id, medicine = %medicine.name, "medicine removed by denylist");
                    false
                }
                None => true,
            })
            .map(|mut medicine| {
                if medicine.warning.trim().is_empty() {
                    medicine.warning = self.post_filter.default_warning.clone();
                }
                medicine.kind = self.post_filter.guidance_label.clone();
                medicine
            })
            .collect()
    }
}
