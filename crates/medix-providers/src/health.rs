//! Configuration health report.
//!
//! Reports which backends would be used if a request arrived now. It never
//! contacts a backend.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use medix_contracts::provider::ProviderSlot;

use crate::config::ProvidersConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// At least one fallback slot has a usable key.
    Healthy,
    /// No backend is usable; every request gets a deterministic fallback.
    Degraded,
}

/// Status of one fallback slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotStatus {
    pub slot: ProviderSlot,
    pub name: String,
    pub model: String,
    pub configured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub providers: Vec<SlotStatus>,
    pub active_provider_count: usize,
    pub repair_configured: bool,
    pub retrieval_available: bool,
    /// Backend names in the order they are tried.
    pub fallback_order: Vec<String>,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub version: String,
}

impl HealthReport {
    /// Inspect `config` with keys resolved through `lookup`.
    pub fn collect_with(
        config: &ProvidersConfig,
        lookup: &dyn Fn(&str) -> Option<String>,
        retrieval_available: bool,
    ) -> Self {
        let providers: Vec<SlotStatus> = ProviderSlot::ORDER
            .iter()
            .filter_map(|slot| {
                config.slot(*slot).map(|entry| SlotStatus {
                    slot: *slot,
                    name: entry.name.clone(),
                    model: entry.model.clone(),
                    configured: entry.api_key(lookup).is_some(),
                })
            })
            .collect();

        let active_provider_count = providers.iter().filter(|p| p.configured).count();
        let fallback_order = providers.iter().map(|p| p.name.clone()).collect();
        let repair_configured = config
            .repair
            .as_ref()
            .is_some_and(|entry| entry.api_key(lookup).is_some());

        Self {
            status: if active_provider_count > 0 {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            providers,
            active_provider_count,
            repair_configured,
            retrieval_available,
            fallback_order,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Inspect `config` against the process environment.
    pub fn collect(config: &ProvidersConfig, retrieval_available: bool) -> Self {
        Self::collect_with(config, &crate::config::env_lookup, retrieval_available)
    }
}
