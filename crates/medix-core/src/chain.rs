//! The provider fallback chain.
//!
//! Backends are tried strictly in priority order, one at a time, each at most
//! once per logical call and each under its own timeout. The first backend to
//! return non-empty text wins. When none does, the chain reports exhaustion as
//! a value; callers answer with a deterministic fallback result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use medix_contracts::{
    error::MedixError,
    provider::{GenerationOptions, ProviderCallRecord, ProviderSlot},
};

use crate::traits::Generator;

/// Per-backend time budget when none is configured.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(15);

/// A successful completion and how it was obtained.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub slot: ProviderSlot,
    pub provider_name: String,
    /// Every attempt made for this call, failures first, the winner last.
    pub records: Vec<ProviderCallRecord>,
}

/// Result of one pass over the chain.
#[derive(Debug, Clone)]
pub enum ChainOutcome {
    Completed(Completion),
    /// Every configured backend failed, or none was configured.
    Exhausted { records: Vec<ProviderCallRecord> },
}

/// Ordered set of interchangeable backends.
#[derive(Clone)]
pub struct ProviderChain {
    backends: Vec<(ProviderSlot, Arc<dyn Generator>)>,
    timeout: Duration,
}

impl ProviderChain {
    /// An empty chain. Calling `complete` on it reports exhaustion.
    pub fn new(timeout: Duration) -> Self {
        Self { backends: Vec::new(), timeout }
    }

    /// Install `backend` in `slot`, replacing any previous occupant.
    pub fn with_backend(mut self, slot: ProviderSlot, backend: Arc<dyn Generator>) -> Self {
        self.backends.retain(|(existing, _)| *existing != slot);
        self.backends.push((slot, backend));
        self.backends.sort_by_key(|(slot, _)| *slot);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Configured slots in the order they will be tried.
    pub fn slots(&self) -> Vec<ProviderSlot> {
        self.backends.iter().map(|(slot, _)| *slot).collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one logical completion across the chain.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> ChainOutcome {
        let mut records = Vec::with_capacity(self.backends.len());

        if self.backends.is_empty() {
            warn!("no generative backends configured");
            return ChainOutcome::Exhausted { records };
        }

        for (attempt, (slot, backend)) in self.backends.iter().enumerate() {
            let provider = backend.name().to_string();
            debug!(provider = %provider, slot = %slot, attempt, "calling backend");

            let started = Instant::now();
            let result = match tokio::time::timeout(
                self.timeout,
                backend.generate(system_prompt, user_prompt, options),
            )
            .await
            {
                Ok(Ok(text)) if text.trim().is_empty() => Err(MedixError::ResponseParsing {
                    provider: provider.clone(),
                    reason: "empty completion".to_string(),
                }),
                Ok(result) => result,
                Err(_) => Err(MedixError::ProviderTimeout {
                    provider: provider.clone(),
                    after_ms: self.timeout.as_millis() as u64,
                }),
            };
            let latency_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(text) => {
                    let record = ProviderCallRecord {
                        provider_name: provider.clone(),
                        latency_ms,
                        success: true,
                        used_fallback: attempt > 0,
                        error: None,
                    };
                    log_call(&record);
                    records.push(record);
                    return ChainOutcome::Completed(Completion {
                        text,
                        slot: *slot,
                        provider_name: provider,
                        records,
                    });
                }
                Err(e) => {
                    let record = ProviderCallRecord {
                        provider_name: provider,
                        latency_ms,
                        success: false,
                        used_fallback: attempt > 0,
                        error: Some(e.to_string()),
                    };
                    log_call(&record);
                    records.push(record);
                }
            }
        }

        warn!(attempts = records.len(), "all generative backends failed");
        ChainOutcome::Exhausted { records }
    }
}

/// Emit one structured log line per backend attempt.
pub fn log_call(record: &ProviderCallRecord) {
    if record.success {
        info!(
            provider = %record.provider_name,
            latency_ms = record.latency_ms,
            used_fallback = record.used_fallback,
            "backend call succeeded"
        );
    } else {
        warn!(
            provider = %record.provider_name,
            latency_ms = record.latency_ms,
            used_fallback = record.used_fallback,
            error = record.error.as_deref().unwrap_or(""),
            "backend call failed"
        );
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
