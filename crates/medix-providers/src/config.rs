//! Backend configuration.
//!
//! A `ProvidersConfig` names up to three fallback slots and an optional
//! repair backend. Credentials never appear in the file; each backend names
//! the environment variable its key is read from.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use medix_contracts::{
    error::{MedixError, MedixResult},
    provider::ProviderSlot,
};
use medix_core::{chain::ProviderChain, traits::Generator};

use crate::chat::ChatCompletionsBackend;
use crate::gemini::GeminiBackend;

const BUILTIN_PROVIDERS: &str = include_str!("../providers.toml");

/// Values that show up in copied `.env` templates and mean "not set".
const PLACEHOLDER_MARKERS: [&str; 3] = ["your_", "_here", "placeholder"];

/// Which wire protocol a backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    ChatCompletions,
    Gemini,
}

/// One backend entry.
///
/// Example in TOML:
/// ```toml
/// [primary]
/// kind = "chat-completions"
/// name = "groq"
/// model = "llama-3.3-70b-versatile"
/// endpoint = "https://api.groq.com/openai/v1/chat/completions"
/// api_key_env = "GROQ_API_KEY"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub name: String,
    pub model: String,
    pub endpoint: String,
    pub api_key_env: String,
}

impl BackendConfig {
    /// The usable API key, if `lookup` yields one that is not a placeholder.
    pub fn api_key(&self, lookup: &dyn Fn(&str) -> Option<String>) -> Option<String> {
        lookup(&self.api_key_env)
            .map(|key| key.trim().to_string())
            .filter(|key| !is_placeholder(key))
    }

    /// Build the backend, or `ProviderNotConfigured` when its key is unset.
    pub fn connect(&self, lookup: &dyn Fn(&str) -> Option<String>) -> MedixResult<Arc<dyn Generator>> {
        let api_key = self.api_key(lookup).ok_or_else(|| MedixError::ProviderNotConfigured {
            provider: self.name.clone(),
        })?;
        Ok(self.build(api_key))
    }

    fn build(&self, api_key: String) -> Arc<dyn Generator> {
        match self.kind {
            BackendKind::ChatCompletions => Arc::new(ChatCompletionsBackend::new(
                &self.name,
                &self.model,
                &self.endpoint,
                api_key,
            )),
            BackendKind::Gemini => {
                Arc::new(GeminiBackend::new(&self.name, &self.model, &self.endpoint, api_key))
            }
        }
    }
}

/// Empty keys and template placeholders count as unset.
pub fn is_placeholder(key: &str) -> bool {
    let lower = key.trim().to_ascii_lowercase();
    lower.is_empty() || PLACEHOLDER_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn default_timeout_secs() -> u64 {
    15
}

/// The top-level structure deserialized from a providers TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Per-backend time budget, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub primary: Option<BackendConfig>,

    #[serde(default)]
    pub secondary: Option<BackendConfig>,

    #[serde(default)]
    pub tertiary: Option<BackendConfig>,

    /// Fixed backend for the single repair attempt.
    #[serde(default)]
    pub repair: Option<BackendConfig>,
}

impl ProvidersConfig {
    /// The configuration compiled into this crate (Groq, SambaNova, Gemini).
    pub fn builtin() -> MedixResult<Self> {
        Self::from_toml_str(BUILTIN_PROVIDERS)
    }

    pub fn from_toml_str(s: &str) -> MedixResult<Self> {
        toml::from_str(s).map_err(|e| MedixError::ConfigError {
            reason: format!("failed to parse providers TOML: {}", e),
        })
    }

    pub fn from_file(path: &Path) -> MedixResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| MedixError::ConfigError {
            reason: format!("failed to read providers file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The entry configured for `slot`, credentials aside.
    pub fn slot(&self, slot: ProviderSlot) -> Option<&BackendConfig> {
        match slot {
            ProviderSlot::Primary => self.primary.as_ref(),
            ProviderSlot::Secondary => self.secondary.as_ref(),
            ProviderSlot::Tertiary => self.tertiary.as_ref(),
        }
    }

    /// Build the fallback chain from slots whose keys resolve via `lookup`.
    pub fn build_chain_with(&self, lookup: &dyn Fn(&str) -> Option<String>) -> ProviderChain {
        let mut chain = ProviderChain::new(self.timeout());
        for slot in ProviderSlot::ORDER {
            let Some(entry) = self.slot(slot) else {
                continue;
            };
            match entry.connect(lookup) {
                Ok(backend) => {
                    info!(slot = %slot, provider = %entry.name, model = %entry.model, "backend configured");
                    chain = chain.with_backend(slot, backend);
                }
                Err(e) => {
                    warn!(slot = %slot, error = %e, env = %entry.api_key_env, "backend skipped");
                }
            }
        }
        chain
    }

    /// Build the fallback chain from the process environment.
    pub fn build_chain(&self) -> ProviderChain {
        self.build_chain_with(&env_lookup)
    }

    /// The repair backend, if configured and keyed via `lookup`.
    pub fn repair_backend_with(
        &self,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Option<Arc<dyn Generator>> {
        let entry = self.repair.as_ref()?;
        match entry.connect(lookup) {
            Ok(backend) => Some(backend),
            Err(e) => {
                debug!(error = %e, "repair backend unavailable");
                None
            }
        }
    }

    pub fn repair_backend(&self) -> Option<Arc<dyn Generator>> {
        self.repair_backend_with(&env_lookup)
    }
}

/// Read a variable from the process environment.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use medix_contracts::{error::MedixError, provider::ProviderSlot};

    use super::{is_placeholder, BackendKind, ProvidersConfig};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_builtin_order_and_defaults() {
        let config = ProvidersConfig::builtin().unwrap();
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.primary.as_ref().unwrap().name, "groq");
        assert_eq!(config.secondary.as_ref().unwrap().name, "sambanova");
        let tertiary = config.tertiary.as_ref().unwrap();
        assert_eq!(tertiary.kind, BackendKind::Gemini);
        assert_eq!(tertiary.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("  "));
        assert!(is_placeholder("your_sambanova_api_key_here"));
        assert!(!is_placeholder("gsk_live_abc123"));
    }

    #[test]
    fn test_chain_skips_unkeyed_slots() {
        let config = ProvidersConfig::builtin().unwrap();
        let lookup = lookup_from(&[
            ("GROQ_API_KEY", "gsk_live_abc123"),
            ("SAMBANOVA_API_KEY", "your_sambanova_api_key_here"),
            ("GEMINI_API_KEY", "AIza-test"),
        ]);

        let chain = config.build_chain_with(&lookup);
        assert_eq!(chain.slots(), vec![ProviderSlot::Primary, ProviderSlot::Tertiary]);
        assert!(config.repair_backend_with(&lookup).is_some());
    }

    #[test]
    fn test_unkeyed_backend_is_not_configured() {
        let config = ProvidersConfig::builtin().unwrap();
        let secondary = config.slot(ProviderSlot::Secondary).unwrap();
        let lookup = lookup_from(&[("SAMBANOVA_API_KEY", "your_sambanova_api_key_here")]);

        match secondary.connect(&lookup) {
            Err(MedixError::ProviderNotConfigured { provider }) => assert_eq!(provider, "sambanova"),
            Err(other) => panic!("expected ProviderNotConfigured, got {:?}", other),
            Ok(_) => panic!("placeholder key must not build a backend"),
        }

        let lookup = lookup_from(&[("SAMBANOVA_API_KEY", "sn-live-1")]);
        assert_eq!(secondary.connect(&lookup).unwrap().name(), "sambanova");
    }

    #[test]
    fn test_no_keys_yields_empty_chain() {
        let config = ProvidersConfig::builtin().unwrap();
        let lookup = lookup_from(&[]);
        assert!(config.build_chain_with(&lookup).is_empty());
        assert!(config.repair_backend_with(&lookup).is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let toml = r#"
            [primary]
            kind = "gemini"
            name = "gemini"
            model = "gemini-1.5-pro"
            endpoint = "https://generativelanguage.googleapis.com/v1beta/models"
            api_key_env = "MY_GEMINI_KEY"
        "#;
        let config = ProvidersConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.timeout_secs, 15);
        assert!(config.secondary.is_none());
        assert!(config.repair.is_none());

        let chain = config.build_chain_with(&lookup_from(&[("MY_GEMINI_KEY", "k-1")]));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_unknown_kind_is_config_error() {
        let toml = r#"
            [primary]
            kind = "carrier-pigeon"
            name = "x"
            model = "x"
            endpoint = "x"
            api_key_env = "X"
        "#;
        match ProvidersConfig::from_toml_str(toml) {
            Err(MedixError::ConfigError { reason }) => {
                assert!(reason.contains("failed to parse providers TOML"));
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }
}
