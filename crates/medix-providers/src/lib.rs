//! # medix-providers
//!
//! Generative backends for the MEDIX provider chain.
//!
//! - [`ChatCompletionsBackend`] speaks the OpenAI chat completions protocol
//!   (Groq, SambaNova).
//! - [`GeminiBackend`] speaks Google's `generateContent`.
//! - [`ProvidersConfig`] loads slot assignments from TOML and builds a
//!   [`ProviderChain`](medix_core::ProviderChain) from the keys present in the
//!   environment.
//! - [`HealthReport`] summarizes what is configured.

pub mod chat;
pub mod config;
pub mod gemini;
pub mod health;
mod http;

pub use chat::ChatCompletionsBackend;
pub use config::{BackendConfig, BackendKind, ProvidersConfig};
pub use gemini::GeminiBackend;
pub use health::{HealthReport, HealthStatus};
