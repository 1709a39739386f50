//! Offline generative backends.
//!
//! `ScriptedBackend` replays a fixed list of replies, one per call, and
//! counts how often it was called. Scenarios and tests use it wherever a real
//! provider would sit.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use medix_contracts::{
    error::{MedixError, MedixResult},
    provider::GenerationOptions,
};
use medix_core::traits::Generator;

pub struct ScriptedBackend {
    name: String,
    replies: Mutex<VecDeque<MedixResult<String>>>,
    calls: Arc<Mutex<u32>>,
}

impl ScriptedBackend {
    /// A backend that answers with `replies` in order, then fails.
    pub fn sequence(name: impl Into<String>, replies: Vec<MedixResult<String>>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(replies.into()),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// A backend that answers once with `reply`.
    pub fn replying(name: impl Into<String>, reply: impl Into<String>) -> Self {
        Self::sequence(name, vec![Ok(reply.into())])
    }

    /// A backend that is never reachable.
    pub fn unreachable(name: impl Into<String>) -> Self {
        Self::sequence(name, Vec::new())
    }

    /// Shared handle to the call counter; stays valid after the backend is
    /// moved into a chain.
    pub fn call_counter(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.calls)
    }
}

/// Read a counter handed out by `ScriptedBackend::call_counter`.
pub fn calls(counter: &Arc<Mutex<u32>>) -> u32 {
    counter.lock().map(|n| *n).unwrap_or(0)
}

#[async_trait]
impl Generator for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _options: &GenerationOptions,
    ) -> MedixResult<String> {
        if let Ok(mut n) = self.calls.lock() {
            *n += 1;
        }
        let next = self.replies.lock().ok().and_then(|mut replies| replies.pop_front());
        next.unwrap_or_else(|| {
            Err(MedixError::ProviderFailed {
                provider: self.name.clone(),
                reason: "connection refused (scripted)".to_string(),
            })
        })
    }
}
