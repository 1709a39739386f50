//! Google Gemini `generateContent` backend.
//!
//! Gemini takes a single prompt, so the system and user prompts are joined
//! with a blank line. The key travels as a query parameter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use medix_contracts::{
    error::{MedixError, MedixResult},
    provider::GenerationOptions,
};
use medix_core::traits::Generator;

use crate::http::{read_success_body, send_error};

#[derive(Debug, Serialize)]
pub(crate) struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

pub(crate) fn build_request(
    system_prompt: &str,
    user_prompt: &str,
    options: &GenerationOptions,
) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![Part { text: format!("{system_prompt}\n\n{user_prompt}") }],
        }],
        generation_config: GenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_tokens,
            response_mime_type: options.json_mode.then_some("application/json"),
        },
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a response body.
pub(crate) fn parse_response(provider: &str, body: &str) -> MedixResult<String> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| MedixError::ResponseParsing {
            provider: provider.to_string(),
            reason: format!("malformed generateContent envelope: {e}"),
        })?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| MedixError::ResponseParsing {
            provider: provider.to_string(),
            reason: "response has no candidates[0].content.parts[0].text".to_string(),
        })
}

pub struct GeminiBackend {
    client: reqwest::Client,
    name: String,
    model: String,
    /// Base models URL; the model and method are appended per call.
    endpoint: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            name: name.into(),
            model: model.into(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model)
    }
}

#[async_trait]
impl Generator for GeminiBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> MedixResult<String> {
        let request = build_request(system_prompt, user_prompt, options);
        debug!(provider = %self.name, model = %self.model, "sending generateContent request");

        let resp = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error(&self.name, e))?;

        let body = read_success_body(&self.name, resp).await?;
        parse_response(&self.name, &body)
    }
}
