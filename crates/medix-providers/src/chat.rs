//! OpenAI-compatible chat completions backend (Groq, SambaNova, ...).

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
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub(crate) fn build_request<'a>(
    model: &'a str,
    system_prompt: &'a str,
    user_prompt: &'a str,
    options: &GenerationOptions,
) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![
            ChatMessage { role: "system", content: system_prompt },
            ChatMessage { role: "user", content: user_prompt },
        ],
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        response_format: options.json_mode.then_some(ResponseFormat { kind: "json_object" }),
    }
}

/// Pull `choices[0].message.content` out of a response body.
pub(crate) fn parse_response(provider: &str, body: &str) -> MedixResult<String> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| MedixError::ResponseParsing {
            provider: provider.to_string(),
            reason: format!("malformed chat completion envelope: {e}"),
        })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| MedixError::ResponseParsing {
            provider: provider.to_string(),
            reason: "response has no choices[0].message.content".to_string(),
        })
}

/// A backend speaking the OpenAI chat completions protocol with bearer auth.
pub struct ChatCompletionsBackend {
    client: reqwest::Client,
    name: String,
    model: String,
    endpoint: String,
    api_key: String,
}

impl ChatCompletionsBackend {
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
}

#[async_trait]
impl Generator for ChatCompletionsBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> MedixResult<String> {
        let request = build_request(&self.model, system_prompt, user_prompt, options);
        debug!(provider = %self.name, model = %self.model, "sending chat completion request");

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error(&self.name, e))?;

        let body = read_success_body(&self.name, resp).await?;
        parse_response(&self.name, &body)
    }
}
