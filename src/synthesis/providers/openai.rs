use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionFuture, CompletionRequest, GenerationError};

const DEFAULT_BASE: &str = "https://api.openai.com";

const SYSTEM_PROMPT: &str = "You explain U.S. legislation in plain language using only the documents provided. Cite document identifiers and never invent references.";

/// OpenAI-compatible chat completions client
pub struct OpenAiClient {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl OpenAiClient {
    pub fn new(
        api_key: String,
        model: String,
        api_base: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(format!("failed to build OpenAI HTTP client: {}", e)))?;
        let base = api_base.unwrap_or_else(|| DEFAULT_BASE.to_string());
        Ok(Self {
            api_key,
            model,
            endpoint: format!("{}/v1/chat/completions", base.trim_end_matches('/')),
            client,
        })
    }
}

impl CompletionClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_> {
        Box::pin(async move {
            let mut headers = HeaderMap::new();
            let auth = format!("Bearer {}", self.api_key.trim());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth)
                    .map_err(|_| GenerationError::MissingApiKey("invalid OpenAI API key".to_string()))?,
            );
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

            let body = ChatRequest {
                model: &self.model,
                temperature: request.temperature,
                max_tokens: request.max_tokens,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: SYSTEM_PROMPT,
                    },
                    ChatMessage {
                        role: "user",
                        content: &request.prompt,
                    },
                ],
            };

            let resp = self
                .client
                .post(&self.endpoint)
                .headers(headers)
                .json(&body)
                .send()
                .await?;

            if !resp.status().is_success() {
                let status = resp.status().as_u16();
                let body = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "<body unavailable>".to_string());
                return Err(GenerationError::Http { status, body });
            }

            let parsed: ChatResponse = resp
                .json()
                .await
                .map_err(|e| GenerationError::Malformed(e.to_string()))?;

            parsed
                .choices
                .into_iter()
                .find_map(|choice| choice.message.content)
                .ok_or_else(|| GenerationError::Malformed("no choices in response".to_string()))
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}
