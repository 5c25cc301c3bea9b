use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionFuture, CompletionRequest, GenerationError};

const DEFAULT_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client
pub struct AnthropicClient {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl AnthropicClient {
    pub fn new(
        api_key: String,
        model: String,
        api_base: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(format!("failed to build Anthropic HTTP client: {}", e)))?;
        let base = api_base.unwrap_or_else(|| DEFAULT_BASE.to_string());
        Ok(Self {
            api_key,
            model,
            endpoint: format!("{}/v1/messages", base.trim_end_matches('/')),
            client,
        })
    }

    fn headers(&self) -> Result<HeaderMap, GenerationError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(self.api_key.trim())
                .map_err(|_| GenerationError::MissingApiKey("invalid Anthropic API key".to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl CompletionClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_> {
        Box::pin(async move {
            let body = AnthropicRequest {
                model: &self.model,
                max_tokens: request.max_tokens,
                temperature: request.temperature,
                messages: vec![AnthropicMessage {
                    role: "user",
                    content: vec![AnthropicContentBlock {
                        kind: "text",
                        text: &request.prompt,
                    }],
                }],
            };

            let resp = self
                .client
                .post(&self.endpoint)
                .headers(self.headers()?)
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

            let parsed: AnthropicResponse = resp
                .json()
                .await
                .map_err(|e| GenerationError::Malformed(e.to_string()))?;

            Ok(parsed.text())
        })
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: Vec<AnthropicContentBlock<'a>>,
}

#[derive(Serialize)]
struct AnthropicContentBlock<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicResponseBlock>,
}

impl AnthropicResponse {
    fn text(self) -> String {
        self.content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicResponseBlock::Text { text } => Some(text),
                AnthropicResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_joins_text_blocks() {
        let parsed: AnthropicResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"HR-1 passed."},{"type":"tool_use","id":"x"},{"type":"text","text":"See HR-1."}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.text(), "HR-1 passed.\nSee HR-1.");
    }

    #[test]
    fn test_endpoint_respects_api_base() {
        let client = AnthropicClient::new(
            "key".to_string(),
            "model".to_string(),
            Some("http://localhost:8080/".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.endpoint, "http://localhost:8080/v1/messages");
    }
}
