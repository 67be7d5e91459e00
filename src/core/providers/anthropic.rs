//! Anthropic provider implementation

use crate::core::constants::sse;
use crate::core::provider::{CompletionRequest, Provider, ProviderError, TextDeltaStream};
use crate::models::chat::ChatRole;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio_stream::wrappers::LinesStream;
use tracing::warn;

/// Messages API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API streaming provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    ///
    /// # Arguments
    ///
    /// * `api_key` - Anthropic API key
    /// * `base_url` - API base URL (default: https://api.anthropic.com)
    /// * `model` - Model name to request
    /// * `timeout` - Request timeout in seconds
    pub fn new(api_key: String, base_url: String, model: String, timeout: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url,
            model,
        }
    }

    /// Classify Anthropic errors and provide helpful messages
    fn classify_error(error_detail: &str) -> String {
        let error_lower = error_detail.to_lowercase();

        if error_lower.contains("authentication_error") || error_lower.contains("invalid x-api-key")
        {
            return "Invalid API key. Please check your Anthropic api_key configuration."
                .to_string();
        }

        if error_lower.contains("rate_limit_error") || error_lower.contains("rate limit") {
            return "Rate limit exceeded. Please wait and try again.".to_string();
        }

        if error_lower.contains("overloaded_error") {
            return "Anthropic API is temporarily overloaded. Please retry shortly.".to_string();
        }

        if error_lower.contains("credit") || error_lower.contains("billing") {
            return "Billing issue. Please check your Anthropic account credit balance."
                .to_string();
        }

        error_detail.to_string()
    }

    /// Build the Messages API request body
    ///
    /// System-role messages are folded into the top-level system prompt; the
    /// Messages API only accepts user/assistant turns in `messages`.
    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        let mut system = request.system_prompt.clone();
        let mut messages = Vec::new();

        for message in &request.messages {
            match message.role {
                ChatRole::System => {
                    system.push_str("\n\n");
                    system.push_str(&message.content);
                }
                ChatRole::User | ChatRole::Assistant => {
                    messages.push(json!({
                        "role": message.role,
                        "content": message.content,
                    }));
                }
            }
        }

        json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "stream": true,
            "system": system,
            "messages": messages,
        })
    }

    /// Internal method to send the streaming request
    async fn send_stream_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.build_request_body(request))
            .send()
            .await
            .map_err(|e| ProviderError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let classified_error = Self::classify_error(&error_text);

            return Err(match status.as_u16() {
                401 => ProviderError::Authentication(classified_error),
                429 => ProviderError::RateLimit(classified_error),
                400 => ProviderError::BadRequest(classified_error),
                _ => ProviderError::ApiError {
                    status: status.as_u16(),
                    message: classified_error,
                },
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn stream_text(
        &self,
        request: CompletionRequest,
    ) -> Result<TextDeltaStream, ProviderError> {
        let response = self.send_stream_request(&request).await?;

        use futures_util::TryStreamExt;
        use tokio::io::AsyncBufReadExt;

        let byte_stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));

        let reader = tokio_util::io::StreamReader::new(byte_stream);
        let buf_reader = tokio::io::BufReader::new(reader);
        let lines = buf_reader.lines();
        let mut line_stream = Box::pin(LinesStream::new(lines));

        let stream = async_stream::stream! {
            while let Some(line_result) = line_stream.next().await {
                let line = match line_result {
                    Ok(l) => l,
                    Err(e) => {
                        yield Err(ProviderError::Unexpected(e.to_string()));
                        break;
                    }
                };

                let trimmed = line.trim();
                let Some(chunk_data) = trimmed.strip_prefix(sse::DATA_PREFIX) else {
                    continue;
                };

                let event: Value = match serde_json::from_str(chunk_data) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!("Failed to parse chunk: {}, error: {}", chunk_data, e);
                        continue;
                    }
                };

                match event.get("type").and_then(|t| t.as_str()) {
                    Some(sse::CONTENT_BLOCK_DELTA) => {
                        if let Some(text) =
                            event.pointer("/delta/text").and_then(|t| t.as_str())
                        {
                            if !text.is_empty() {
                                yield Ok(text.to_string());
                            }
                        }
                    }
                    Some(sse::ERROR) => {
                        let message = event
                            .pointer("/error/message")
                            .and_then(|m| m.as_str())
                            .unwrap_or("unknown upstream error");
                        yield Err(ProviderError::Unexpected(message.to_string()));
                        break;
                    }
                    Some(sse::MESSAGE_STOP) => break,
                    _ => {}
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &str {
        "Anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ChatMessage;

    #[test]
    fn test_classify_auth_error() {
        let error = r#"{"type":"error","error":{"type":"authentication_error"}}"#;
        let result = AnthropicProvider::classify_error(error);
        assert!(result.contains("API key"));
    }

    #[test]
    fn test_classify_overloaded_error() {
        let error = r#"{"type":"error","error":{"type":"overloaded_error"}}"#;
        let result = AnthropicProvider::classify_error(error);
        assert!(result.contains("overloaded"));
    }

    #[test]
    fn test_system_messages_fold_into_system_prompt() {
        let provider = AnthropicProvider::new(
            "sk-ant-test".to_string(),
            "https://api.anthropic.com".to_string(),
            "claude-sonnet-4-20250514".to_string(),
            300,
        );

        let request = CompletionRequest {
            system_prompt: "base prompt".to_string(),
            messages: vec![
                ChatMessage {
                    role: ChatRole::System,
                    content: "prior session context".to_string(),
                },
                ChatMessage {
                    role: ChatRole::User,
                    content: "make a widget".to_string(),
                },
            ],
            max_tokens: 8192,
        };

        let body = provider.build_request_body(&request);
        let system = body["system"].as_str().unwrap();
        assert!(system.starts_with("base prompt"));
        assert!(system.contains("prior session context"));

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(body["stream"], true);
    }
}
