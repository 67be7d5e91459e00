//! OpenRouter provider implementation

use crate::core::constants::sse;
use crate::core::provider::{CompletionRequest, Provider, ProviderError, TextDeltaStream};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio_stream::wrappers::LinesStream;
use tracing::warn;

/// OpenRouter chat-completions streaming provider
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    site_url: Option<String>,
    app_name: Option<String>,
}

impl OpenRouterProvider {
    /// Create a new OpenRouter provider
    ///
    /// # Arguments
    ///
    /// * `api_key` - OpenRouter API key
    /// * `base_url` - API base URL (default: https://openrouter.ai/api/v1)
    /// * `model` - Model name to request
    /// * `timeout` - Request timeout in seconds
    /// * `site_url` - Optional site URL for OpenRouter credits
    /// * `app_name` - Optional application name
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout: u64,
        site_url: Option<String>,
        app_name: Option<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url,
            model,
            site_url,
            app_name,
        }
    }

    /// Classify OpenRouter errors and provide helpful messages
    fn classify_error(error_detail: &str) -> String {
        let error_lower = error_detail.to_lowercase();

        if error_lower.contains("invalid") && error_lower.contains("api") {
            return "Invalid API key. Please check your OpenRouter api_key configuration."
                .to_string();
        }

        if error_lower.contains("rate_limit") || error_lower.contains("quota") {
            return "Rate limit exceeded. Please wait and try again.".to_string();
        }

        if error_lower.contains("insufficient") && error_lower.contains("credits") {
            return "Insufficient credits. Please add credits to your OpenRouter account."
                .to_string();
        }

        if error_lower.contains("model")
            && (error_lower.contains("not found") || error_lower.contains("does not exist"))
        {
            return "Model not found. Please check your model configuration.".to_string();
        }

        error_detail.to_string()
    }

    /// Build the chat-completions request body
    ///
    /// The system prompt travels as the leading system-role message; the
    /// remaining turns keep their roles as-is.
    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        let mut messages = vec![json!({
            "role": "system",
            "content": request.system_prompt,
        })];

        for message in &request.messages {
            messages.push(json!({
                "role": message.role,
                "content": message.content,
            }));
        }

        json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "stream": true,
            "messages": messages,
        })
    }

    /// Internal method to send the streaming request
    async fn send_stream_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut req_builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key);

        // OpenRouter attribution headers
        if let Some(ref site_url) = self.site_url {
            req_builder = req_builder.header("HTTP-Referer", site_url);
        }
        if let Some(ref app_name) = self.app_name {
            req_builder = req_builder.header("X-Title", app_name);
        }

        let response = req_builder
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
impl Provider for OpenRouterProvider {
    async fn stream_text(
        &self,
        request: CompletionRequest,
    ) -> Result<TextDeltaStream, ProviderError> {
        let response = self.send_stream_request(&request).await?;

        use futures::TryStreamExt;
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

                if chunk_data.trim() == sse::DONE {
                    break;
                }

                let chunk: Value = match serde_json::from_str(chunk_data) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("Failed to parse chunk: {}, error: {}", chunk_data, e);
                        continue;
                    }
                };

                if let Some(text) = chunk
                    .pointer("/choices/0/delta/content")
                    .and_then(|c| c.as_str())
                {
                    if !text.is_empty() {
                        yield Ok(text.to_string());
                    }
                }

                if chunk
                    .pointer("/choices/0/finish_reason")
                    .and_then(|f| f.as_str())
                    .is_some()
                {
                    break;
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &str {
        "OpenRouter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::{ChatMessage, ChatRole};

    #[test]
    fn test_classify_credits_error() {
        let error = "insufficient credits to complete request";
        let result = OpenRouterProvider::classify_error(error);
        assert!(result.contains("credits"));
    }

    #[test]
    fn test_system_prompt_leads_the_messages() {
        let provider = OpenRouterProvider::new(
            "or-test".to_string(),
            "https://openrouter.ai/api/v1".to_string(),
            "anthropic/claude-sonnet-4".to_string(),
            300,
            None,
            None,
        );

        let request = CompletionRequest {
            system_prompt: "instructions".to_string(),
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: "hello".to_string(),
            }],
            max_tokens: 5,
        };

        let body = provider.build_request_body(&request);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
    }
}
