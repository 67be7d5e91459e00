//! API endpoint handlers
//!
//! This module implements the HTTP endpoints for the widget-builder proxy:
//! the streaming message endpoint plus health and connectivity checks.

use crate::core::config::Config;
use crate::core::prompt::render_system_prompt;
use crate::core::provider::{CompletionRequest, Provider};
use crate::extraction::reducer::reduce_artifact_stream;
use crate::models::chat::{ArtifactChatRequest, ChatMessage, ChatRole};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response, Sse},
    routing::{get, post},
};
use futures::StreamExt;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub provider: Arc<dyn Provider>,
    pub http: reqwest::Client,
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/v1/messages", post(create_message))
        .route("/health", get(health_check))
        .route("/test-connection", get(test_connection))
        .with_state(state)
}

/// Validate the Grist access token from request headers
///
/// The token is checked against the configured Grist instance's org listing,
/// which rejects tokens it did not issue. Validation is skipped entirely
/// when no Grist instance is configured.
async fn validate_access_token(headers: &HeaderMap, state: &AppState) -> Result<(), StatusCode> {
    let Some(ref grist_base_url) = state.config.grist_base_url else {
        return Ok(());
    };

    let access_token = headers
        .get("x-grist-access-token")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        });

    let Some(token) = access_token else {
        warn!("Missing Grist access token");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let request_url = format!("{}/api/orgs?auth={}", grist_base_url, token);
    let response = state
        .http
        .get(&request_url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| {
            error!("Grist token validation request failed: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

    if response.status().is_success() {
        Ok(())
    } else {
        warn!("Grist rejected access token: {}", response.status());
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// POST /v1/messages - Stream the next assistant message
///
/// Forwards the conversation upstream and re-emits the response over SSE,
/// one `DeltaResult` record per upstream text delta.
async fn create_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ArtifactChatRequest>,
) -> Result<Response, StatusCode> {
    validate_access_token(&headers, &state).await?;

    let request_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(
        "📥 Incoming widget chat request: id={}, messages={}, has_artifact={}",
        request_id,
        request.messages.len(),
        request.current_artifact.is_some()
    );
    debug!("Full request payload: {:?}", request);

    // Keep the upstream context bounded: drop the oldest turns first.
    let messages = if request.messages.len() > state.config.max_messages_limit as usize {
        let original_count = request.messages.len();
        let truncated: Vec<ChatMessage> = request
            .messages
            .iter()
            .skip(original_count - state.config.max_messages_limit as usize)
            .cloned()
            .collect();

        tracing::warn!(
            "📜 Context truncated: {} messages → {} messages (removed {} oldest messages)",
            original_count,
            truncated.len(),
            original_count - truncated.len()
        );
        truncated
    } else {
        request.messages.clone()
    };

    let base_artifact = request.current_artifact.clone().unwrap_or_default();

    let completion = CompletionRequest {
        system_prompt: render_system_prompt(&request.structure_description),
        messages,
        max_tokens: state.config.max_tokens,
    };

    match state.provider.stream_text(completion).await {
        Ok(text_stream) => {
            let delta_stream = reduce_artifact_stream(text_stream, base_artifact);

            let sse_stream = delta_stream.map(|item| {
                let event = match item {
                    Ok(delta) => match axum::response::sse::Event::default().json_data(&delta) {
                        Ok(event) => event,
                        Err(e) => {
                            error!("Failed to serialize delta result: {}", e);
                            axum::response::sse::Event::default().event("error").data(
                                json!({
                                    "type": "serialization_error",
                                    "message": e.to_string()
                                })
                                .to_string(),
                            )
                        }
                    },
                    Err(e) => {
                        error!("Upstream stream error: {}", e);
                        axum::response::sse::Event::default().event("error").data(
                            json!({
                                "type": "upstream_error",
                                "message": e.to_string()
                            })
                            .to_string(),
                        )
                    }
                };
                Ok::<_, Infallible>(event)
            });

            // Create SSE response with proper headers
            let mut response = Sse::new(sse_stream)
                .keep_alive(axum::response::sse::KeepAlive::default())
                .into_response();

            let response_headers = response.headers_mut();
            response_headers.insert("Cache-Control", "no-cache".parse().unwrap());
            response_headers.insert("Connection", "keep-alive".parse().unwrap());
            Ok(response)
        }
        Err(e) => {
            error!("Provider streaming error: {}", e);
            let error_response = json!({
                "type": "error",
                "error": {
                    "type": "api_error",
                    "message": e.to_string()
                }
            });
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(error_response)).into_response())
        }
    }
}

/// GET / - Root endpoint
async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "message": "Grist Artifact Proxy v0.1.0",
        "status": "running",
        "config": {
            "provider": state.provider.provider_name(),
            "model": state.config.model,
            "max_tokens": state.config.max_tokens,
            "api_key_configured": !state.config.api_key.is_empty(),
            "grist_token_validation": state.config.grist_base_url.is_some(),
        },
        "endpoints": {
            "messages": "/v1/messages",
            "health": "/health",
            "test_connection": "/test-connection",
        },
    }))
}

/// GET /health - Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "provider": state.provider.provider_name(),
        "api_key_valid": state.config.validate_api_key(),
        "grist_token_validation": state.config.grist_base_url.is_some(),
    }))
}

/// GET /test-connection - Test upstream API connectivity
async fn test_connection(State(state): State<AppState>) -> impl IntoResponse {
    let test_request = CompletionRequest {
        system_prompt: String::new(),
        messages: vec![ChatMessage {
            role: ChatRole::User,
            content: "Hello".to_string(),
        }],
        max_tokens: 5,
    };

    match state.provider.stream_text(test_request).await {
        Ok(mut stream) => {
            // Drain one delta to prove the stream is live.
            let first = stream.next().await;
            match first {
                Some(Err(e)) => {
                    error!("API connectivity test failed mid-stream: {}", e);
                    Json(json!({
                        "status": "failed",
                        "error_type": "Stream Error",
                        "message": e.to_string(),
                        "provider": state.provider.provider_name(),
                        "timestamp": chrono::Utc::now().to_rfc3339(),
                    }))
                }
                _ => Json(json!({
                    "status": "success",
                    "message": format!(
                        "Successfully connected to {} API",
                        state.provider.provider_name()
                    ),
                    "provider": state.provider.provider_name(),
                    "model_used": state.config.model,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })),
            }
        }
        Err(e) => {
            error!("API connectivity test failed: {}", e);
            Json(json!({
                "status": "failed",
                "error_type": "API Error",
                "message": e.to_string(),
                "provider": state.provider.provider_name(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "suggestions": [
                    "Check your API key is valid",
                    "Verify your API key has the necessary permissions",
                    "Check if you have reached rate limits",
                ],
            }))
        }
    }
}
