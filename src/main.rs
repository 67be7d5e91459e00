//! Grist Artifact Streaming Proxy
//!
//! This service forwards widget-builder chat requests to an upstream LLM
//! provider and re-emits the response as a stream of delta records, with
//! artifact content incrementally extracted and patched as it arrives.

mod api;
mod core;
mod extraction;
mod models;

use crate::api::endpoints::{create_router, AppState};
use crate::core::config::Config;
use crate::core::logging::init_logging;
use crate::core::provider::{Provider, ProviderType};
use crate::core::providers::{AnthropicProvider, OpenRouterProvider};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Check for --help flag
    if std::env::args().any(|arg| arg == "--help") {
        print_help();
        return;
    }

    // .env feeds CONFIG_PATH and RUST_LOG
    dotenv::dotenv().ok();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            eprintln!("Configuration Error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config.log_level);

    // Print startup banner
    print_startup_banner(&config);

    // Validate API key
    if !config.validate_api_key() {
        error!(
            "Invalid API key configuration for provider: {:?}",
            config.provider
        );
        std::process::exit(1);
    }

    // Create provider based on configuration
    let provider: Arc<dyn Provider> = match config.provider {
        ProviderType::Anthropic => Arc::new(AnthropicProvider::new(
            config.api_key.clone(),
            config.api_base_url.clone(),
            config.model.clone(),
            config.request_timeout,
        )),
        ProviderType::OpenRouter => Arc::new(OpenRouterProvider::new(
            config.api_key.clone(),
            config.api_base_url.clone(),
            config.model.clone(),
            config.request_timeout,
            config.openrouter_site_url.clone(),
            config.openrouter_app_name.clone(),
        )),
    };

    info!("Using provider: {}", provider.provider_name());

    // Create application state
    let app_state = AppState {
        config: config.clone(),
        provider,
        http: reqwest::Client::new(),
    };

    // Create router
    let app = create_router(app_state);

    // Bind to address
    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Server listening on http://{}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Print startup banner with configuration
fn print_startup_banner(config: &Config) {
    println!("🚀 Grist Artifact Proxy v0.1.0");
    println!("✅ Configuration loaded successfully");
    println!("   Provider: {:?}", config.provider);
    println!("   Base URL: {}", config.api_base_url);
    println!("   Model: {}", config.model);
    println!("   Max Tokens: {}", config.max_tokens);
    println!("   Request Timeout: {}s", config.request_timeout);
    println!("   Server: {}:{}", config.host, config.port);
    println!(
        "   Grist Token Validation: {}",
        match config.grist_base_url {
            Some(ref url) => format!("Enabled ({})", url),
            None => "Disabled".to_string(),
        }
    );
    println!();
}

/// Print help message
fn print_help() {
    println!("Grist Artifact Proxy v0.1.0");
    println!();
    println!("Usage: grist-artifact-proxy [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --help    Display this help message");
    println!();
    println!("Environment variables:");
    println!("  CONFIG_PATH - Path to the TOML configuration file (default: config.toml)");
    println!("  RUST_LOG    - Log filter override (default: [server].log_level)");
    println!();
    println!("Configuration file sections:");
    println!("  provider            - Provider type: anthropic, openrouter");
    println!();
    println!("  [anthropic]");
    println!("    api_key           - Anthropic API key (required for anthropic)");
    println!("    base_url          - API base URL (default: https://api.anthropic.com)");
    println!("    model             - Model name (default: claude-sonnet-4-20250514)");
    println!();
    println!("  [openrouter]");
    println!("    api_key           - OpenRouter API key (required for openrouter)");
    println!("    model             - Model name (required)");
    println!("    base_url          - API base URL (default: https://openrouter.ai/api/v1)");
    println!("    site_url          - Site URL for OpenRouter credits");
    println!("    app_name          - Application name for OpenRouter");
    println!();
    println!("  [grist]");
    println!("    base_url          - Grist instance used to validate access tokens;");
    println!("                        omit the section to disable validation");
    println!();
    println!("  [server]");
    println!("    host              - Server host (default: 0.0.0.0)");
    println!("    port              - Server port (default: 8090)");
    println!("    log_level         - Logging level (default: info)");
    println!();
    println!("  [request]");
    println!("    max_tokens        - Completion token limit (default: 8192)");
    println!("    max_messages_limit - Context truncation limit (default: 30)");
    println!("    request_timeout   - Upstream timeout in seconds (default: 300)");
}
