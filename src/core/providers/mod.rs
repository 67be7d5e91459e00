//! Provider implementations

pub mod anthropic;
pub mod openrouter;

pub use anthropic::AnthropicProvider;
pub use openrouter::OpenRouterProvider;
