//! Anthropic backend over the Messages API.

mod client;
mod provider;
mod types;

pub use provider::AnthropicProvider;
