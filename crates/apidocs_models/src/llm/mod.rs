//! Text generation with tool calling.

mod error;
mod model;
mod provider;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
mod types;

pub use error::GenerationError;
pub use model::Llm;
pub use provider::LlmProvider;
pub use types::{
    AssistantBlock, GenerationRequest, GenerationResponse, Message, ToolCall, ToolChoice,
    ToolDefinition, ToolFunction, ToolResult, ToolResultStatus, Usage, UserBlock,
};
