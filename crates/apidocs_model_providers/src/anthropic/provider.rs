//! Anthropic [`LlmProvider`] implementation.

use super::client::AnthropicClient;
use super::types::{
    ContentBlock, ContentBlockParam, CreateMessageRequest, MessageParam, MessageResponse, Role,
    ToolChoiceParam, ToolDef,
};
use apidocs_models::llm::{
    AssistantBlock, GenerationError, GenerationRequest, GenerationResponse, LlmProvider, Message,
    ToolCall, ToolChoice, Usage, UserBlock,
};
use async_trait::async_trait;

/// Default maximum tokens for generation requests.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic [`LlmProvider`] implementation.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: AnthropicClient,
}

impl AnthropicProvider {
    /// Creates a new provider.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: AnthropicClient::new(api_key),
        }
    }

    /// Points the provider at a different API host (proxies, gateways).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn generate(
        &self,
        model: &str,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let anthropic_request = convert_request(model, &request);

        let response = self.client.create_message(&anthropic_request).await?;
        tracing::debug!(model, stop_reason = ?response.stop_reason, "anthropic response");

        Ok(convert_response(response))
    }
}

fn convert_request(model: &str, request: &GenerationRequest) -> CreateMessageRequest {
    let messages = request.messages.iter().map(convert_message).collect();

    let tools = request
        .tools
        .iter()
        .flatten()
        .map(|tool| ToolDef {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: tool.parameters.clone(),
        })
        .collect();

    CreateMessageRequest {
        model: model.to_string(),
        max_tokens: DEFAULT_MAX_TOKENS,
        messages,
        system: request.system.clone(),
        tools,
        tool_choice: request.tool_choice.as_ref().map(convert_tool_choice),
    }
}

fn convert_message(message: &Message) -> MessageParam {
    match message {
        Message::User { content } => MessageParam {
            role: Role::User,
            content: content.iter().map(convert_user_block).collect(),
        },
        Message::Assistant { content, .. } => MessageParam {
            role: Role::Assistant,
            content: content.iter().map(convert_assistant_block).collect(),
        },
    }
}

fn convert_user_block(block: &UserBlock) -> ContentBlockParam {
    match block {
        UserBlock::Text(text) => ContentBlockParam::Text { text: text.clone() },
        UserBlock::ToolResult(result) => ContentBlockParam::ToolResult {
            tool_use_id: result.id.clone(),
            content: result.content.clone(),
            is_error: result.is_error(),
        },
    }
}

fn convert_assistant_block(block: &AssistantBlock) -> ContentBlockParam {
    match block {
        AssistantBlock::Text(text) => ContentBlockParam::Text { text: text.clone() },
        AssistantBlock::ToolCall(call) => ContentBlockParam::ToolUse {
            id: call.id.clone(),
            name: call.function.name.clone(),
            input: call.function.arguments.clone(),
        },
    }
}

fn convert_tool_choice(choice: &ToolChoice) -> ToolChoiceParam {
    match choice {
        ToolChoice::Auto => ToolChoiceParam::Auto,
        ToolChoice::Required => ToolChoiceParam::Any,
        ToolChoice::Specific(name) => ToolChoiceParam::Tool { name: name.clone() },
        ToolChoice::None => ToolChoiceParam::None,
    }
}

fn convert_response(response: MessageResponse) -> GenerationResponse {
    let content = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(AssistantBlock::Text(text)),
            ContentBlock::ToolUse { id, name, input } => {
                Some(AssistantBlock::ToolCall(ToolCall::new(id, name, input)))
            }
            ContentBlock::Other => None,
        })
        .collect();

    GenerationResponse {
        content,
        usage: Usage {
            input_tokens: Some(response.usage.input_tokens),
            output_tokens: Some(response.usage.output_tokens),
            total_tokens: Some(response.usage.input_tokens + response.usage.output_tokens),
        },
    }
}
