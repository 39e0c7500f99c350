//! `OpenAI` [`LlmProvider`] implementation over the Responses API.

use apidocs_models::llm::{
    AssistantBlock, GenerationError, GenerationRequest, GenerationResponse, LlmProvider, Message,
    ToolCall, ToolChoice, Usage, UserBlock,
};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::responses::{
    CreateResponse, CreateResponseArgs, EasyInputContent, EasyInputMessage, FunctionCallOutput,
    FunctionCallOutputItemParam, FunctionTool, FunctionToolCall, InputItem, InputParam, Item,
    OutputItem, OutputMessageContent, Response, ResponseUsage, Role, Tool, ToolChoiceFunction,
    ToolChoiceOptions, ToolChoiceParam,
};
use async_trait::async_trait;
use serde_json::Value;

/// `OpenAI` [`LlmProvider`] implementation.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl core::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OpenAiProvider").finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    /// Creates a provider for the public API.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::new().with_api_key(api_key))
    }

    /// Creates a provider from a full client configuration, e.g. one whose
    /// API base points at a compatible host.
    #[must_use]
    pub fn with_config(config: OpenAIConfig) -> Self {
        Self {
            client: Client::with_config(config),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(
        &self,
        model: &str,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let create_response = convert_request(model, &request)?;
        let response = self
            .client
            .responses()
            .create(create_response)
            .await
            .map_err(convert_error)?;
        tracing::debug!(id = %response.id, items = response.output.len(), "openai response");
        convert_response(response)
    }
}

// ───── Request ─────

fn convert_request(
    model: &str,
    request: &GenerationRequest,
) -> Result<CreateResponse, GenerationError> {
    let mut items = Vec::with_capacity(request.messages.len());
    for message in &request.messages {
        convert_message(message, &mut items)?;
    }

    let mut builder = CreateResponseArgs::default();
    builder.model(model).input(InputParam::Items(items));

    if let Some(system) = &request.system {
        builder.instructions(system.clone());
    }
    if let Some(tools) = &request.tools {
        // Tool schemas carry optional parameters and defaults, which strict
        // mode rejects.
        builder.tools(
            tools
                .iter()
                .map(|tool| {
                    Tool::Function(FunctionTool {
                        name: tool.name.clone(),
                        description: Some(tool.description.clone()),
                        parameters: Some(tool.parameters.clone()),
                        strict: Some(false),
                    })
                })
                .collect::<Vec<_>>(),
        );
    }
    if let Some(choice) = &request.tool_choice {
        builder.tool_choice(convert_tool_choice(choice));
    }

    builder
        .build()
        .map_err(|err| GenerationError::InvalidRequest(format!("cannot build request: {err}")))
}

/// Text blocks of one message become a single input message. Tool calls and
/// tool results are separate input items, linked by call id.
fn convert_message(message: &Message, items: &mut Vec<InputItem>) -> Result<(), GenerationError> {
    match message {
        Message::User { content } => {
            let mut text = String::new();
            for block in content {
                match block {
                    UserBlock::Text(part) => text.push_str(part),
                    UserBlock::ToolResult(result) => {
                        items.push(InputItem::Item(Item::FunctionCallOutput(
                            FunctionCallOutputItemParam {
                                call_id: result.id.clone(),
                                output: FunctionCallOutput::Text(result.content.clone()),
                                id: None,
                                status: None,
                            },
                        )));
                    }
                }
            }
            push_text(text, Role::User, items);
        }
        Message::Assistant { content, .. } => {
            let mut text = String::new();
            for block in content {
                match block {
                    AssistantBlock::Text(part) => text.push_str(part),
                    AssistantBlock::ToolCall(call) => {
                        push_text(core::mem::take(&mut text), Role::Assistant, items);
                        items.push(InputItem::Item(Item::FunctionCall(FunctionToolCall {
                            call_id: call.id.clone(),
                            name: call.function.name.clone(),
                            arguments: serde_json::to_string(&call.function.arguments)?,
                            id: None,
                            status: None,
                        })));
                    }
                }
            }
            push_text(text, Role::Assistant, items);
        }
    }
    Ok(())
}

fn push_text(text: String, role: Role, items: &mut Vec<InputItem>) {
    if text.is_empty() {
        return;
    }
    items.push(InputItem::EasyMessage(EasyInputMessage {
        content: EasyInputContent::Text(text),
        role,
        r#type: Default::default(),
    }));
}

fn convert_tool_choice(choice: &ToolChoice) -> ToolChoiceParam {
    match choice {
        ToolChoice::Auto => ToolChoiceParam::Mode(ToolChoiceOptions::Auto),
        ToolChoice::Required => ToolChoiceParam::Mode(ToolChoiceOptions::Required),
        ToolChoice::None => ToolChoiceParam::Mode(ToolChoiceOptions::None),
        ToolChoice::Specific(name) => {
            ToolChoiceParam::Function(ToolChoiceFunction { name: name.clone() })
        }
    }
}

// ───── Response ─────

fn convert_response(response: Response) -> Result<GenerationResponse, GenerationError> {
    let mut content = Vec::new();
    for item in response.output {
        convert_output_item(item, &mut content)?;
    }
    let usage = response.usage.map(convert_usage).unwrap_or_default();
    Ok(GenerationResponse { content, usage })
}

fn convert_output_item(
    item: OutputItem,
    content: &mut Vec<AssistantBlock>,
) -> Result<(), GenerationError> {
    match item {
        OutputItem::Message(message) => {
            for part in message.content {
                match part {
                    OutputMessageContent::OutputText(text) => {
                        if !text.text.is_empty() {
                            content.push(AssistantBlock::Text(text.text));
                        }
                    }
                    OutputMessageContent::Refusal(refusal) => {
                        return Err(GenerationError::InvalidResponse(format!(
                            "model refused: {}",
                            refusal.refusal
                        )));
                    }
                }
            }
        }
        OutputItem::FunctionCall(call) => {
            // Malformed argument JSON is passed through as a string so that
            // argument validation reports it back to the model.
            let arguments = serde_json::from_str(&call.arguments)
                .unwrap_or(Value::String(call.arguments));
            content.push(AssistantBlock::ToolCall(ToolCall::new(
                call.call_id,
                call.name,
                arguments,
            )));
        }
        other => {
            tracing::warn!(item = ?other, "dropping unsupported openai output item");
        }
    }
    Ok(())
}

fn convert_usage(usage: ResponseUsage) -> Usage {
    Usage {
        input_tokens: Some(u64::from(usage.input_tokens)),
        output_tokens: Some(u64::from(usage.output_tokens)),
        total_tokens: Some(u64::from(usage.total_tokens)),
    }
}

// ───── Errors ─────

fn convert_error(err: OpenAIError) -> GenerationError {
    match err {
        OpenAIError::ApiError(api_err) => GenerationError::Provider {
            status: None,
            message: api_err.message.clone(),
            source: Some(Box::new(OpenAIError::ApiError(api_err))),
        },
        OpenAIError::Reqwest(ref reqwest_err) => match reqwest_err.status() {
            Some(reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN) => {
                GenerationError::Auth(err.to_string())
            }
            Some(reqwest::StatusCode::TOO_MANY_REQUESTS) => {
                GenerationError::RateLimited { retry_after: None }
            }
            _ => GenerationError::Http(err.to_string()),
        },
        OpenAIError::JSONDeserialize(serde_err, _) => GenerationError::Json(serde_err),
        OpenAIError::InvalidArgument(message) => GenerationError::InvalidRequest(message),
        _ => GenerationError::Provider {
            status: None,
            message: err.to_string(),
            source: Some(Box::new(err)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidocs_models::llm::{ToolDefinition, ToolResult};
    use serde_json::json;

    fn list_providers_round() -> GenerationRequest {
        GenerationRequest::from_messages(vec![
            Message::user("what providers exist?"),
            Message::assistant_blocks(vec![
                AssistantBlock::Text("Checking.".into()),
                AssistantBlock::ToolCall(ToolCall::new("call_1", "list_providers", json!({}))),
            ]),
            Message::tool_results(vec![ToolResult::success("call_1", "[]")]),
        ])
        .system("system prompt")
    }

    #[test]
    fn tool_rounds_become_linked_input_items() {
        let created = convert_request("gpt-4o-mini", &list_providers_round()).expect("converts");
        assert_eq!(created.instructions.as_deref(), Some("system prompt"));

        let InputParam::Items(items) = &created.input else {
            panic!("expected input items");
        };
        assert_eq!(items.len(), 4);
        assert!(matches!(&items[0], InputItem::EasyMessage(m) if matches!(m.role, Role::User)));
        assert!(matches!(&items[1], InputItem::EasyMessage(m) if matches!(m.role, Role::Assistant)));

        let InputItem::Item(Item::FunctionCall(call)) = &items[2] else {
            panic!("expected a function call");
        };
        assert_eq!((call.call_id.as_str(), call.arguments.as_str()), ("call_1", "{}"));

        let InputItem::Item(Item::FunctionCallOutput(output)) = &items[3] else {
            panic!("expected a function call output");
        };
        assert_eq!(output.call_id, "call_1");
        assert!(matches!(&output.output, FunctionCallOutput::Text(text) if text == "[]"));
    }

    #[test]
    fn tools_are_sent_non_strict_with_forced_choice() {
        let request = GenerationRequest::new("list pods")
            .tools(vec![ToolDefinition {
                name: "search_documentation".into(),
                description: "Search the catalog".into(),
                parameters: json!({ "type": "object", "properties": {} }),
            }])
            .tool_choice(ToolChoice::Specific("search_documentation".into()));

        let created = convert_request("gpt-4o-mini", &request).expect("converts");
        let tools = created.tools.expect("tools set");
        let Tool::Function(function) = &tools[0] else {
            panic!("expected a function tool");
        };
        assert_eq!(function.name, "search_documentation");
        assert_eq!(function.strict, Some(false));
        assert!(matches!(
            created.tool_choice,
            Some(ToolChoiceParam::Function(ToolChoiceFunction { ref name })) if name == "search_documentation"
        ));
    }

    #[test]
    fn function_calls_keep_call_id_and_tolerate_bad_arguments() {
        let mut content = Vec::new();
        for (call_id, arguments) in [
            ("call_7", r#"{"provider":"petstore","query":"pet"}"#),
            ("call_8", "{not json"),
        ] {
            convert_output_item(
                OutputItem::FunctionCall(FunctionToolCall {
                    call_id: call_id.into(),
                    name: "search_openapi".into(),
                    arguments: arguments.into(),
                    id: Some(format!("fc_{call_id}")),
                    status: None,
                }),
                &mut content,
            )
            .expect("converts");
        }

        let calls: Vec<&ToolCall> = content
            .iter()
            .filter_map(|block| match block {
                AssistantBlock::ToolCall(call) => Some(call),
                AssistantBlock::Text(_) => None,
            })
            .collect();
        assert_eq!(calls[0].id, "call_7");
        assert_eq!(calls[0].function.arguments["provider"], "petstore");
        assert_eq!(calls[1].function.arguments, json!("{not json"));
    }

    #[test]
    fn invalid_arguments_are_not_retried() {
        let err = convert_error(OpenAIError::InvalidArgument("model is required".into()));
        assert!(matches!(err, GenerationError::InvalidRequest(_)));
        assert!(!err.is_retryable());
    }
}
