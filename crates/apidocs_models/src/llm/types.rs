//! Provider-neutral chat vocabulary.
//!
//! A conversation is a list of [`Message`]s alternating between the user side
//! (text or tool results) and the assistant side (text or tool calls). Backends
//! translate these into their own wire format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ───── Request / Response ─────

/// Everything a backend needs for one completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Instructions placed ahead of the conversation.
    pub system: Option<String>,
    /// Conversation so far, oldest first.
    pub messages: Vec<Message>,
    /// Tools offered for this call; `None` offers nothing.
    pub tools: Option<Vec<ToolDefinition>>,
    /// Tool selection policy; `None` leaves it to the backend default.
    pub tool_choice: Option<ToolChoice>,
}

impl GenerationRequest {
    /// A single-question request.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_messages(vec![Message::user(message)])
    }

    /// A single-question request with instructions.
    ///
    /// ```rust
    /// use apidocs_models::llm::GenerationRequest;
    ///
    /// let request = GenerationRequest::with_system(
    ///     "You are an API documentation assistant",
    ///     "How do I create a Jira issue?"
    /// );
    /// assert_eq!(request.messages.len(), 1);
    /// assert!(request.system.is_some());
    /// ```
    #[must_use]
    pub fn with_system(system: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(message).system(system)
    }

    /// A request over an existing conversation.
    #[must_use]
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    /// Sets the instructions.
    #[must_use]
    pub fn system(self, system: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            ..self
        }
    }

    /// Offers `tools` to the model, replacing any previous set.
    #[must_use]
    pub fn tools(self, tools: Vec<ToolDefinition>) -> Self {
        Self {
            tools: Some(tools),
            ..self
        }
    }

    /// Sets the tool selection policy.
    #[must_use]
    pub fn tool_choice(self, choice: ToolChoice) -> Self {
        Self {
            tool_choice: Some(choice),
            ..self
        }
    }

    /// Shorthand for [`ToolChoice::Auto`].
    #[must_use]
    pub fn auto_tool(self) -> Self {
        self.tool_choice(ToolChoice::Auto)
    }
}

/// One completion as returned by a backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Text and tool-call blocks in emission order.
    pub content: Vec<AssistantBlock>,
    /// Token counts for this call.
    pub usage: Usage,
}

impl GenerationResponse {
    /// A plain text reply with no usage figures.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![AssistantBlock::Text(text.into())],
            usage: Usage::default(),
        }
    }

    /// Text blocks joined without separators; empty when there are none.
    #[must_use]
    pub fn text(&self) -> String {
        assistant_text(&self.content)
    }

    /// Requested calls in emission order.
    #[must_use]
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.content
            .iter()
            .filter_map(AssistantBlock::as_tool_call)
            .collect()
    }

    /// True when the model wants tools run before it answers.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        self.content.iter().any(|block| block.as_tool_call().is_some())
    }
}

/// Token counts reported by the backend. Missing figures stay `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[expect(missing_docs, reason = "field names are the provider terms")]
pub struct Usage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

// ───── Messages ─────

/// One side of a conversation exchange.
///
/// Tool results go back on the user side, one [`UserBlock::ToolResult`] per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// Question text or tool results.
    User {
        /// Text and tool-result blocks.
        content: Vec<UserBlock>,
    },
    /// Model output.
    Assistant {
        /// Backend message id, when one was reported.
        id: Option<String>,
        /// Text and tool-call blocks.
        content: Vec<AssistantBlock>,
    },
}

impl Message {
    /// A user question.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            content: vec![UserBlock::Text(text.into())],
        }
    }

    /// A text-only model reply.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::assistant_blocks(vec![AssistantBlock::Text(text.into())])
    }

    /// A model reply made of arbitrary blocks.
    #[must_use]
    pub fn assistant_blocks(content: Vec<AssistantBlock>) -> Self {
        Self::Assistant { id: None, content }
    }

    /// The user-side message answering a batch of tool calls.
    #[must_use]
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self::User {
            content: results.into_iter().map(UserBlock::ToolResult).collect(),
        }
    }

    /// Whether the model produced this message.
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        matches!(self, Self::Assistant { .. })
    }

    /// Text blocks joined without separators; tool blocks are skipped.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::User { content } => content
                .iter()
                .filter_map(|block| match block {
                    UserBlock::Text(text) => Some(text.as_str()),
                    UserBlock::ToolResult(_) => None,
                })
                .collect(),
            Self::Assistant { content, .. } => assistant_text(content),
        }
    }
}

fn assistant_text(blocks: &[AssistantBlock]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            AssistantBlock::Text(text) => Some(text.as_str()),
            AssistantBlock::ToolCall(_) => None,
        })
        .collect()
}

// ───── Content blocks ─────

/// User-side content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[expect(missing_docs, reason = "variants are self-explanatory")]
pub enum UserBlock {
    Text(String),
    ToolResult(ToolResult),
}

/// Assistant-side content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[expect(missing_docs, reason = "variants are self-explanatory")]
pub enum AssistantBlock {
    Text(String),
    ToolCall(ToolCall),
}

impl AssistantBlock {
    fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            Self::ToolCall(call) => Some(call),
            Self::Text(_) => None,
        }
    }
}

// ───── Tools ─────

/// A tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Stable name the model calls it by, e.g. `search_openapi`.
    pub name: String,
    /// When and why to use the tool.
    pub description: String,
    /// JSON Schema of the argument object, for example:
    ///
    /// ```json
    /// {
    ///   "type": "object",
    ///   "properties": {
    ///     "provider": {"type": "string", "description": "Provider identifier"},
    ///     "http_method": {"type": "string", "enum": ["GET", "POST"]}
    ///   },
    ///   "required": ["provider"]
    /// }
    /// ```
    pub parameters: Value,
}

/// Tool selection policy for one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// Call tools or answer directly, model's choice.
    Auto,
    /// At least one call is mandatory.
    Required,
    /// Exactly the named tool.
    Specific(String),
    /// Answer in text only.
    None,
}

/// The model asking for a tool to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlates the eventual [`ToolResult`] with this call.
    pub id: String,
    /// Which tool, with what arguments.
    pub function: ToolFunction,
}

impl ToolCall {
    /// A call to `name` with the given argument object.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            function: ToolFunction {
                name: name.into(),
                arguments,
            },
        }
    }
}

/// Tool name plus the raw argument object chosen by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[expect(missing_docs, reason = "struct doc covers the fields")]
pub struct ToolFunction {
    pub name: String,
    pub arguments: Value,
}

/// Outcome flag carried alongside a tool result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[expect(missing_docs, reason = "variants are self-explanatory")]
pub enum ToolResultStatus {
    #[default]
    Success,
    Error,
}

/// What a tool produced for one [`ToolCall`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the call being answered.
    pub id: String,
    /// Serialized JSON payload, success or error object alike.
    pub content: String,
    /// Defaults to success when absent.
    #[serde(default)]
    pub status: ToolResultStatus,
}

impl ToolResult {
    fn with_status(
        id: impl Into<String>,
        content: impl Into<String>,
        status: ToolResultStatus,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            status,
        }
    }

    /// A successful payload.
    #[must_use]
    pub fn success(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_status(id, content, ToolResultStatus::Success)
    }

    /// A failure report; the model reads `content` and may correct itself.
    #[must_use]
    pub fn error(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_status(id, content, ToolResultStatus::Error)
    }

    /// Whether the tool reported a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == ToolResultStatus::Error
    }
}
