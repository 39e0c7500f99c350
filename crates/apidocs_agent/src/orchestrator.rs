//! Bounded tool-calling loop between the model and the tool registry.
//!
//! # States
//!
//! ```text
//! Start ──▶ AwaitingModel ──▶ Finished
//!               ▲   │
//!               │   ▼
//!           ExecutingTool        (any model failure after retries) ──▶ Failed
//! ```
//!
//! Every model call runs under a deadline and is retried with exponential
//! backoff while the error is transient. Tool calls of one round run
//! concurrently as spawned tasks; their results are appended in the order the
//! model requested them. Tool errors are handed back to the model as error
//! results and never end the loop.

use apidocs_models::llm::{
    GenerationError, GenerationRequest, GenerationResponse, Llm, Message,
    ToolCall, ToolDefinition, ToolResult, Usage,
};
use apidocs_tools::{ToolError, ToolRegistry};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Answer used when the round limit is hit before the model wrote any text.
pub const UNABLE_TO_COMPLETE: &str = "I was unable to complete this request within the allowed \
number of documentation lookups. Try narrowing the question to one provider or endpoint.";

/// Limits for [`ToolOrchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Most tool-call rounds per query.
    pub max_tool_rounds: usize,
    /// Deadline for one model call.
    pub model_timeout: Duration,
    /// Retries after the first failed model call.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any retry delay.
    pub max_backoff: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 5,
            model_timeout: Duration::from_secs(30),
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

/// Loop states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestrationState {
    /// Request assembled, nothing sent yet.
    Start,
    /// Waiting for the model.
    AwaitingModel,
    /// Running the tool calls of the latest model response.
    ExecutingTool,
    /// An answer is available.
    Finished,
    /// The model could not be reached.
    Failed,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The model produced a final answer.
    Answered,
    /// The round limit cut the loop short.
    RoundLimit,
    /// The model service failed after retries.
    Failed,
}

/// Result of [`ToolOrchestrator::run`].
#[derive(Debug, Clone)]
pub struct Outcome {
    /// How the run ended.
    pub kind: OutcomeKind,
    /// Answer text. Empty when the run failed.
    pub text: String,
    /// Assistant and tool-result messages produced after the user query.
    pub messages: Vec<Message>,
    /// Tool rounds executed.
    pub rounds: usize,
    /// Tool names in call order.
    pub tools_used: Vec<String>,
    /// Token usage summed over every model call.
    pub usage: Usage,
    /// The model error that ended a failed run.
    pub error: Option<String>,
}

/// One user query worth of input.
#[derive(Debug, Clone)]
pub struct Conversation {
    /// System instructions.
    pub system: String,
    /// Prior turns, oldest first.
    pub history: Vec<Message>,
    /// The new user query.
    pub query: String,
    /// Tool schemas advertised to the model, in preference order.
    pub tools: Vec<ToolDefinition>,
}

/// Drives the model through tool rounds until it answers.
#[derive(Clone)]
pub struct ToolOrchestrator {
    llm: Llm,
    tools: Arc<ToolRegistry>,
    config: OrchestratorConfig,
}

impl core::fmt::Debug for ToolOrchestrator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ToolOrchestrator")
            .field("llm", &self.llm)
            .field("tools", &self.tools.names())
            .field("config", &self.config)
            .finish()
    }
}

impl ToolOrchestrator {
    /// Creates an orchestrator over `llm` and `tools`.
    #[must_use]
    pub fn new(llm: Llm, tools: Arc<ToolRegistry>, config: OrchestratorConfig) -> Self {
        Self { llm, tools, config }
    }

    /// Model handle.
    #[must_use]
    pub fn llm(&self) -> &Llm {
        &self.llm
    }

    /// Loop limits.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Runs one query to completion. Never returns an error: model failures
    /// end in [`OutcomeKind::Failed`] for the caller to replace with a
    /// fallback answer.
    pub async fn run(&self, conversation: Conversation) -> Outcome {
        let Conversation {
            system,
            history,
            query,
            tools,
        } = conversation;

        let mut transcript = history;
        transcript.push(Message::user(query));
        let first_new = transcript.len();

        let mut state = OrchestrationState::Start;
        let mut pending: Vec<ToolCall> = Vec::new();
        let mut rounds = 0;
        let mut tools_used = Vec::new();
        let mut usage = Usage::default();
        let mut text = String::new();
        let mut kind = OutcomeKind::Answered;
        let mut error = None;

        loop {
            match state {
                OrchestrationState::Start => {
                    state = OrchestrationState::AwaitingModel;
                }
                OrchestrationState::AwaitingModel => {
                    let request = GenerationRequest::from_messages(transcript.clone())
                        .system(system.clone())
                        .tools(tools.clone())
                        .auto_tool();
                    match self.generate(request).await {
                        Ok(response) => {
                            add_usage(&mut usage, &response.usage);
                            if !response.has_tool_calls() {
                                text = response.text();
                                transcript.push(Message::assistant(text.clone()));
                                state = OrchestrationState::Finished;
                            } else if rounds >= self.config.max_tool_rounds {
                                tracing::warn!(rounds, "tool round limit reached");
                                text = partial_answer(&response, &transcript[first_new..]);
                                transcript.push(Message::assistant(text.clone()));
                                kind = OutcomeKind::RoundLimit;
                                state = OrchestrationState::Finished;
                            } else {
                                pending = response.tool_calls().into_iter().cloned().collect();
                                transcript.push(Message::assistant_blocks(response.content));
                                state = OrchestrationState::ExecutingTool;
                            }
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "model service unavailable");
                            error = Some(err.to_string());
                            kind = OutcomeKind::Failed;
                            state = OrchestrationState::Failed;
                        }
                    }
                }
                OrchestrationState::ExecutingTool => {
                    rounds += 1;
                    tracing::info!(
                        round = rounds,
                        calls = pending.len(),
                        "executing tool round"
                    );
                    tools_used.extend(pending.iter().map(|call| call.function.name.clone()));
                    let results = self.execute_calls(core::mem::take(&mut pending)).await;
                    transcript.push(Message::tool_results(results));
                    state = OrchestrationState::AwaitingModel;
                }
                OrchestrationState::Finished | OrchestrationState::Failed => break,
            }
        }

        let messages = if kind == OutcomeKind::Failed {
            Vec::new()
        } else {
            transcript.split_off(first_new)
        };
        Outcome {
            kind,
            text,
            messages,
            rounds,
            tools_used,
            usage,
            error,
        }
    }

    /// One model call with deadline and bounded retries.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let mut attempt = 0;
        let mut backoff = self.config.initial_backoff;
        loop {
            let result =
                match tokio::time::timeout(self.config.model_timeout, self.llm.generate(request.clone()))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(GenerationError::Timeout(self.config.model_timeout)),
                };

            match result {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = err
                        .retry_after()
                        .unwrap_or(backoff)
                        .min(self.config.max_backoff);
                    tracing::warn!(attempt, error = %err, ?delay, "model call failed, retrying");
                    tokio::time::sleep(delay).await;
                    backoff = (backoff * 2).min(self.config.max_backoff);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Runs one round of tool calls. Each call is a spawned task, so a caller
    /// that goes away mid-round does not cancel tools already started.
    async fn execute_calls(&self, calls: Vec<ToolCall>) -> Vec<ToolResult> {
        let handles: Vec<_> = calls
            .iter()
            .map(|call| {
                tracing::debug!(
                    tool = %call.function.name,
                    arguments = %call.function.arguments,
                    "tool call"
                );
                tokio::spawn(
                    self.tools
                        .execute(&call.function.name, call.function.arguments.clone()),
                )
            })
            .collect();

        let mut results = Vec::with_capacity(calls.len());
        for (call, handle) in calls.iter().zip(handles) {
            let outcome = handle
                .await
                .unwrap_or_else(|err| Err(ToolError::execution(format!("tool task failed: {err}"))));
            let result = match outcome {
                Ok(value) => {
                    let content = value
                        .as_str()
                        .map_or_else(|| value.to_string(), String::from);
                    ToolResult::success(&call.id, content)
                }
                Err(err) => {
                    tracing::warn!(tool = %call.function.name, error = %err, "tool call failed");
                    ToolResult::error(&call.id, err.to_payload().to_string())
                }
            };
            results.push(result);
        }
        results
    }
}

/// Text of the cut-off response, else the latest assistant text, else the
/// fixed message.
fn partial_answer(response: &GenerationResponse, produced: &[Message]) -> String {
    let text = response.text();
    if !text.trim().is_empty() {
        return text;
    }
    produced
        .iter()
        .rev()
        .filter(|message| message.is_assistant())
        .map(Message::text)
        .find(|text| !text.trim().is_empty())
        .unwrap_or_else(|| UNABLE_TO_COMPLETE.to_owned())
}

fn add_usage(total: &mut Usage, usage: &Usage) {
    let sum = |a: Option<u64>, b: Option<u64>| match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    };
    total.input_tokens = sum(total.input_tokens, usage.input_tokens);
    total.output_tokens = sum(total.output_tokens, usage.output_tokens);
    total.total_tokens = sum(total.total_tokens, usage.total_tokens);
}
