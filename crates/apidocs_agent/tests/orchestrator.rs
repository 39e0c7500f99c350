mod common;

use apidocs_agent::{
    Conversation, OrchestratorConfig, OutcomeKind, ToolOrchestrator, UNABLE_TO_COMPLETE,
    documentation_tools,
};
use apidocs_models::llm::testing::ScriptedProvider;
use apidocs_models::llm::{
    AssistantBlock, GenerationError, GenerationRequest, GenerationResponse, LlmProvider, Message,
    ToolCall, Usage,
};
use async_trait::async_trait;
use common::{last_tool_results, llm, service, text, tool_call};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

async fn orchestrator<P: LlmProvider>(provider: Arc<P>, config: OrchestratorConfig) -> ToolOrchestrator {
    let service = service().await;
    let providers = vec!["atlassian".to_owned(), "kubernetes".to_owned()];
    let tools = documentation_tools(&service, &providers).expect("tools register");
    ToolOrchestrator::new(llm(provider), Arc::new(tools), config)
}

fn conversation(query: &str) -> Conversation {
    Conversation {
        system: "You answer API questions.".to_owned(),
        history: Vec::new(),
        query: query.to_owned(),
        tools: Vec::new(),
    }
}

fn rounds(max_tool_rounds: usize) -> OrchestratorConfig {
    OrchestratorConfig {
        max_tool_rounds,
        ..OrchestratorConfig::default()
    }
}

#[tokio::test]
async fn terminates_against_a_model_that_never_stops_calling_tools() {
    let provider = Arc::new(ScriptedProvider::repeating(|request| {
        let id = format!("call_{}", request.messages.len());
        Ok(tool_call(&id, "list_providers", json!({})))
    }));
    let orchestrator = orchestrator(provider.clone(), rounds(3)).await;

    let outcome = orchestrator.run(conversation("loop forever")).await;

    assert_eq!(outcome.kind, OutcomeKind::RoundLimit);
    assert_eq!(outcome.rounds, 3);
    assert_eq!(provider.calls(), 4);
    assert_eq!(outcome.text, UNABLE_TO_COMPLETE);
    assert_eq!(outcome.tools_used.len(), 3);

    // Three call/result pairs, then the closing answer without dangling calls.
    assert_eq!(outcome.messages.len(), 7);
    let last = outcome.messages.last().expect("closing message");
    assert!(last.is_assistant());
    assert_eq!(last.text(), UNABLE_TO_COMPLETE);
}

#[tokio::test]
async fn round_limit_keeps_partial_text() {
    let provider = Arc::new(ScriptedProvider::repeating(|_| {
        Ok(GenerationResponse {
            content: vec![
                AssistantBlock::Text("Pods are listed with GET /api/v1/pods.".to_owned()),
                AssistantBlock::ToolCall(ToolCall::new("call", "list_providers", json!({}))),
            ],
            usage: Usage::default(),
        })
    }));
    let orchestrator = orchestrator(provider, rounds(1)).await;

    let outcome = orchestrator.run(conversation("list pods")).await;
    assert_eq!(outcome.kind, OutcomeKind::RoundLimit);
    assert_eq!(outcome.text, "Pods are listed with GET /api/v1/pods.");
}

#[tokio::test]
async fn results_follow_call_order() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(GenerationResponse {
            content: vec![
                AssistantBlock::ToolCall(ToolCall::new("first", "list_providers", json!({}))),
                AssistantBlock::ToolCall(ToolCall::new(
                    "second",
                    "search_openapi",
                    json!({ "provider": "petstore", "query": "pets" }),
                )),
            ],
            usage: Usage::default(),
        }),
        Ok(text("done")),
    ]));
    let orchestrator = orchestrator(provider.clone(), OrchestratorConfig::default()).await;

    let outcome = orchestrator.run(conversation("pets")).await;
    assert_eq!(outcome.kind, OutcomeKind::Answered);
    assert_eq!(outcome.tools_used, vec!["list_providers", "search_openapi"]);

    let results = last_tool_results(&provider.requests()[1].messages);
    let ids: Vec<&str> = results.iter().map(|result| result.id.as_str()).collect();
    assert_eq!(ids, ["first", "second"]);
    assert!(results[0].content.contains("\"total_providers\":3"));
    assert!(results[1].content.contains("not_loaded"));
    assert!(!results[1].is_error());
}

#[tokio::test]
async fn usage_is_summed_over_calls() {
    let with_usage = |mut response: GenerationResponse, input: u64| {
        response.usage = Usage {
            input_tokens: Some(input),
            output_tokens: Some(10),
            total_tokens: Some(input + 10),
        };
        response
    };
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(with_usage(tool_call("c1", "list_providers", json!({})), 100)),
        Ok(with_usage(text("three providers"), 250)),
    ]));
    let orchestrator = orchestrator(provider, OrchestratorConfig::default()).await;

    let outcome = orchestrator.run(conversation("providers?")).await;
    assert_eq!(outcome.usage.input_tokens, Some(350));
    assert_eq!(outcome.usage.output_tokens, Some(20));
    assert_eq!(outcome.usage.total_tokens, Some(370));
}

#[tokio::test]
async fn history_precedes_the_query() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(text("yes"))]));
    let orchestrator = orchestrator(provider.clone(), OrchestratorConfig::default()).await;

    let mut input = conversation("and pods?");
    input.history = vec![Message::user("services?"), Message::assistant("GET /api/v1/services")];
    let outcome = orchestrator.run(input).await;

    let request = &provider.requests()[0];
    let texts: Vec<String> = request.messages.iter().map(Message::text).collect();
    assert_eq!(texts, ["services?", "GET /api/v1/services", "and pods?"]);
    assert_eq!(request.system.as_deref(), Some("You answer API questions."));

    // Only the new answer is reported back; the query is the caller's.
    assert_eq!(outcome.messages.len(), 1);
    assert_eq!(outcome.messages[0].text(), "yes");
}

struct SlowProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for SlowProvider {
    async fn generate(
        &self,
        _model: &str,
        _request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(GenerationResponse::from_text("too late"))
    }
}

#[tokio::test(start_paused = true)]
async fn slow_models_time_out_and_fail() {
    let provider = Arc::new(SlowProvider {
        calls: AtomicUsize::new(0),
    });
    let config = OrchestratorConfig {
        model_timeout: Duration::from_secs(1),
        max_retries: 1,
        ..OrchestratorConfig::default()
    };
    let orchestrator = orchestrator(provider.clone(), config).await;

    let outcome = orchestrator.run(conversation("anything")).await;
    assert_eq!(outcome.kind, OutcomeKind::Failed);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    assert!(outcome.messages.is_empty());
    assert!(outcome.error.as_deref().is_some_and(|e| e.contains("timed out")));
}

#[tokio::test(start_paused = true)]
async fn rate_limit_delay_is_honoured() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(GenerationError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
        }),
        Ok(text("after the wait")),
    ]));
    let orchestrator = orchestrator(provider, OrchestratorConfig::default()).await;

    let started = tokio::time::Instant::now();
    let outcome = orchestrator.run(conversation("anything")).await;
    assert_eq!(outcome.kind, OutcomeKind::Answered);
    assert_eq!(outcome.text, "after the wait");
    assert!(started.elapsed() >= Duration::from_secs(3));
}
