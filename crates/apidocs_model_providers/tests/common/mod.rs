//! Shared helpers for live provider tests.

use std::future::Future;
use std::sync::Once;

use apidocs_models::llm::{GenerationRequest, Llm, ToolChoice, ToolDefinition};
use serde_json::json;

static INIT: Once = Once::new();

/// Loads `.env` once per test binary.
pub fn init_env() {
    INIT.call_once(|| {
        let _ = dotenvy::dotenv();
    });
}

fn search_tool() -> ToolDefinition {
    ToolDefinition {
        name: "search_documentation".to_string(),
        description: "Search API documentation for endpoints matching a query".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search terms"},
                "provider": {"type": "string", "enum": ["atlassian", "kubernetes", "datadog"]}
            },
            "required": ["query"],
            "additionalProperties": false
        }),
    }
}

/// Behaviors every backend must support.
pub trait LlmTestExt {
    /// Plain generation returns text.
    fn test_basic_generation(&self) -> impl Future<Output = ()> + Send;

    /// A forced tool choice yields a call to the documentation search tool.
    fn test_tool_calling(&self) -> impl Future<Output = ()> + Send;

    /// An unknown model surfaces an error instead of hanging.
    fn test_invalid_model_error(&self) -> impl Future<Output = ()> + Send;
}

impl LlmTestExt for Llm {
    async fn test_basic_generation(&self) {
        let request = GenerationRequest::new("Say 'hello' and nothing else.");

        let response = self
            .generate(request)
            .await
            .expect("generation should succeed");

        let text = response.text().to_lowercase();
        assert!(text.contains("hello"), "response should contain 'hello': {text}");
    }

    async fn test_tool_calling(&self) {
        let request = GenerationRequest::new("Find the Jira endpoint for creating an issue.")
            .tools(vec![search_tool()])
            .tool_choice(ToolChoice::Required);

        let response = self
            .generate(request)
            .await
            .expect("generation should succeed");

        let calls = response.tool_calls();
        assert!(!calls.is_empty(), "should have at least one tool call");
        assert_eq!(calls[0].function.name, "search_documentation");
        assert!(
            calls[0].function.arguments.get("query").is_some(),
            "tool call should carry a query: {:?}",
            calls[0].function.arguments
        );
    }

    async fn test_invalid_model_error(&self) {
        let result = self.generate(GenerationRequest::new("Hello")).await;
        assert!(result.is_err(), "should fail with invalid model");
    }
}
