//! Shared fixtures for agent integration tests.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared fixtures, not every item is used by every test binary"
)]

use apidocs_agent::{AgentConfig, Assistant};
use apidocs_catalog::{
    CatalogError, CatalogStore, DocsService, DynamicSpecCache, MemoryCatalog, SpecFetcher,
    default_providers, normalize,
};
use apidocs_models::ModelRegistry;
use apidocs_models::llm::testing::ScriptedProvider;
use apidocs_models::llm::{
    AssistantBlock, GenerationResponse, Llm, LlmProvider, Message, ToolCall, ToolResult,
    UserBlock, Usage,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

pub const PETSTORE_URL: &str = "https://specs.test/petstore.json";

/// Serves canned documents by URL.
#[derive(Default)]
pub struct StaticFetcher {
    documents: HashMap<String, Value>,
}

impl StaticFetcher {
    pub fn with(mut self, url: &str, document: Value) -> Self {
        self.documents.insert(url.to_owned(), document);
        self
    }
}

#[async_trait]
impl SpecFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, CatalogError> {
        self.documents.get(url).cloned().ok_or(CatalogError::Fetch {
            url: url.to_owned(),
            message: "HTTP 404 Not Found".to_owned(),
        })
    }
}

pub fn petstore() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": { "title": "Petstore", "version": "1.0.0" },
        "paths": {
            "/pets": {
                "get": { "summary": "List all pets", "tags": ["pets"] },
                "post": { "summary": "Create a pet", "tags": ["pets"] }
            },
            "/store/orders": {
                "get": { "summary": "List orders", "tags": ["store"] }
            }
        }
    })
}

fn jira() -> Value {
    json!({
        "swagger": "2.0",
        "info": { "title": "The Jira Cloud platform REST API", "version": "1001.0.0" },
        "paths": {
            "/rest/api/3/issue": {
                "post": {
                    "summary": "Create issue",
                    "description": "Creates an issue or a sub-task from a JSON representation.",
                    "tags": ["Issues"]
                }
            },
            "/rest/api/3/issue/{issueIdOrKey}": {
                "get": {
                    "summary": "Get issue",
                    "description": "Returns the details for an issue.",
                    "tags": ["Issues"]
                }
            }
        }
    })
}

fn kubernetes() -> Value {
    json!({
        "swagger": "2.0",
        "info": { "title": "Kubernetes", "version": "v1.28.0" },
        "paths": {
            "/api/v1/namespaces/{namespace}/pods": {
                "get": { "summary": "list or watch objects of kind Pod", "tags": ["core_v1"] }
            }
        }
    })
}

/// Catalog seeded with the default providers, a few Jira and Kubernetes
/// endpoints, and a fetcher that serves the pet store document.
pub async fn service() -> DocsService {
    let store = MemoryCatalog::with_providers(default_providers());
    for (provider, document) in [("atlassian", jira()), ("kubernetes", kubernetes())] {
        let endpoints = normalize(provider, &document).expect("fixture is valid");
        store
            .upsert_endpoints(provider, endpoints)
            .await
            .expect("provider is registered");
    }
    let fetcher = StaticFetcher::default().with(PETSTORE_URL, petstore());
    DocsService::new(
        Arc::new(store),
        Arc::new(DynamicSpecCache::new(Arc::new(fetcher))),
    )
}

pub fn llm<P: LlmProvider>(provider: Arc<P>) -> Llm {
    let mut registry = ModelRegistry::new();
    registry.register_llm_provider("mock", provider);
    registry.llm("mock/test-model").expect("provider registered")
}

pub async fn assistant<P: LlmProvider>(provider: Arc<P>, config: AgentConfig) -> Assistant {
    Assistant::builder(service().await)
        .model(Some(llm(provider)))
        .config(config)
        .build()
        .await
        .expect("assistant builds")
}

pub fn scripted(script: Vec<GenerationResponse>) -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::new(script.into_iter().map(Ok).collect()))
}

pub fn text(answer: &str) -> GenerationResponse {
    GenerationResponse::from_text(answer)
}

pub fn tool_call(id: &str, name: &str, arguments: Value) -> GenerationResponse {
    GenerationResponse {
        content: vec![AssistantBlock::ToolCall(ToolCall::new(id, name, arguments))],
        usage: Usage::default(),
    }
}

/// Tool results carried by the last message of a transcript.
pub fn last_tool_results(messages: &[Message]) -> Vec<ToolResult> {
    match messages.last() {
        Some(Message::User { content }) => content
            .iter()
            .filter_map(|block| match block {
                UserBlock::ToolResult(result) => Some(result.clone()),
                UserBlock::Text(_) => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
