//! System instructions sent with every model call.

use crate::classifier::Classification;
use crate::tools::DocTool;
use apidocs_catalog::LoadedSpec;
use core::fmt::Write;

const BASE_INSTRUCTIONS: &str = "\
You are an API documentation assistant for Atlassian (Jira), Kubernetes, Datadog \
and any API described by an OpenAPI document.

Answer from the documentation tools, not from memory. Two sources exist:
- The persisted catalog of provider documentation. Query it with search_documentation \
and get_endpoint_details; list_providers shows what it holds and usage_analytics \
reports search activity and ingestion health.
- Specifications loaded at runtime from a URL. Load one with load_openapi, then use \
search_openapi and get_openapi_endpoint_details. Loaded specifications live in memory only.

When the user gives a specification URL, call load_openapi before searching it.

A good answer names the HTTP method and path, the authentication it needs, its \
parameters or request body, the expected response, and a short cURL, Python or \
JavaScript example. Be precise and brief.";

/// Per-request facts that shape the instructions.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    /// Classifier output for the query.
    pub classification: &'a Classification,
    /// Provider named by the caller, overriding the detected one.
    pub provider: Option<&'a str>,
    /// Specifications currently in the dynamic cache.
    pub loaded: &'a [LoadedSpec],
}

/// Builds the system prompt for one query.
#[must_use]
pub fn system_prompt(context: PromptContext<'_>) -> String {
    let classification = context.classification;
    let mut prompt = String::from(BASE_INSTRUCTIONS);

    prompt.push_str("\n\nQuery analysis:\n");
    let _ = writeln!(
        prompt,
        "- intent: {} (confidence {:.2})",
        classification.intent_type.as_str(),
        classification.confidence
    );
    if let Some(provider) = context.provider.or(classification.provider_hint.as_deref()) {
        let _ = writeln!(prompt, "- provider: {provider}");
    }
    if !classification.cleaned_query.is_empty() {
        let _ = writeln!(prompt, "- search terms: {}", classification.cleaned_query);
    }
    let _ = writeln!(
        prompt,
        "- start with: {}",
        tool_list(&classification.tool_set)
    );

    if !context.loaded.is_empty() {
        prompt.push_str("\nIn-memory specifications:\n");
        for spec in context.loaded {
            let _ = writeln!(
                prompt,
                "- {} ({} endpoints) from {}",
                spec.provider, spec.endpoints, spec.url
            );
        }
    }
    prompt
}

fn tool_list(tools: &[DocTool]) -> String {
    tools
        .iter()
        .map(|tool| tool.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{QueryClassifier, SessionFactors};

    #[test]
    fn includes_analysis_and_loaded_specs() {
        let classification =
            QueryClassifier::new().classify("how do I create a jira issue", SessionFactors::default());
        let loaded = vec![LoadedSpec {
            provider: "petstore".into(),
            url: "https://example.test/petstore.json".into(),
            endpoints: 3,
            title: None,
        }];
        let prompt = system_prompt(PromptContext {
            classification: &classification,
            provider: None,
            loaded: &loaded,
        });

        assert!(prompt.starts_with("You are an API documentation assistant"));
        assert!(prompt.contains("- provider: atlassian"));
        assert!(prompt.contains("\nIn-memory specifications:\n"));
        assert!(prompt.contains("- petstore (3 endpoints) from https://example.test/petstore.json"));
    }

    #[test]
    fn caller_provider_overrides_hint() {
        let classification =
            QueryClassifier::new().classify("list k8s pods", SessionFactors::default());
        let prompt = system_prompt(PromptContext {
            classification: &classification,
            provider: Some("datadog"),
            loaded: &[],
        });
        assert!(prompt.contains("- provider: datadog"));
        assert!(!prompt.contains("- provider: kubernetes"));
        assert!(!prompt.contains("In-memory specifications:"));
    }
}
