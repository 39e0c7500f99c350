//! Documentation tools exposed to the language model.
//!
//! Each tool is a [`DocTool`] variant. Dispatch is by variant, and every
//! tool definition is validated when [`documentation_tools`] registers it.

use apidocs_catalog::{CatalogError, DocSearch, DocsService, HttpMethod, SpecSearch};
use apidocs_models::llm::ToolDefinition;
use apidocs_tools::tool::ToolFuture;
use apidocs_tools::{
    FunctionMetadata, ParameterInfo, RegistrationError, Tool, ToolArgs, ToolError, ToolRegistry,
};
use core::fmt;
use core::str::FromStr;
use serde::Serialize;
use serde_json::{Value, json};

/// Identity of a documentation tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocTool {
    /// Ranked search over the persisted catalog.
    SearchDocumentation,
    /// Full record of a persisted endpoint.
    GetEndpointDetails,
    /// Active providers and loaded specifications.
    ListProviders,
    /// Load a specification from a URL into the cache.
    LoadOpenapi,
    /// Ranked search within a loaded specification.
    SearchOpenapi,
    /// Full record of a cached endpoint.
    GetOpenapiEndpointDetails,
    /// Catalog totals, search activity and ingestion health.
    UsageAnalytics,
}

impl DocTool {
    /// Every tool, in advertisement order.
    pub const ALL: [Self; 7] = [
        Self::SearchDocumentation,
        Self::GetEndpointDetails,
        Self::ListProviders,
        Self::LoadOpenapi,
        Self::SearchOpenapi,
        Self::GetOpenapiEndpointDetails,
        Self::UsageAnalytics,
    ];

    /// Tool name as advertised to the model.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SearchDocumentation => "search_documentation",
            Self::GetEndpointDetails => "get_endpoint_details",
            Self::ListProviders => "list_providers",
            Self::LoadOpenapi => "load_openapi",
            Self::SearchOpenapi => "search_openapi",
            Self::GetOpenapiEndpointDetails => "get_openapi_endpoint_details",
            Self::UsageAnalytics => "usage_analytics",
        }
    }

    fn metadata(self, providers: &[String]) -> FunctionMetadata {
        let meta = FunctionMetadata::new(self.name());
        match self {
            Self::SearchDocumentation => meta
                .with_description(
                    "Search the persisted API documentation of the known providers. \
                     Returns ranked endpoints with their identifiers.",
                )
                .add_parameter(
                    ParameterInfo::of::<String>("query")
                        .describe("Keywords describing the endpoint, e.g. 'create issue'"),
                )
                .add_parameter(
                    ParameterInfo::of::<String>("provider")
                        .describe("Provider to search, or 'all'")
                        .with_enum(providers.iter().map(String::as_str).chain(["all"]))
                        .with_default("all"),
                )
                .add_parameter(
                    ParameterInfo::of::<String>("http_method")
                        .describe("Restrict to one HTTP method, or 'all'")
                        .with_enum(["GET", "POST", "PUT", "DELETE", "PATCH", "all"])
                        .with_default("all"),
                )
                .add_parameter(
                    ParameterInfo::of::<i64>("limit")
                        .describe("Maximum number of results")
                        .with_range(1, 20)
                        .with_default(5),
                ),
            Self::GetEndpointDetails => meta
                .with_description(
                    "Get the full documentation of one persisted endpoint: parameters, \
                     request body, responses and full URL.",
                )
                .add_parameter(
                    ParameterInfo::of::<String>("endpoint_id")
                        .describe("Identifier returned by search_documentation")
                        .with_min_length(1),
                ),
            Self::ListProviders => meta.with_description(
                "List the available documentation providers with endpoint counts, \
                 and any specifications loaded at runtime.",
            ),
            Self::LoadOpenapi => meta
                .with_description(
                    "Load an OpenAPI or Swagger JSON document from a URL and cache it \
                     under a provider name for search_openapi.",
                )
                .add_parameter(
                    ParameterInfo::of::<String>("provider")
                        .describe("Name to cache the specification under")
                        .with_min_length(1),
                )
                .add_parameter(
                    ParameterInfo::of::<String>("url")
                        .describe("URL of the specification document")
                        .with_min_length(1),
                ),
            Self::SearchOpenapi => meta
                .with_description(
                    "Search a specification previously loaded with load_openapi.",
                )
                .add_parameter(
                    ParameterInfo::of::<String>("provider")
                        .describe("Provider name used with load_openapi"),
                )
                .add_parameter(ParameterInfo::of::<String>("query").describe("Search keywords"))
                .add_parameter(
                    ParameterInfo::of::<String>("http_method")
                        .describe("Restrict to one HTTP method")
                        .with_enum(HttpMethod::ALL.iter().map(|m| m.as_str()))
                        .optional(),
                )
                .add_parameter(
                    ParameterInfo::of::<i64>("limit")
                        .describe("Maximum number of results")
                        .with_range(1, 50)
                        .with_default(10),
                ),
            Self::GetOpenapiEndpointDetails => meta
                .with_description("Get the full record of an endpoint from a loaded specification.")
                .add_parameter(
                    ParameterInfo::of::<String>("provider")
                        .describe("Provider name used with load_openapi"),
                )
                .add_parameter(
                    ParameterInfo::of::<String>("id")
                        .describe("Identifier returned by search_openapi"),
                ),
            Self::UsageAnalytics => meta.with_description(
                "Report catalog totals, the most frequent documentation searches \
                 and each provider's ingestion success rate and last update.",
            ),
        }
    }

    async fn run(self, service: &DocsService, args: ToolArgs) -> Result<Value, ToolError> {
        match self {
            Self::SearchDocumentation => {
                let search = DocSearch {
                    query: args.required("query")?,
                    provider: args.optional("provider")?,
                    http_method: method_filter(args.optional("http_method")?)?,
                    limit: args.optional("limit")?,
                };
                let results = service
                    .search_documentation(&search)
                    .await
                    .map_err(catalog_error)?;
                Ok(serde_json::to_value(results)?)
            }
            Self::GetEndpointDetails => {
                let id: String = args.required("endpoint_id")?;
                let details = service
                    .get_endpoint_details(&id)
                    .await
                    .map_err(catalog_error)?;
                Ok(serde_json::to_value(details)?)
            }
            Self::ListProviders => {
                let listing = service.list_providers().await.map_err(catalog_error)?;
                Ok(serde_json::to_value(listing)?)
            }
            Self::LoadOpenapi => {
                let provider: String = args.required("provider")?;
                let url: String = args.required("url")?;
                let summary = service
                    .load_openapi(&provider, &url)
                    .await
                    .map_err(catalog_error)?;
                Ok(serde_json::to_value(summary)?)
            }
            Self::SearchOpenapi => {
                let search = SpecSearch {
                    provider: args.required("provider")?,
                    query: args.required("query")?,
                    http_method: method_filter(args.optional("http_method")?)?,
                    limit: args.optional("limit")?,
                };
                Ok(serde_json::to_value(service.search_openapi(&search))?)
            }
            Self::GetOpenapiEndpointDetails => {
                let provider: String = args.required("provider")?;
                let id: String = args.required("id")?;
                let endpoint = service
                    .get_openapi_endpoint_details(&provider, &id)
                    .map_err(catalog_error)?;
                let mut value = serde_json::to_value(endpoint)?;
                if let Some(object) = value.as_object_mut() {
                    object.insert("id".to_owned(), Value::String(id));
                }
                Ok(json!({ "status": "success", "endpoint": value }))
            }
            Self::UsageAnalytics => {
                let usage = service.usage_analytics().await.map_err(catalog_error)?;
                Ok(serde_json::to_value(usage)?)
            }
        }
    }
}

impl fmt::Display for DocTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DocTool {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name() == s)
            .ok_or_else(|| ToolError::not_found(format!("unknown tool: {s}")))
    }
}

fn method_filter(raw: Option<String>) -> Result<Option<HttpMethod>, ToolError> {
    match raw.as_deref() {
        None => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|reason: String| ToolError::invalid_field("http_method", reason)),
    }
}

fn catalog_error(err: CatalogError) -> ToolError {
    match err {
        CatalogError::NotFound { .. } => ToolError::not_found(err.to_string()),
        CatalogError::UnknownProvider(ref name) => {
            ToolError::invalid_field("provider", format!("unknown provider '{name}'"))
        }
        CatalogError::Fetch { .. } | CatalogError::Parse(_) => ToolError::execution(err.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool adapter
// ─────────────────────────────────────────────────────────────────────────────

/// A [`DocTool`] bound to the service it runs against.
pub struct DocumentationTool {
    kind: DocTool,
    definition: ToolDefinition,
    service: DocsService,
}

impl DocumentationTool {
    /// Binds `kind` to `service`. `providers` populates the provider enum of
    /// `search_documentation`.
    #[must_use]
    pub fn new(kind: DocTool, service: DocsService, providers: &[String]) -> Self {
        Self {
            definition: kind.metadata(providers).to_tool_definition(),
            kind,
            service,
        }
    }

    /// Which tool this is.
    #[must_use]
    pub fn kind(&self) -> DocTool {
        self.kind
    }
}

impl Tool for DocumentationTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn execute(&self, args: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let args = ToolArgs::from_value(args)?;
            tracing::debug!(tool = self.kind.name(), "running documentation tool");
            self.kind.run(&self.service, args).await
        })
    }
}

/// Registers every [`DocTool`] against `service`.
///
/// # Errors
///
/// Returns the first definition the registry rejects.
pub fn documentation_tools(
    service: &DocsService,
    providers: &[String],
) -> Result<ToolRegistry, RegistrationError> {
    let mut registry = ToolRegistry::new();
    for kind in DocTool::ALL {
        registry.try_register(DocumentationTool::new(kind, service.clone(), providers))?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for tool in DocTool::ALL {
            assert_eq!(tool.name().parse::<DocTool>().expect("known"), tool);
        }
        assert!("delete_everything".parse::<DocTool>().is_err());
    }

    #[test]
    fn search_schema_lists_providers_and_defaults() {
        let providers = vec!["atlassian".to_owned(), "kubernetes".to_owned()];
        let definition = DocTool::SearchDocumentation
            .metadata(&providers)
            .to_tool_definition();
        let params = &definition.parameters;
        assert_eq!(params["required"], json!(["query"]));
        assert_eq!(
            params["properties"]["provider"]["enum"],
            json!(["atlassian", "kubernetes", "all"])
        );
        assert_eq!(params["properties"]["limit"]["maximum"], json!(20));
    }

    #[test]
    fn method_filter_accepts_all_and_case() {
        assert_eq!(method_filter(None).expect("ok"), None);
        assert_eq!(method_filter(Some("all".into())).expect("ok"), None);
        assert_eq!(
            method_filter(Some("post".into())).expect("ok"),
            Some(HttpMethod::Post)
        );
        assert!(method_filter(Some("TRACE".into())).is_err());
    }

    #[test]
    fn catalog_errors_map_to_tool_error_kinds() {
        let not_found = catalog_error(CatalogError::NotFound {
            provider: "p".into(),
            id: "p:/x:GET".into(),
        });
        assert_eq!(not_found.kind(), "not_found");
        let unknown = catalog_error(CatalogError::UnknownProvider("zzz".into()));
        assert_eq!(unknown.kind(), "validation_error");
    }
}
