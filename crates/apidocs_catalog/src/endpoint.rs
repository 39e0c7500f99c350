//! Canonical data model: providers and normalized endpoints.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────────────────

/// A documentation source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Stable identifier, e.g. `atlassian`.
    pub name: String,
    /// Human-readable name shown in results.
    pub display_name: String,
    /// API base URL; endpoint paths are appended to it.
    pub base_url: String,
    /// Landing page of the provider's documentation.
    pub documentation_url: Option<String>,
    /// Specification documents whose endpoints are merged on ingestion.
    pub spec_urls: Vec<String>,
    /// Inactive providers are hidden from retrieval.
    pub active: bool,
}

impl Provider {
    /// Creates an active provider with no specification URLs.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            base_url: base_url.into(),
            documentation_url: None,
            spec_urls: Vec::new(),
            active: true,
        }
    }

    /// Adds a specification URL.
    #[must_use]
    pub fn with_spec_url(mut self, url: impl Into<String>) -> Self {
        self.spec_urls.push(url.into());
        self
    }

    /// Sets the documentation landing page.
    #[must_use]
    pub fn with_documentation_url(mut self, url: impl Into<String>) -> Self {
        self.documentation_url = Some(url.into());
        self
    }
}

/// Seed catalog of known providers.
#[must_use]
pub fn default_providers() -> Vec<Provider> {
    vec![
        Provider::new("atlassian", "Atlassian Jira", "https://your-domain.atlassian.net")
            .with_documentation_url("https://developer.atlassian.com/cloud/jira/platform/rest/v3/")
            .with_spec_url("https://dac-static.atlassian.com/cloud/jira/platform/swagger-v3.v3.json"),
        Provider::new("kubernetes", "Kubernetes", "https://kubernetes.default.svc")
            .with_documentation_url("https://kubernetes.io/docs/reference/kubernetes-api/")
            .with_spec_url(
                "https://raw.githubusercontent.com/kubernetes/kubernetes/release-1.28/api/openapi-spec/swagger.json",
            ),
        Provider::new("datadog", "Datadog", "https://api.datadoghq.com")
            .with_documentation_url("https://docs.datadoghq.com/api/latest/")
            .with_spec_url("https://docs.datadoghq.com/api/latest/spec/v1/datadog-api-spec-v1.json")
            .with_spec_url("https://docs.datadoghq.com/api/latest/spec/v2/datadog-api-spec-v2.json"),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// HttpMethod
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP methods an operation may be declared under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl HttpMethod {
    /// All methods, in specification declaration order.
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Patch,
        Self::Head,
        Self::Options,
    ];

    /// Matches a path item field name. OpenAPI operation keys are lowercase;
    /// any other spelling is not an operation.
    #[must_use]
    pub fn from_operation_key(key: &str) -> Option<Self> {
        match key {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            "patch" => Some(Self::Patch),
            "head" => Some(Self::Head),
            "options" => Some(Self::Options),
            _ => None,
        }
    }

    /// Canonical uppercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown HTTP method '{s}'"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Endpoint
// ─────────────────────────────────────────────────────────────────────────────

/// One declared operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Where it travels: `query`, `path`, `header`, `cookie`, `formData`.
    #[serde(rename = "in")]
    pub location: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Whether callers must supply it.
    pub required: bool,
    /// JSON schema of the value; empty object when undeclared.
    pub schema: Value,
}

/// A normalized `(provider, method, path)` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Owning provider identifier.
    pub provider: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Path template, e.g. `/rest/api/3/issue/{issueIdOrKey}`.
    pub path: String,
    /// Operation summary, or `"{METHOD} {path}"` when absent.
    pub title: String,
    /// Operation description; empty when absent.
    pub description: String,
    /// Merged path-level and operation-level parameters.
    pub parameters: Vec<Parameter>,
    /// Request body declaration.
    pub request_body: Option<Value>,
    /// Responses keyed by status code.
    pub responses: Option<Value>,
    /// Declared examples.
    pub examples: Option<Value>,
    /// Operation tags.
    pub tags: Vec<String>,
    /// Whether the operation is marked deprecated.
    pub deprecated: bool,
    /// `info.version` of the source document.
    pub version: Option<String>,
    /// Markdown rendering used for snippets and model context.
    pub content: String,
}

impl Endpoint {
    /// Composite identifier, `"{provider}:{path}:{METHOD}"`.
    #[must_use]
    pub fn id(&self) -> String {
        endpoint_id(&self.provider, &self.path, self.method)
    }
}

/// Builds the identifier for a `(provider, path, method)` triple.
///
/// ```
/// use apidocs_catalog::{HttpMethod, endpoint_id};
///
/// assert_eq!(endpoint_id("petstore", "/pet/{petId}", HttpMethod::Get), "petstore:/pet/{petId}:GET");
/// ```
#[must_use]
pub fn endpoint_id(provider: &str, path: &str, method: HttpMethod) -> String {
    format!("{provider}:{path}:{method}")
}
