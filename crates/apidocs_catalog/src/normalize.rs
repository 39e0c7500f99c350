//! OpenAPI / Swagger document normalization.
//!
//! [`normalize`] turns one parsed specification into [`Endpoint`] records,
//! one per `(path, method)` operation, in declaration order.
//! [`normalize_documents`] merges several documents for the same provider.
//!
//! Local `$ref` parameters (`#/parameters/...`, `#/components/parameters/...`)
//! are resolved against the document they appear in. Other references are kept
//! as opaque schema values.

use crate::endpoint::{Endpoint, HttpMethod, Parameter};
use crate::error::CatalogError;
use indexmap::IndexMap;
use serde_json::{Map, Value, json};

const DEPRECATION_NOTICE: &str =
    "**DEPRECATED** - This endpoint is deprecated and may be removed in future versions.";

/// Normalizes a single specification document.
///
/// # Errors
///
/// Returns [`CatalogError::Parse`] when the document is not an object, has no
/// `paths` object, or declares a path item or operation that is not an object.
pub fn normalize(provider: &str, document: &Value) -> Result<Vec<Endpoint>, CatalogError> {
    let root = document
        .as_object()
        .ok_or_else(|| CatalogError::parse("specification must be a JSON object"))?;
    let paths = match root.get("paths") {
        Some(Value::Object(paths)) => paths,
        Some(_) => return Err(CatalogError::parse("`paths` must be an object")),
        None => return Err(CatalogError::parse("specification has no `paths` object")),
    };

    let version = root
        .get("info")
        .and_then(|info| info.get("version"))
        .and_then(Value::as_str)
        .map(str::to_owned);
    let consumes = string_list(root.get("consumes"));

    let mut endpoints = Vec::new();
    for (path, item) in paths {
        let item = item
            .as_object()
            .ok_or_else(|| CatalogError::parse(format!("path item '{path}' is not an object")))?;
        let shared = parameter_list(document, item.get("parameters"));

        for (key, operation) in item {
            let Some(method) = HttpMethod::from_operation_key(key) else {
                continue;
            };
            let operation = operation.as_object().ok_or_else(|| {
                CatalogError::parse(format!("operation {method} {path} is not an object"))
            })?;
            endpoints.push(build_endpoint(
                provider,
                path,
                method,
                operation,
                &shared,
                document,
                &consumes,
                version.as_deref(),
            ));
        }
    }

    Ok(endpoints)
}

/// Normalizes and merges several documents for one provider.
///
/// # Errors
///
/// Fails on the first document that [`normalize`] rejects.
pub fn normalize_documents<'a>(
    provider: &str,
    documents: impl IntoIterator<Item = &'a Value>,
) -> Result<Vec<Endpoint>, CatalogError> {
    let batches = documents
        .into_iter()
        .map(|document| normalize(provider, document))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(merge_endpoints(batches))
}

/// Merges endpoint batches from several documents of one provider.
///
/// A `(path, method)` pair declared by more than one batch keeps the
/// position of its first declaration and the content of its last.
#[must_use]
pub fn merge_endpoints(batches: impl IntoIterator<Item = Vec<Endpoint>>) -> Vec<Endpoint> {
    let mut merged: IndexMap<(String, HttpMethod), Endpoint> = IndexMap::new();
    for endpoint in batches.into_iter().flatten() {
        merged.insert((endpoint.path.clone(), endpoint.method), endpoint);
    }
    merged.into_values().collect()
}

#[expect(clippy::too_many_arguments, reason = "internal assembly helper")]
fn build_endpoint(
    provider: &str,
    path: &str,
    method: HttpMethod,
    operation: &Map<String, Value>,
    shared: &[RawParameter],
    document: &Value,
    document_consumes: &[String],
    version: Option<&str>,
) -> Endpoint {
    let summary = non_empty_str(operation.get("summary"));
    let title = summary
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{method} {path}"));
    let description = non_empty_str(operation.get("description"))
        .unwrap_or_default()
        .to_owned();

    let mut raw = shared.to_vec();
    for parameter in parameter_list(document, operation.get("parameters")) {
        match raw
            .iter_mut()
            .find(|existing| existing.name == parameter.name && existing.location == parameter.location)
        {
            Some(existing) => *existing = parameter,
            None => raw.push(parameter),
        }
    }

    let mut consumes = string_list(operation.get("consumes"));
    if consumes.is_empty() {
        consumes = document_consumes.to_vec();
    }

    let mut request_body = operation
        .get("requestBody")
        .map(|body| resolve(document, body).clone());
    let mut parameters = Vec::with_capacity(raw.len());
    for parameter in raw {
        if parameter.location == "body" {
            if request_body.is_none() {
                request_body = Some(swagger_body(&parameter, &consumes));
            }
            continue;
        }
        parameters.push(parameter.into_parameter());
    }

    let responses = operation.get("responses").filter(|r| r.is_object()).cloned();
    let examples = operation
        .get("examples")
        .or_else(|| operation.get("x-examples"))
        .cloned();
    let tags = string_list(operation.get("tags"));
    let deprecated = operation
        .get("deprecated")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let content = render_content(
        method,
        path,
        summary,
        &description,
        &parameters,
        request_body.as_ref(),
        responses.as_ref(),
        deprecated,
    );

    Endpoint {
        provider: provider.to_owned(),
        method,
        path: path.to_owned(),
        title,
        description,
        parameters,
        request_body,
        responses,
        examples,
        tags,
        deprecated,
        version: version.map(str::to_owned),
        content,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct RawParameter {
    name: String,
    location: String,
    description: Option<String>,
    required: bool,
    schema: Value,
}

impl RawParameter {
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let name = object.get("name")?.as_str()?.to_owned();
        let location = object
            .get("in")
            .and_then(Value::as_str)
            .unwrap_or("query")
            .to_owned();
        let schema = match object.get("schema") {
            Some(schema) => schema.clone(),
            // Swagger 2 keeps type information inline on the parameter.
            None => {
                let mut inline = Map::new();
                for key in ["type", "format", "items", "enum", "default"] {
                    if let Some(v) = object.get(key) {
                        inline.insert(key.to_owned(), v.clone());
                    }
                }
                Value::Object(inline)
            }
        };
        Some(Self {
            required: object
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(location == "path"),
            description: non_empty_str(object.get("description")).map(str::to_owned),
            name,
            location,
            schema,
        })
    }

    fn into_parameter(self) -> Parameter {
        Parameter {
            name: self.name,
            location: self.location,
            description: self.description,
            required: self.required,
            schema: self.schema,
        }
    }
}

fn parameter_list(document: &Value, value: Option<&Value>) -> Vec<RawParameter> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| RawParameter::from_value(resolve(document, item)))
                .collect()
        })
        .unwrap_or_default()
}

fn swagger_body(parameter: &RawParameter, consumes: &[String]) -> Value {
    let mut content = Map::new();
    let media_types: Vec<&str> = if consumes.is_empty() {
        vec!["application/json"]
    } else {
        consumes.iter().map(String::as_str).collect()
    };
    for media_type in media_types {
        content.insert(media_type.to_owned(), json!({ "schema": parameter.schema }));
    }
    let mut body = Map::new();
    if let Some(description) = &parameter.description {
        body.insert("description".into(), Value::String(description.clone()));
    }
    body.insert("required".into(), Value::Bool(parameter.required));
    body.insert("content".into(), Value::Object(content));
    Value::Object(body)
}

/// Follows a local `$ref` one level; anything else is returned unchanged.
fn resolve<'a>(document: &'a Value, value: &'a Value) -> &'a Value {
    value
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|reference| reference.strip_prefix('#'))
        .and_then(|pointer| document.pointer(pointer))
        .unwrap_or(value)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Content rendering
// ─────────────────────────────────────────────────────────────────────────────

#[expect(clippy::too_many_arguments, reason = "internal rendering helper")]
fn render_content(
    method: HttpMethod,
    path: &str,
    summary: Option<&str>,
    description: &str,
    parameters: &[Parameter],
    request_body: Option<&Value>,
    responses: Option<&Value>,
    deprecated: bool,
) -> String {
    let mut parts = vec![format!("**Endpoint:** {method} {path}")];

    if let Some(summary) = summary {
        parts.push(format!("**Summary:** {summary}"));
    }
    if !description.is_empty() {
        parts.push(format!("**Description:** {description}"));
    }

    if !parameters.is_empty() {
        let mut lines = vec!["**Parameters:**".to_owned()];
        for parameter in parameters {
            let mut line = format!("- `{}` ({})", parameter.name, parameter.location);
            if parameter.required {
                line.push_str(" *required*");
            }
            if let Some(description) = &parameter.description {
                line.push_str(": ");
                line.push_str(description);
            }
            lines.push(line);
        }
        parts.push(lines.join("\n"));
    }

    if let Some(body) = request_body {
        let mut lines = vec!["**Request Body:**".to_owned()];
        if let Some(description) = non_empty_str(body.get("description")) {
            lines.push(description.to_owned());
        }
        if let Some(content) = body.get("content").and_then(Value::as_object) {
            let media_types: Vec<&str> = content.keys().map(String::as_str).collect();
            if !media_types.is_empty() {
                lines.push(format!("Content-Types: {}", media_types.join(", ")));
            }
        }
        parts.push(lines.join("\n"));
    }

    if let Some(responses) = responses.and_then(Value::as_object)
        && !responses.is_empty()
    {
        let mut lines = vec!["**Responses:**".to_owned()];
        for (code, response) in responses {
            let description = non_empty_str(response.get("description")).unwrap_or("No description");
            lines.push(format!("- `{code}`: {description}"));
        }
        parts.push(lines.join("\n"));
    }

    if deprecated {
        parts.push(DEPRECATION_NOTICE.to_owned());
    }

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn petstore() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": { "title": "Petstore", "version": "1.0.0" },
            "paths": {
                "/pets": {
                    "get": {
                        "summary": "List all pets",
                        "tags": ["pets"],
                        "parameters": [
                            { "name": "limit", "in": "query", "description": "How many items" }
                        ],
                        "responses": { "200": { "description": "A paged array of pets" } }
                    },
                    "post": {
                        "summary": "Create a pet",
                        "requestBody": {
                            "description": "Pet to add",
                            "content": { "application/json": { "schema": { "type": "object" } } }
                        },
                        "responses": { "201": {} }
                    }
                },
                "/pets/{petId}": {
                    "parameters": [
                        { "name": "petId", "in": "path", "required": true, "description": "The id" }
                    ],
                    "get": { "summary": "Info for a specific pet", "deprecated": true },
                    "summary": "not an operation"
                }
            }
        })
    }

    #[test]
    fn one_endpoint_per_operation_in_declaration_order() {
        let endpoints = normalize("petstore", &petstore()).expect("valid document");
        let ids: Vec<String> = endpoints.iter().map(Endpoint::id).collect();
        assert_eq!(
            ids,
            [
                "petstore:/pets:GET",
                "petstore:/pets:POST",
                "petstore:/pets/{petId}:GET"
            ]
        );
        assert!(endpoints.iter().all(|e| e.version.as_deref() == Some("1.0.0")));
    }

    #[test]
    fn only_lowercase_operation_keys_are_operations() {
        let document = json!({
            "paths": {
                "/a": {
                    "get": { "summary": "lower" },
                    "GET": { "summary": "upper" },
                    "Post": { "summary": "mixed" }
                }
            }
        });
        let endpoints = normalize("svc", &document).expect("valid document");
        let ids: Vec<String> = endpoints.iter().map(Endpoint::id).collect();
        assert_eq!(ids, ["svc:/a:GET"]);
        assert_eq!(endpoints[0].title, "lower");
    }

    #[test]
    fn title_falls_back_to_method_and_path() {
        let document = json!({ "paths": { "/health": { "head": {} } } });
        let endpoints = normalize("svc", &document).expect("valid document");
        assert_eq!(endpoints[0].title, "HEAD /health");
        assert_eq!(endpoints[0].description, "");
    }

    #[test]
    fn path_level_parameters_are_merged() {
        let endpoints = normalize("petstore", &petstore()).expect("valid document");
        let detail = &endpoints[2];
        assert_eq!(detail.parameters.len(), 1);
        assert_eq!(detail.parameters[0].name, "petId");
        assert!(detail.parameters[0].required);
        assert!(detail.deprecated);
    }

    #[test]
    fn operation_parameter_overrides_path_parameter() {
        let document = json!({
            "paths": {
                "/items/{id}": {
                    "parameters": [{ "name": "id", "in": "path", "description": "shared" }],
                    "get": {
                        "parameters": [
                            { "name": "id", "in": "path", "description": "specific" },
                            { "name": "id", "in": "query" }
                        ]
                    }
                }
            }
        });
        let endpoints = normalize("svc", &document).expect("valid document");
        let params = &endpoints[0].parameters;
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].description.as_deref(), Some("specific"));
        assert_eq!(params[1].location, "query");
    }

    #[test]
    fn local_parameter_references_are_resolved() {
        let document = json!({
            "parameters": {
                "pretty": { "name": "pretty", "in": "query", "type": "string" }
            },
            "paths": {
                "/api/v1/pods": {
                    "parameters": [{ "$ref": "#/parameters/pretty" }],
                    "get": { "summary": "list pods" }
                }
            }
        });
        let endpoints = normalize("kubernetes", &document).expect("valid document");
        assert_eq!(endpoints[0].parameters[0].name, "pretty");
        assert_eq!(endpoints[0].parameters[0].schema, json!({ "type": "string" }));
    }

    #[test]
    fn swagger_body_parameter_becomes_request_body() {
        let document = json!({
            "swagger": "2.0",
            "consumes": ["application/json", "application/yaml"],
            "paths": {
                "/api/v1/namespaces": {
                    "post": {
                        "parameters": [
                            { "name": "body", "in": "body", "required": true, "schema": { "type": "object" } }
                        ]
                    }
                }
            }
        });
        let endpoints = normalize("kubernetes", &document).expect("valid document");
        let endpoint = &endpoints[0];
        assert!(endpoint.parameters.is_empty());
        let body = endpoint.request_body.as_ref().expect("body");
        assert!(body["content"]["application/yaml"].is_object());
        assert!(endpoint
            .content
            .contains("Content-Types: application/json, application/yaml"));
    }

    #[test]
    fn content_renders_sections_in_order() {
        let endpoints = normalize("petstore", &petstore()).expect("valid document");
        assert_eq!(
            endpoints[0].content,
            "**Endpoint:** GET /pets\n\n\
             **Summary:** List all pets\n\n\
             **Parameters:**\n- `limit` (query): How many items\n\n\
             **Responses:**\n- `200`: A paged array of pets"
        );
        assert!(endpoints[1].content.contains("**Request Body:**\nPet to add"));
        assert!(endpoints[1].content.contains("- `201`: No description"));
        assert!(endpoints[2].content.contains("- `petId` (path) *required*: The id"));
        assert!(endpoints[2].content.ends_with(DEPRECATION_NOTICE));
    }

    #[test]
    fn rejects_malformed_documents() {
        let cases = [
            json!([]),
            json!({ "openapi": "3.0.0" }),
            json!({ "paths": [] }),
            json!({ "paths": { "/a": "nope" } }),
            json!({ "paths": { "/a": { "get": 3 } } }),
        ];
        for document in &cases {
            let err = normalize("p", document).expect_err("should be rejected");
            assert!(matches!(err, CatalogError::Parse(_)), "{document}: {err}");
        }
    }

    #[test]
    fn merged_documents_keep_first_position_and_last_content() {
        let v1 = json!({ "paths": {
            "/a": { "get": { "summary": "old" } },
            "/b": { "get": {} }
        }});
        let v2 = json!({ "paths": {
            "/c": { "get": {} },
            "/a": { "get": { "summary": "new" } }
        }});
        let endpoints = normalize_documents("dd", [&v1, &v2]).expect("valid documents");
        let paths: Vec<&str> = endpoints.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["/a", "/b", "/c"]);
        assert_eq!(endpoints[0].title, "new");
    }
}
