//! Retrieval operations over the persisted catalog and the spec cache.
//!
//! [`DocsService`] is what the assistant's tools call. Its results serialize
//! to the JSON handed back to the model.

use crate::activity::{IngestHistory, ProviderIngestStats, QueryLog, QueryRecord, SearchAnalytics};
use crate::cache::{DynamicSpecCache, LoadSummary, LoadedSpec, SpecSearch, SpecSearchOutcome};
use crate::endpoint::{Endpoint, HttpMethod, Parameter};
use crate::error::CatalogError;
use crate::rank::{clamp_limit, truncate_chars};
use crate::store::{CatalogQuery, CatalogStore};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Results returned by [`DocsService::search_documentation`] when no limit is given.
pub const DEFAULT_DOC_LIMIT: usize = 5;
/// Largest accepted documentation search limit.
pub const MAX_DOC_LIMIT: usize = 20;
/// Descriptions in search hits are cut to this many characters.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 300;

const ALL: &str = "all";

/// Parameters for [`DocsService::search_documentation`].
#[derive(Debug, Clone, Default)]
pub struct DocSearch {
    /// Free-text query.
    pub query: String,
    /// Provider name; `None` or `"all"` searches every active provider.
    pub provider: Option<String>,
    /// Only this method, when given.
    pub http_method: Option<HttpMethod>,
    /// Requested result count; clamped to `[1, MAX_DOC_LIMIT]`.
    pub limit: Option<i64>,
}

/// One documentation search hit.
#[derive(Debug, Clone, Serialize)]
pub struct DocHit {
    /// Endpoint identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Description, truncated.
    pub description: String,
    /// Provider display name.
    pub provider: String,
    /// Path template.
    pub endpoint_path: String,
    /// HTTP method.
    pub http_method: HttpMethod,
    /// Relevance score.
    pub relevance_score: u32,
    /// `"{METHOD} {path} - {title}"`.
    pub summary: String,
}

/// Documentation search results.
#[derive(Debug, Clone, Serialize)]
pub struct DocSearchResults {
    /// Query as given.
    pub query: String,
    /// Provider filter, or `"all"`.
    pub provider: String,
    /// Method filter, or `"all"`.
    pub http_method: String,
    /// Matches before truncation.
    pub total_found: usize,
    /// Matches, best first.
    pub results: Vec<DocHit>,
}

/// Full record for one persisted endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointDetails {
    /// Endpoint identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Provider display name.
    pub provider: String,
    /// Path template.
    pub endpoint_path: String,
    /// HTTP method.
    pub http_method: HttpMethod,
    /// Parameters.
    pub parameters: Vec<Parameter>,
    /// Request body declaration.
    pub request_body: Option<Value>,
    /// Responses keyed by status code.
    pub response_schema: Option<Value>,
    /// Declared examples.
    pub examples: Option<Value>,
    /// Rendered markdown.
    pub content: String,
    /// Tags.
    pub tags: Vec<String>,
    /// Deprecation flag.
    pub deprecated: bool,
    /// Specification version.
    pub version: Option<String>,
    /// Provider base URL joined with the path.
    pub full_url: String,
    /// Provider documentation landing page.
    pub documentation_url: Option<String>,
}

/// One provider in [`ProviderListing`].
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    /// Provider name.
    pub name: String,
    /// Display name.
    pub display_name: String,
    /// API base URL.
    pub base_url: String,
    /// Documentation landing page.
    pub documentation_url: Option<String>,
    /// Endpoints in the persisted catalog.
    pub endpoint_count: usize,
    /// Whether the provider is searchable.
    pub is_active: bool,
}

/// Active providers plus the specifications loaded at runtime.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderListing {
    /// Length of `providers`.
    pub total_providers: usize,
    /// Active catalog providers.
    pub providers: Vec<ProviderInfo>,
    /// Providers held in the spec cache.
    pub loaded_specs: Vec<LoadedSpec>,
}

/// Catalog size, search activity and ingestion health.
#[derive(Debug, Clone, Serialize)]
pub struct UsageAnalytics {
    /// Registered providers.
    pub total_providers: usize,
    /// Providers visible to retrieval.
    pub active_providers: usize,
    /// Endpoints in the persisted catalog.
    pub total_endpoints: usize,
    /// Documentation search activity.
    pub searches: SearchAnalytics,
    /// Ingestion health per provider.
    pub ingestion: Vec<ProviderIngestStats>,
}

/// Retrieval facade used by the assistant's tools.
#[derive(Clone)]
pub struct DocsService {
    store: Arc<dyn CatalogStore>,
    cache: Arc<DynamicSpecCache>,
    queries: Arc<QueryLog>,
    ingests: Arc<IngestHistory>,
}

impl core::fmt::Debug for DocsService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DocsService")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl DocsService {
    /// Creates a service over a store and a spec cache.
    pub fn new(store: Arc<dyn CatalogStore>, cache: Arc<DynamicSpecCache>) -> Self {
        Self {
            store,
            cache,
            queries: Arc::new(QueryLog::default()),
            ingests: Arc::new(IngestHistory::default()),
        }
    }

    /// Replaces the query log, e.g. to change its capacity.
    #[must_use]
    pub fn with_query_log(mut self, queries: Arc<QueryLog>) -> Self {
        self.queries = queries;
        self
    }

    /// Searches recorded by [`Self::search_documentation`].
    #[must_use]
    pub fn query_log(&self) -> &Arc<QueryLog> {
        &self.queries
    }

    /// Ingestion runs reported by [`Self::usage_analytics`]. Hand it to
    /// [`Ingestor::with_history`](crate::Ingestor::with_history) so runs
    /// show up here.
    #[must_use]
    pub fn ingest_history(&self) -> &Arc<IngestHistory> {
        &self.ingests
    }

    /// The persisted catalog.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// The runtime spec cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<DynamicSpecCache> {
        &self.cache
    }

    /// Ranked search over the persisted catalog.
    ///
    /// # Errors
    ///
    /// [`CatalogError::UnknownProvider`] when a provider filter names no
    /// registered provider.
    pub async fn search_documentation(
        &self,
        search: &DocSearch,
    ) -> Result<DocSearchResults, CatalogError> {
        let provider = search
            .provider
            .as_deref()
            .filter(|p| !p.eq_ignore_ascii_case(ALL));
        if let Some(name) = provider {
            let known = self.store.providers().await?.iter().any(|p| p.name == name);
            if !known {
                return Err(CatalogError::UnknownProvider(name.to_owned()));
            }
        }

        let mut query = CatalogQuery::new(
            search.query.clone(),
            clamp_limit(search.limit, DEFAULT_DOC_LIMIT, MAX_DOC_LIMIT),
        );
        if let Some(name) = provider {
            query = query.provider(name);
        }
        if let Some(method) = search.http_method {
            query = query.method(method);
        }

        let page = self.store.query(&query).await?;
        self.queries.record(QueryRecord {
            query: search.query.clone(),
            provider: provider.map(str::to_owned),
            http_method: search.http_method,
            results_count: page.total_found,
            searched_at: Utc::now(),
        });
        tracing::debug!(
            query = %search.query,
            provider = provider.unwrap_or(ALL),
            total_found = page.total_found,
            "documentation search"
        );
        let results = page
            .hits
            .into_iter()
            .map(|hit| {
                let endpoint = hit.endpoint;
                DocHit {
                    id: endpoint.id(),
                    summary: format!("{} {} - {}", endpoint.method, endpoint.path, endpoint.title),
                    description: truncate_chars(&endpoint.description, DESCRIPTION_PREVIEW_CHARS),
                    title: endpoint.title,
                    provider: hit.provider_display_name,
                    endpoint_path: endpoint.path,
                    http_method: endpoint.method,
                    relevance_score: hit.score,
                }
            })
            .collect();

        Ok(DocSearchResults {
            query: search.query.clone(),
            provider: provider.unwrap_or(ALL).to_owned(),
            http_method: search
                .http_method
                .map_or_else(|| ALL.to_owned(), |m| m.as_str().to_owned()),
            total_found: page.total_found,
            results,
        })
    }

    /// Full record for one persisted endpoint.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when no endpoint has this identifier.
    pub async fn get_endpoint_details(&self, id: &str) -> Result<EndpointDetails, CatalogError> {
        let stored = self.store.endpoint(id).await?.ok_or_else(|| CatalogError::NotFound {
            provider: id.split(':').next().unwrap_or_default().to_owned(),
            id: id.to_owned(),
        })?;
        let provider = stored.provider;
        let Endpoint {
            method,
            path,
            title,
            description,
            parameters,
            request_body,
            responses,
            examples,
            tags,
            deprecated,
            version,
            content,
            ..
        } = stored.endpoint;

        Ok(EndpointDetails {
            id: id.to_owned(),
            full_url: format!("{}{}", provider.base_url.trim_end_matches('/'), path),
            title,
            description,
            provider: provider.display_name,
            endpoint_path: path,
            http_method: method,
            parameters,
            request_body,
            response_schema: responses,
            examples,
            content,
            tags,
            deprecated,
            version,
            documentation_url: provider.documentation_url,
        })
    }

    /// Active providers with endpoint counts, plus loaded specifications.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list_providers(&self) -> Result<ProviderListing, CatalogError> {
        let mut providers = Vec::new();
        for provider in self.store.providers().await? {
            if !provider.active {
                continue;
            }
            let endpoint_count = self.store.endpoint_count(&provider.name).await?;
            providers.push(ProviderInfo {
                name: provider.name,
                display_name: provider.display_name,
                base_url: provider.base_url,
                documentation_url: provider.documentation_url,
                endpoint_count,
                is_active: provider.active,
            });
        }
        Ok(ProviderListing {
            total_providers: providers.len(),
            providers,
            loaded_specs: self.cache.loaded(),
        })
    }

    /// Provider and endpoint totals with search and ingestion activity.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn usage_analytics(&self) -> Result<UsageAnalytics, CatalogError> {
        let providers = self.store.providers().await?;
        let mut total_endpoints = 0;
        for provider in &providers {
            total_endpoints += self.store.endpoint_count(&provider.name).await?;
        }
        Ok(UsageAnalytics {
            total_providers: providers.len(),
            active_providers: providers.iter().filter(|p| p.active).count(),
            total_endpoints,
            searches: self.queries.analytics(Utc::now()),
            ingestion: self.ingests.provider_stats(),
        })
    }

    /// See [`DynamicSpecCache::load_openapi`].
    ///
    /// # Errors
    ///
    /// Propagates fetch and parse failures.
    pub async fn load_openapi(&self, provider: &str, url: &str) -> Result<LoadSummary, CatalogError> {
        self.cache.load_openapi(provider, url).await
    }

    /// See [`DynamicSpecCache::search_openapi`].
    #[must_use]
    pub fn search_openapi(&self, search: &SpecSearch) -> SpecSearchOutcome {
        self.cache.search_openapi(search)
    }

    /// See [`DynamicSpecCache::get_openapi_endpoint_details`].
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when the identifier is not cached for the provider.
    pub fn get_openapi_endpoint_details(
        &self,
        provider: &str,
        id: &str,
    ) -> Result<Endpoint, CatalogError> {
        self.cache.get_openapi_endpoint_details(provider, id)
    }
}
