//! On-demand specification cache.
//!
//! Specifications loaded at runtime are held per provider as immutable
//! snapshots. A load builds the complete snapshot before swapping it in, so
//! concurrent searches see the previous snapshot or the new one, never a mix.
//! When two loads for one provider race, the one that finishes last wins.

use crate::endpoint::{Endpoint, HttpMethod};
use crate::error::CatalogError;
use crate::fetch::SpecFetcher;
use crate::normalize::normalize;
use crate::rank::{CleanedQuery, clamp_limit, rank};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Results returned by [`DynamicSpecCache::search_openapi`] when no limit is given.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Largest accepted search limit.
pub const MAX_SEARCH_LIMIT: usize = 50;
/// Endpoints echoed back after a load.
pub const SAMPLE_SIZE: usize = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Result types
// ─────────────────────────────────────────────────────────────────────────────

/// Short endpoint description used in load summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSummary {
    /// Endpoint identifier.
    pub id: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Path template.
    pub path: String,
    /// Title.
    pub title: String,
}

impl From<&Endpoint> for EndpointSummary {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            id: endpoint.id(),
            method: endpoint.method,
            path: endpoint.path.clone(),
            title: endpoint.title.clone(),
        }
    }
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    /// Always `"success"`.
    pub status: &'static str,
    /// Provider the specification was loaded under.
    pub provider: String,
    /// Source URL.
    pub url: String,
    /// Endpoints extracted.
    pub total_endpoints: usize,
    /// The first few endpoints, in declaration order.
    pub sample_endpoints: Vec<EndpointSummary>,
}

/// One ranked match.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// Endpoint identifier.
    pub id: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Path template.
    pub path: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Tags.
    pub tags: Vec<String>,
    /// Deprecation flag.
    pub deprecated: bool,
    /// Relevance score.
    pub relevance_score: u32,
}

/// Ranked matches from a loaded specification.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    /// Always `"success"`.
    pub status: &'static str,
    /// Provider searched.
    pub provider: String,
    /// Query as given.
    pub query: String,
    /// Matches before truncation.
    pub total_found: usize,
    /// Length of `results`.
    pub showing: usize,
    /// Matches, best first.
    pub results: Vec<SearchHit>,
}

/// Returned when searching a provider that has never been loaded.
#[derive(Debug, Clone, Serialize)]
pub struct NotLoaded {
    /// Always `"not_loaded"`.
    pub status: &'static str,
    /// Provider requested.
    pub provider: String,
    /// Explanation.
    pub message: String,
    /// What to do next.
    pub suggestion: String,
}

/// Either search results or a not-loaded notice.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SpecSearchOutcome {
    /// The provider is loaded.
    Found(SearchResults),
    /// The provider has not been loaded.
    NotLoaded(NotLoaded),
}

/// A provider currently held in the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedSpec {
    /// Provider name.
    pub provider: String,
    /// Source URL.
    pub url: String,
    /// Number of endpoints.
    pub endpoints: usize,
    /// `info.title` of the document, if any.
    pub title: Option<String>,
}

/// Search parameters for [`DynamicSpecCache::search_openapi`].
#[derive(Debug, Clone, Default)]
pub struct SpecSearch {
    /// Provider to search.
    pub provider: String,
    /// Free-text query.
    pub query: String,
    /// Only this method, when given.
    pub http_method: Option<HttpMethod>,
    /// Requested result count; clamped to `[1, MAX_SEARCH_LIMIT]`.
    pub limit: Option<i64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// DynamicSpecCache
// ─────────────────────────────────────────────────────────────────────────────

struct Snapshot {
    url: String,
    title: Option<String>,
    endpoints: Vec<Endpoint>,
    by_id: HashMap<String, usize>,
}

impl Snapshot {
    fn new(url: String, title: Option<String>, endpoints: Vec<Endpoint>) -> Self {
        let by_id = endpoints
            .iter()
            .enumerate()
            .map(|(index, endpoint)| (endpoint.id(), index))
            .collect();
        Self {
            url,
            title,
            endpoints,
            by_id,
        }
    }
}

/// Provider-keyed cache of specifications loaded on demand.
pub struct DynamicSpecCache {
    fetcher: Arc<dyn SpecFetcher>,
    snapshots: DashMap<String, Arc<Snapshot>>,
}

impl core::fmt::Debug for DynamicSpecCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicSpecCache")
            .field("providers", &self.snapshots.len())
            .finish_non_exhaustive()
    }
}

impl DynamicSpecCache {
    /// Creates an empty cache that downloads through `fetcher`.
    pub fn new(fetcher: Arc<dyn SpecFetcher>) -> Self {
        Self {
            fetcher,
            snapshots: DashMap::new(),
        }
    }

    /// Downloads, normalizes and installs the specification at `url`.
    ///
    /// On failure the provider's previous snapshot, if any, is kept.
    ///
    /// # Errors
    ///
    /// Propagates fetch and parse failures.
    pub async fn load_openapi(&self, provider: &str, url: &str) -> Result<LoadSummary, CatalogError> {
        let document = match self.fetcher.fetch(url).await {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(provider, url, error = %err, "specification load failed");
                return Err(err);
            }
        };
        self.load_document(provider, url, &document)
    }

    /// Installs an already parsed document.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Parse`] when the document is not a valid specification.
    pub fn load_document(
        &self,
        provider: &str,
        url: &str,
        document: &Value,
    ) -> Result<LoadSummary, CatalogError> {
        let endpoints = normalize(provider, document)?;
        let title = document
            .pointer("/info/title")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let summary = LoadSummary {
            status: "success",
            provider: provider.to_owned(),
            url: url.to_owned(),
            total_endpoints: endpoints.len(),
            sample_endpoints: endpoints.iter().take(SAMPLE_SIZE).map(Into::into).collect(),
        };
        self.snapshots.insert(
            provider.to_owned(),
            Arc::new(Snapshot::new(url.to_owned(), title, endpoints)),
        );
        tracing::info!(provider, url, endpoints = summary.total_endpoints, "specification loaded");
        Ok(summary)
    }

    /// Ranked search within one loaded provider.
    #[must_use]
    pub fn search_openapi(&self, search: &SpecSearch) -> SpecSearchOutcome {
        let Some(snapshot) = self.snapshot(&search.provider) else {
            return SpecSearchOutcome::NotLoaded(NotLoaded {
                status: "not_loaded",
                provider: search.provider.clone(),
                message: format!("No specification has been loaded for '{}'", search.provider),
                suggestion: format!(
                    "Call load_openapi with provider '{}' and the URL of its OpenAPI document first",
                    search.provider
                ),
            });
        };

        let limit = clamp_limit(search.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
        let candidates = snapshot
            .endpoints
            .iter()
            .filter(|e| search.http_method.is_none_or(|m| e.method == m));
        let ranked = rank(candidates, &CleanedQuery::new(&search.query));
        let total_found = ranked.len();
        let results: Vec<SearchHit> = ranked
            .into_iter()
            .take(limit)
            .map(|scored| SearchHit {
                id: scored.endpoint.id(),
                method: scored.endpoint.method,
                path: scored.endpoint.path.clone(),
                title: scored.endpoint.title.clone(),
                description: scored.endpoint.description.clone(),
                tags: scored.endpoint.tags.clone(),
                deprecated: scored.endpoint.deprecated,
                relevance_score: scored.score,
            })
            .collect();

        SpecSearchOutcome::Found(SearchResults {
            status: "success",
            provider: search.provider.clone(),
            query: search.query.clone(),
            total_found,
            showing: results.len(),
            results,
        })
    }

    /// Full record for one endpoint of a loaded provider.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when the provider is not loaded or has no
    /// endpoint with this identifier.
    pub fn get_openapi_endpoint_details(
        &self,
        provider: &str,
        id: &str,
    ) -> Result<Endpoint, CatalogError> {
        self.snapshot(provider)
            .and_then(|snapshot| {
                let index = *snapshot.by_id.get(id)?;
                snapshot.endpoints.get(index).cloned()
            })
            .ok_or_else(|| CatalogError::NotFound {
                provider: provider.to_owned(),
                id: id.to_owned(),
            })
    }

    /// Providers currently cached, sorted by name.
    #[must_use]
    pub fn loaded(&self) -> Vec<LoadedSpec> {
        let mut loaded: Vec<LoadedSpec> = self
            .snapshots
            .iter()
            .map(|entry| LoadedSpec {
                provider: entry.key().clone(),
                url: entry.url.clone(),
                endpoints: entry.endpoints.len(),
                title: entry.title.clone(),
            })
            .collect();
        loaded.sort_by(|a, b| a.provider.cmp(&b.provider));
        loaded
    }

    /// Whether a provider has been loaded.
    #[must_use]
    pub fn is_loaded(&self, provider: &str) -> bool {
        self.snapshots.contains_key(provider)
    }

    /// Drops a provider's snapshot. Returns whether one existed.
    pub fn unload(&self, provider: &str) -> bool {
        self.snapshots.remove(provider).is_some()
    }

    fn snapshot(&self, provider: &str) -> Option<Arc<Snapshot>> {
        // Clone the Arc so the shard lock is released before ranking.
        self.snapshots.get(provider).map(|entry| Arc::clone(entry.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Unreachable;

    #[async_trait]
    impl SpecFetcher for Unreachable {
        async fn fetch(&self, url: &str) -> Result<Value, CatalogError> {
            Err(CatalogError::fetch(url, "connection refused"))
        }
    }

    fn cache() -> DynamicSpecCache {
        DynamicSpecCache::new(Arc::new(Unreachable))
    }

    #[test]
    fn search_before_load_reports_not_loaded() {
        let outcome = cache().search_openapi(&SpecSearch {
            provider: "stripe".into(),
            query: "charges".into(),
            ..SpecSearch::default()
        });
        let SpecSearchOutcome::NotLoaded(notice) = outcome else {
            panic!("expected not_loaded");
        };
        assert_eq!(notice.status, "not_loaded");
        assert!(notice.suggestion.contains("load_openapi"));
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_snapshot() {
        let cache = cache();
        cache
            .load_document("svc", "mem://v1", &json!({ "paths": { "/a": { "get": {} } } }))
            .expect("valid");
        let err = cache
            .load_openapi("svc", "https://svc.example/openapi.json")
            .await
            .expect_err("fetch fails");
        assert!(matches!(err, CatalogError::Fetch { .. }));
        assert_eq!(cache.loaded()[0].endpoints, 1);
    }

    #[test]
    fn reload_swaps_whole_snapshot() {
        let cache = cache();
        cache
            .load_document("svc", "mem://v1", &json!({ "paths": { "/a": { "get": {} } } }))
            .expect("valid");
        cache
            .load_document("svc", "mem://v2", &json!({ "paths": { "/b": { "get": {} }, "/c": { "get": {} } } }))
            .expect("valid");
        assert!(cache.get_openapi_endpoint_details("svc", "svc:/a:GET").is_err());
        assert!(cache.get_openapi_endpoint_details("svc", "svc:/c:GET").is_ok());
        assert_eq!(
            cache.loaded(),
            [LoadedSpec {
                provider: "svc".into(),
                url: "mem://v2".into(),
                endpoints: 2,
                title: None,
            }]
        );
    }

    #[test]
    fn loading_the_same_document_twice_is_idempotent() {
        let cache = cache();
        let document = json!({
            "paths": {
                "/a": { "get": {}, "post": {} },
                "/b": { "get": {}, "delete": {} }
            }
        });
        let first = cache.load_document("svc", "mem://v1", &document).expect("valid");
        let second = cache.load_document("svc", "mem://v1", &document).expect("valid");
        assert_eq!(first.total_endpoints, 4);
        assert_eq!(second.total_endpoints, first.total_endpoints);
        assert_eq!(cache.loaded()[0].endpoints, 4);
    }

    #[test]
    fn empty_query_returns_first_entries_in_ingestion_order() {
        let cache = cache();
        cache
            .load_document(
                "svc",
                "mem://v1",
                &json!({
                    "paths": {
                        "/z": { "get": {} },
                        "/a": { "get": {}, "post": {} },
                        "/m": { "put": {} }
                    }
                }),
            )
            .expect("valid");

        let search = |limit| {
            let SpecSearchOutcome::Found(results) = cache.search_openapi(&SpecSearch {
                provider: "svc".into(),
                query: String::new(),
                http_method: None,
                limit: Some(limit),
            }) else {
                panic!("expected results");
            };
            results
        };

        let results = search(3);
        let ids: Vec<&str> = results.results.iter().map(|hit| hit.id.as_str()).collect();
        assert_eq!(ids, ["svc:/z:GET", "svc:/a:GET", "svc:/a:POST"]);
        assert_eq!((results.total_found, results.showing), (4, 3));
        assert!(results.results.iter().all(|hit| hit.relevance_score == 0));

        let results = search(10);
        assert_eq!(results.showing, 4);
    }

    #[test]
    fn differently_cased_method_keys_do_not_duplicate_ids() {
        let cache = cache();
        let summary = cache
            .load_document(
                "svc",
                "mem://v1",
                &json!({
                    "paths": {
                        "/a": {
                            "get": { "summary": "lower" },
                            "GET": { "summary": "upper" }
                        }
                    }
                }),
            )
            .expect("valid");
        assert_eq!(summary.total_endpoints, 1);

        let SpecSearchOutcome::Found(results) = cache.search_openapi(&SpecSearch {
            provider: "svc".into(),
            ..SpecSearch::default()
        }) else {
            panic!("expected results");
        };
        let ids: Vec<&str> = results.results.iter().map(|hit| hit.id.as_str()).collect();
        assert_eq!(ids, ["svc:/a:GET"]);
        let details = cache
            .get_openapi_endpoint_details("svc", "svc:/a:GET")
            .expect("present");
        assert_eq!(details.title, "lower");
    }

    #[test]
    fn invalid_document_is_rejected_and_not_installed() {
        let cache = cache();
        let err = cache
            .load_document("svc", "mem://bad", &json!({ "openapi": "3.0.0" }))
            .expect_err("no paths");
        assert!(matches!(err, CatalogError::Parse(_)));
        assert!(!cache.is_loaded("svc"));
    }

    #[test]
    fn details_not_found_echoes_provider_and_id() {
        let err = cache()
            .get_openapi_endpoint_details("svc", "svc:/missing:GET")
            .expect_err("nothing loaded");
        let CatalogError::NotFound { provider, id } = err else {
            panic!("expected NotFound");
        };
        assert_eq!((provider.as_str(), id.as_str()), ("svc", "svc:/missing:GET"));
    }

    #[test]
    fn unload_removes_provider() {
        let cache = cache();
        cache
            .load_document("svc", "mem://v1", &json!({ "paths": {} }))
            .expect("valid");
        assert!(cache.unload("svc"));
        assert!(!cache.unload("svc"));
    }
}
