//! Persisted endpoint catalog.
//!
//! [`CatalogStore`] is the seam between retrieval and whatever holds the
//! endpoints. [`MemoryCatalog`] is the in-process implementation; each
//! provider's endpoints live behind one [`Arc`] that upserts replace whole, so
//! readers never observe a half-written provider.

use crate::endpoint::{Endpoint, HttpMethod, Provider};
use crate::error::CatalogError;
use crate::rank::{CleanedQuery, rank};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Query / result types
// ─────────────────────────────────────────────────────────────────────────────

/// A retrieval request against the persisted catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    /// Restrict to these providers; `None` means every active provider.
    pub providers: Option<Vec<String>>,
    /// Restrict to these methods; `None` means any.
    pub methods: Option<Vec<HttpMethod>>,
    /// Free-text query, cleaned before scoring.
    pub text: String,
    /// Maximum number of hits returned.
    pub limit: usize,
}

impl CatalogQuery {
    /// Creates an unfiltered query.
    pub fn new(text: impl Into<String>, limit: usize) -> Self {
        Self {
            text: text.into(),
            limit,
            ..Self::default()
        }
    }

    /// Restricts to a single provider.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.providers.get_or_insert_with(Vec::new).push(provider.into());
        self
    }

    /// Restricts to a single method.
    #[must_use]
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.methods.get_or_insert_with(Vec::new).push(method);
        self
    }
}

/// One matched endpoint with its provider's display name.
#[derive(Debug, Clone)]
pub struct CatalogHit {
    /// Matched endpoint.
    pub endpoint: Endpoint,
    /// Display name of the owning provider.
    pub provider_display_name: String,
    /// Relevance score.
    pub score: u32,
}

/// Hits for a query, plus the number of matches before truncation.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    /// Matches before `limit` was applied.
    pub total_found: usize,
    /// At most `limit` hits, best first.
    pub hits: Vec<CatalogHit>,
}

/// Counts produced by an upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    /// Endpoints now stored for the provider.
    pub total: usize,
    /// Identifiers not previously stored.
    pub new: usize,
    /// Identifiers that replaced an existing record.
    pub updated: usize,
    /// Previously stored identifiers absent from the new set.
    pub removed: usize,
}

/// A single endpoint looked up by identifier.
#[derive(Debug, Clone)]
pub struct StoredEndpoint {
    /// The endpoint record.
    pub endpoint: Endpoint,
    /// Its provider.
    pub provider: Provider,
}

// ─────────────────────────────────────────────────────────────────────────────
// CatalogStore
// ─────────────────────────────────────────────────────────────────────────────

/// Storage backend for providers and their endpoints.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts or replaces a provider record, keeping its endpoints.
    async fn upsert_provider(&self, provider: Provider) -> Result<(), CatalogError>;

    /// All providers, in registration order.
    async fn providers(&self) -> Result<Vec<Provider>, CatalogError>;

    /// Replaces the provider's endpoint set with `endpoints`.
    ///
    /// Readers observe either the old set or the new one.
    async fn upsert_endpoints(
        &self,
        provider: &str,
        endpoints: Vec<Endpoint>,
    ) -> Result<UpsertStats, CatalogError>;

    /// Ranked retrieval over active providers.
    async fn query(&self, query: &CatalogQuery) -> Result<CatalogPage, CatalogError>;

    /// Looks up one endpoint by its `provider:path:METHOD` identifier.
    async fn endpoint(&self, id: &str) -> Result<Option<StoredEndpoint>, CatalogError>;

    /// Number of endpoints stored for the provider.
    async fn endpoint_count(&self, provider: &str) -> Result<usize, CatalogError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryCatalog
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ProviderEntry {
    provider: Option<Provider>,
    endpoints: Arc<Vec<Endpoint>>,
}

/// In-memory [`CatalogStore`].
#[derive(Default)]
pub struct MemoryCatalog {
    entries: RwLock<IndexMap<String, ProviderEntry>>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog pre-populated with provider records.
    #[must_use]
    pub fn with_providers(providers: impl IntoIterator<Item = Provider>) -> Self {
        let catalog = Self::new();
        {
            let mut entries = catalog.entries.write();
            for provider in providers {
                let key = provider.name.clone();
                entries.entry(key).or_default().provider = Some(provider);
            }
        }
        catalog
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn upsert_provider(&self, provider: Provider) -> Result<(), CatalogError> {
        let mut entries = self.entries.write();
        let key = provider.name.clone();
        entries.entry(key).or_default().provider = Some(provider);
        Ok(())
    }

    async fn providers(&self) -> Result<Vec<Provider>, CatalogError> {
        Ok(self
            .entries
            .read()
            .values()
            .filter_map(|entry| entry.provider.clone())
            .collect())
    }

    async fn upsert_endpoints(
        &self,
        provider: &str,
        endpoints: Vec<Endpoint>,
    ) -> Result<UpsertStats, CatalogError> {
        let previous = {
            let entries = self.entries.read();
            match entries.get(provider) {
                Some(entry) if entry.provider.is_some() => Arc::clone(&entry.endpoints),
                _ => return Err(CatalogError::UnknownProvider(provider.to_owned())),
            }
        };

        let old_ids: HashSet<String> = previous.iter().map(Endpoint::id).collect();
        let mut deduped: IndexMap<String, Endpoint> = IndexMap::with_capacity(endpoints.len());
        for mut endpoint in endpoints {
            endpoint.provider = provider.to_owned();
            deduped.insert(endpoint.id(), endpoint);
        }
        let new = deduped.keys().filter(|id| !old_ids.contains(*id)).count();
        let stats = UpsertStats {
            total: deduped.len(),
            new,
            updated: deduped.len() - new,
            removed: old_ids.iter().filter(|id| !deduped.contains_key(*id)).count(),
        };
        let replacement = Arc::new(deduped.into_values().collect::<Vec<_>>());

        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(provider)
            .ok_or_else(|| CatalogError::UnknownProvider(provider.to_owned()))?;
        entry.endpoints = replacement;
        tracing::debug!(
            provider,
            total = stats.total,
            new = stats.new,
            removed = stats.removed,
            "replaced provider endpoints"
        );
        Ok(stats)
    }

    async fn query(&self, query: &CatalogQuery) -> Result<CatalogPage, CatalogError> {
        let snapshot: Vec<(Provider, Arc<Vec<Endpoint>>)> = {
            let entries = self.entries.read();
            entries
                .values()
                .filter_map(|entry| {
                    let provider = entry.provider.as_ref()?;
                    let wanted = query
                        .providers
                        .as_ref()
                        .is_none_or(|names| names.iter().any(|n| n == &provider.name));
                    (provider.active && wanted)
                        .then(|| (provider.clone(), Arc::clone(&entry.endpoints)))
                })
                .collect()
        };

        let display_names: HashMap<&str, &str> = snapshot
            .iter()
            .map(|(p, _)| (p.name.as_str(), p.display_name.as_str()))
            .collect();
        let candidates = snapshot.iter().flat_map(|(_, endpoints)| {
            endpoints
                .iter()
                .filter(|e| query.methods.as_ref().is_none_or(|m| m.contains(&e.method)))
        });

        let ranked = rank(candidates, &CleanedQuery::new(&query.text));
        let total_found = ranked.len();
        let hits = ranked
            .into_iter()
            .take(query.limit.max(1))
            .map(|scored| CatalogHit {
                provider_display_name: display_names
                    .get(scored.endpoint.provider.as_str())
                    .copied()
                    .unwrap_or(scored.endpoint.provider.as_str())
                    .to_owned(),
                endpoint: scored.endpoint.clone(),
                score: scored.score,
            })
            .collect();

        Ok(CatalogPage { total_found, hits })
    }

    async fn endpoint(&self, id: &str) -> Result<Option<StoredEndpoint>, CatalogError> {
        let entries = self.entries.read();
        for entry in entries.values() {
            let Some(provider) = &entry.provider else {
                continue;
            };
            let owned = id
                .strip_prefix(provider.name.as_str())
                .is_some_and(|rest| rest.starts_with(':'));
            if !owned {
                continue;
            }
            if let Some(endpoint) = entry.endpoints.iter().find(|e| e.id() == id) {
                return Ok(Some(StoredEndpoint {
                    endpoint: endpoint.clone(),
                    provider: provider.clone(),
                }));
            }
        }
        Ok(None)
    }

    async fn endpoint_count(&self, provider: &str) -> Result<usize, CatalogError> {
        Ok(self
            .entries
            .read()
            .get(provider)
            .map_or(0, |entry| entry.endpoints.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::json;

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::with_providers([
            Provider::new("alpha", "Alpha Cloud", "https://alpha.example"),
            Provider::new("beta", "Beta Ops", "https://beta.example"),
        ])
    }

    fn endpoints(provider: &str, paths: &[(&str, &str)]) -> Vec<Endpoint> {
        let mut map = serde_json::Map::new();
        for (path, summary) in paths {
            map.insert((*path).to_owned(), json!({ "get": { "summary": summary } }));
        }
        normalize(provider, &json!({ "paths": map })).expect("valid document")
    }

    #[tokio::test]
    async fn upsert_replaces_provider_set() {
        let store = catalog();
        let first = store
            .upsert_endpoints("alpha", endpoints("alpha", &[("/a", "A"), ("/b", "B")]))
            .await
            .expect("upsert");
        assert_eq!(first, UpsertStats { total: 2, new: 2, updated: 0, removed: 0 });

        let second = store
            .upsert_endpoints("alpha", endpoints("alpha", &[("/b", "B2"), ("/c", "C")]))
            .await
            .expect("upsert");
        assert_eq!(second, UpsertStats { total: 2, new: 1, updated: 1, removed: 1 });
        assert_eq!(store.endpoint_count("alpha").await.expect("count"), 2);

        let b = store.endpoint("alpha:/b:GET").await.expect("lookup").expect("present");
        assert_eq!(b.endpoint.title, "B2");
        assert!(store.endpoint("alpha:/a:GET").await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn upsert_for_unknown_provider_fails() {
        let store = catalog();
        let err = store
            .upsert_endpoints("gamma", Vec::new())
            .await
            .expect_err("unknown provider");
        assert!(matches!(err, CatalogError::UnknownProvider(name) if name == "gamma"));
    }

    #[tokio::test]
    async fn query_filters_and_enriches() {
        let store = catalog();
        store
            .upsert_endpoints("alpha", endpoints("alpha", &[("/issues", "Create issue")]))
            .await
            .expect("upsert");
        store
            .upsert_endpoints("beta", endpoints("beta", &[("/issues", "List issues")]))
            .await
            .expect("upsert");

        let page = store
            .query(&CatalogQuery::new("issue", 10).provider("beta"))
            .await
            .expect("query");
        assert_eq!(page.total_found, 1);
        assert_eq!(page.hits[0].provider_display_name, "Beta Ops");

        let page = store
            .query(&CatalogQuery::new("issue", 10).method(HttpMethod::Post))
            .await
            .expect("query");
        assert_eq!(page.total_found, 0);
    }

    #[tokio::test]
    async fn inactive_providers_are_hidden() {
        let store = catalog();
        store
            .upsert_endpoints("alpha", endpoints("alpha", &[("/x", "X")]))
            .await
            .expect("upsert");
        let mut alpha = Provider::new("alpha", "Alpha Cloud", "https://alpha.example");
        alpha.active = false;
        store.upsert_provider(alpha).await.expect("provider");

        let page = store.query(&CatalogQuery::new("x", 5)).await.expect("query");
        assert_eq!(page.total_found, 0);
        // Re-registering a provider keeps its endpoints.
        assert_eq!(store.endpoint_count("alpha").await.expect("count"), 1);
    }

    #[tokio::test]
    async fn limit_truncates_but_total_counts_all() {
        let store = catalog();
        let paths: Vec<(String, String)> =
            (0..12).map(|i| (format!("/widgets/{i}"), format!("Widget {i}"))).collect();
        let refs: Vec<(&str, &str)> = paths.iter().map(|(p, t)| (p.as_str(), t.as_str())).collect();
        store
            .upsert_endpoints("alpha", endpoints("alpha", &refs))
            .await
            .expect("upsert");

        let page = store.query(&CatalogQuery::new("widget", 5)).await.expect("query");
        assert_eq!(page.total_found, 12);
        assert_eq!(page.hits.len(), 5);
        assert_eq!(page.hits[0].endpoint.path, "/widgets/0");
    }

    #[tokio::test]
    async fn registered_providers_are_listed_in_order() {
        let store = catalog();
        store
            .upsert_provider(Provider::new("gamma", "Gamma Mail", "https://gamma.example"))
            .await
            .expect("provider");
        store
            .upsert_provider(Provider::new("alpha", "Alpha Cloud v2", "https://alpha.example"))
            .await
            .expect("provider");

        let providers = store.providers().await.expect("providers");
        let names: Vec<&str> = providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta", "gamma"]);
        assert_eq!(providers[0].display_name, "Alpha Cloud v2");
    }

    #[tokio::test]
    async fn hits_across_providers_keep_their_own_display_name() {
        let store: Arc<dyn CatalogStore> = Arc::new(catalog());
        store
            .upsert_endpoints("alpha", endpoints("alpha", &[("/tickets", "Get ticket")]))
            .await
            .expect("upsert");
        store
            .upsert_endpoints(
                "beta",
                endpoints("beta", &[("/tickets", "List tickets"), ("/tickets/{id}", "Ticket")]),
            )
            .await
            .expect("upsert");

        let page = store.query(&CatalogQuery::new("ticket", 10)).await.expect("query");
        assert_eq!(page.total_found, 3);
        for hit in &page.hits {
            let expected = match hit.endpoint.provider.as_str() {
                "alpha" => "Alpha Cloud",
                "beta" => "Beta Ops",
                other => panic!("unexpected provider {other}"),
            };
            assert_eq!(hit.provider_display_name, expected);
        }
    }
}
