//! Batch ingestion of provider specifications into the persisted catalog.
//!
//! Each provider is fetched, normalized and upserted independently. A failure
//! is recorded in that provider's [`IngestOutcome`] and never aborts the rest
//! of the batch. Ingestions of the same provider are serialized, and every
//! run is recorded in an [`IngestHistory`].

use crate::activity::{IngestHistory, IngestRun};
use crate::endpoint::Provider;
use crate::error::CatalogError;
use crate::fetch::SpecFetcher;
use crate::normalize::{merge_endpoints, normalize};
use crate::store::CatalogStore;
use chrono::Utc;
use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Whether a provider was ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    /// Endpoints were replaced.
    Success,
    /// Nothing was written for this provider.
    Failed,
}

/// Where and why an ingestion failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestFailure {
    /// Specification URL involved, when the failure is tied to one.
    pub url: Option<String>,
    /// Error text.
    pub message: String,
}

/// Per-provider ingestion result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    /// Provider name.
    pub provider: String,
    /// Success or failure.
    pub status: IngestStatus,
    /// Endpoints stored after ingestion.
    pub total_endpoints: usize,
    /// Endpoints that did not exist before.
    pub new_endpoints: usize,
    /// Endpoints that replaced an existing record.
    pub updated_endpoints: usize,
    /// Present when `status` is [`IngestStatus::Failed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<IngestFailure>,
}

impl IngestOutcome {
    fn failed(provider: &str, url: Option<&str>, err: &CatalogError) -> Self {
        Self {
            provider: provider.to_owned(),
            status: IngestStatus::Failed,
            total_endpoints: 0,
            new_endpoints: 0,
            updated_endpoints: 0,
            error: Some(IngestFailure {
                url: url.map(str::to_owned).or_else(|| err.url().map(str::to_owned)),
                message: err.to_string(),
            }),
        }
    }
}

/// Results of a batch run, in provider order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// One entry per provider attempted.
    pub outcomes: Vec<IngestOutcome>,
}

impl IngestReport {
    /// Providers ingested successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == IngestStatus::Success)
            .count()
    }

    /// Providers that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Endpoints stored across all successful providers.
    #[must_use]
    pub fn total_endpoints(&self) -> usize {
        self.outcomes.iter().map(|o| o.total_endpoints).sum()
    }
}

/// Fetches provider specifications and writes them to a [`CatalogStore`].
pub struct Ingestor {
    store: Arc<dyn CatalogStore>,
    fetcher: Arc<dyn SpecFetcher>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    history: Arc<IngestHistory>,
}

impl Ingestor {
    /// Creates an ingestor over a store and a fetcher.
    pub fn new(store: Arc<dyn CatalogStore>, fetcher: Arc<dyn SpecFetcher>) -> Self {
        Self {
            store,
            fetcher,
            locks: DashMap::new(),
            history: Arc::new(IngestHistory::default()),
        }
    }

    /// Records runs in `history` instead of a private one.
    #[must_use]
    pub fn with_history(mut self, history: Arc<IngestHistory>) -> Self {
        self.history = history;
        self
    }

    /// Runs recorded so far.
    #[must_use]
    pub fn history(&self) -> &Arc<IngestHistory> {
        &self.history
    }

    /// Ingests every active provider concurrently.
    ///
    /// # Errors
    ///
    /// Only when the provider list itself cannot be read.
    pub async fn ingest_all(&self) -> Result<IngestReport, CatalogError> {
        let providers: Vec<Provider> = self
            .store
            .providers()
            .await?
            .into_iter()
            .filter(|p| p.active)
            .collect();
        tracing::info!(providers = providers.len(), "starting ingestion");

        let outcomes = join_all(providers.iter().map(|p| self.ingest_provider(p))).await;
        let report = IngestReport { outcomes };
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            endpoints = report.total_endpoints(),
            "ingestion finished"
        );
        Ok(report)
    }

    /// Ingests one provider by name.
    ///
    /// # Errors
    ///
    /// [`CatalogError::UnknownProvider`] when no such provider is registered.
    pub async fn ingest_named(&self, name: &str) -> Result<IngestOutcome, CatalogError> {
        let provider = self
            .store
            .providers()
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| CatalogError::UnknownProvider(name.to_owned()))?;
        Ok(self.ingest_provider(&provider).await)
    }

    /// Ingests one provider, merging all of its specification documents.
    pub async fn ingest_provider(&self, provider: &Provider) -> IngestOutcome {
        let lock = Arc::clone(
            self.locks
                .entry(provider.name.clone())
                .or_default()
                .value(),
        );
        let _guard = lock.lock().await;

        let started_at = Utc::now();
        let outcome = self.run(provider).await;
        self.history.record(IngestRun {
            outcome: outcome.clone(),
            started_at,
            completed_at: Utc::now(),
        });
        outcome
    }

    async fn run(&self, provider: &Provider) -> IngestOutcome {
        let name = provider.name.as_str();

        if provider.spec_urls.is_empty() {
            let err = CatalogError::parse("no specification URL configured");
            tracing::warn!(provider = name, "skipping provider without specification URL");
            return IngestOutcome::failed(name, None, &err);
        }

        let mut batches = Vec::with_capacity(provider.spec_urls.len());
        for url in &provider.spec_urls {
            let batch = match self.fetcher.fetch(url).await {
                Ok(document) => normalize(name, &document),
                Err(err) => Err(err),
            };
            match batch {
                Ok(batch) => batches.push(batch),
                Err(err) => {
                    tracing::warn!(provider = name, url = %url, error = %err, "specification rejected");
                    return IngestOutcome::failed(name, Some(url), &err);
                }
            }
        }
        let endpoints = merge_endpoints(batches);

        match self.store.upsert_endpoints(name, endpoints).await {
            Ok(stats) => {
                tracing::info!(
                    provider = name,
                    total = stats.total,
                    new = stats.new,
                    updated = stats.updated,
                    removed = stats.removed,
                    "provider ingested"
                );
                IngestOutcome {
                    provider: name.to_owned(),
                    status: IngestStatus::Success,
                    total_endpoints: stats.total,
                    new_endpoints: stats.new,
                    updated_endpoints: stats.updated,
                    error: None,
                }
            }
            Err(err) => {
                tracing::warn!(provider = name, error = %err, "upsert failed");
                IngestOutcome::failed(name, None, &err)
            }
        }
    }
}
