//! API documentation catalog.
//!
//! This crate turns OpenAPI / Swagger documents into normalized [`Endpoint`]
//! records and serves ranked keyword retrieval over them, from two sources:
//!
//! - the persisted catalog ([`CatalogStore`]), filled by batch ingestion of
//!   known providers through [`Ingestor`];
//! - the dynamic spec cache ([`DynamicSpecCache`]), filled on demand from an
//!   arbitrary specification URL.
//!
//! [`DocsService`] exposes both behind the operations the assistant's tools
//! call, and keeps a [`QueryLog`] of searches and an [`IngestHistory`] of
//! ingestion runs for usage reporting.
//!
//! # Example
//!
//! ```
//! use apidocs_catalog::{DynamicSpecCache, HttpSpecFetcher, SpecSearch, SpecSearchOutcome};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let cache = DynamicSpecCache::new(Arc::new(HttpSpecFetcher::default()));
//! let spec = json!({ "paths": { "/pets": { "get": { "summary": "List pets" } } } });
//! cache.load_document("petstore", "inline", &spec).unwrap();
//!
//! let outcome = cache.search_openapi(&SpecSearch {
//!     provider: "petstore".into(),
//!     query: "pets".into(),
//!     ..SpecSearch::default()
//! });
//! let SpecSearchOutcome::Found(results) = outcome else { unreachable!() };
//! assert_eq!(results.results[0].id, "petstore:/pets:GET");
//! ```

mod activity;
mod cache;
mod endpoint;
mod error;
mod fetch;
mod ingest;
mod normalize;
mod rank;
mod service;
mod store;

pub use activity::{
    DEFAULT_INGEST_HISTORY_CAPACITY, DEFAULT_QUERY_LOG_CAPACITY, IngestHistory, IngestRun,
    ProviderIngestStats, QueryLog, QueryRecord, SUCCESS_RATE_WINDOW, SearchAnalytics,
    TOP_QUERY_COUNT, TopQuery,
};
pub use cache::{
    DEFAULT_SEARCH_LIMIT, DynamicSpecCache, EndpointSummary, LoadSummary, LoadedSpec,
    MAX_SEARCH_LIMIT, NotLoaded, SAMPLE_SIZE, SearchHit, SearchResults, SpecSearch,
    SpecSearchOutcome,
};
pub use endpoint::{Endpoint, HttpMethod, Parameter, Provider, default_providers, endpoint_id};
pub use error::CatalogError;
pub use fetch::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_SPEC_BYTES, FetchConfig, HttpSpecFetcher, SpecFetcher,
};
pub use ingest::{IngestFailure, IngestOutcome, IngestReport, IngestStatus, Ingestor};
pub use normalize::{merge_endpoints, normalize, normalize_documents};
pub use rank::{CleanedQuery, NOISE_WORDS, Scored, clamp_limit, rank, truncate_chars};
pub use service::{
    DEFAULT_DOC_LIMIT, DESCRIPTION_PREVIEW_CHARS, DocHit, DocSearch, DocSearchResults, DocsService,
    EndpointDetails, MAX_DOC_LIMIT, ProviderInfo, ProviderListing, UsageAnalytics,
};
pub use store::{
    CatalogHit, CatalogPage, CatalogQuery, CatalogStore, MemoryCatalog, StoredEndpoint,
    UpsertStats,
};
