//! Shared fixtures for catalog integration tests.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared fixtures, not every item is used by every test binary"
)]

use apidocs_catalog::{CatalogError, SpecFetcher};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// Serves canned documents by URL and records every request.
#[derive(Default)]
pub struct StaticFetcher {
    documents: HashMap<String, Value>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, document: Value) -> Self {
        self.documents.insert(url.to_owned(), document);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SpecFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, CatalogError> {
        self.requests.lock().push(url.to_owned());
        self.documents.get(url).cloned().ok_or(CatalogError::Fetch {
            url: url.to_owned(),
            message: "HTTP 404 Not Found".to_owned(),
        })
    }
}

pub fn petstore() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": { "title": "Swagger Petstore", "version": "1.0.0" },
        "paths": {
            "/pets": {
                "get": {
                    "summary": "List all pets",
                    "tags": ["pets"],
                    "responses": { "200": { "description": "A paged array of pets" } }
                },
                "post": {
                    "summary": "Create a pet",
                    "tags": ["pets"],
                    "responses": { "201": { "description": "Null response" } }
                }
            },
            "/store/orders": {
                "get": {
                    "summary": "List orders",
                    "description": "Orders placed in the store",
                    "tags": ["store"]
                }
            }
        }
    })
}

/// A document with `count` GET operations under `/{prefix}/resource{i}`.
pub fn synthetic_spec(prefix: &str, count: usize) -> Value {
    let mut paths = Map::new();
    for i in 0..count {
        paths.insert(
            format!("/{prefix}/resource{i}"),
            json!({ "get": { "summary": format!("Read {prefix} resource {i}") } }),
        );
    }
    json!({ "swagger": "2.0", "info": { "version": "v1" }, "paths": paths })
}
