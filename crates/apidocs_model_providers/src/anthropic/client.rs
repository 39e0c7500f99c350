//! Thin HTTP wrapper around the Messages endpoint.

use super::types::{CreateMessageRequest, MessageResponse};
use crate::http::{status_error, transport_error};
use apidocs_models::llm::GenerationError;
use reqwest::header::HeaderValue;

const API_VERSION: &str = "2023-06-01";
const PUBLIC_HOST: &str = "https://api.anthropic.com";

#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    host: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            host: PUBLIC_HOST.to_owned(),
        }
    }

    pub fn with_base_url(self, host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..self
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.host.trim_end_matches('/'))
    }

    pub async fn create_message(
        &self,
        request: &CreateMessageRequest,
    ) -> Result<MessageResponse, GenerationError> {
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| GenerationError::Auth("API key is not a valid header value".into()))?;

        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", key)
            .header("anthropic-version", API_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|err| transport_error(&err))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|err| transport_error(&err))?;
        if !status.is_success() {
            return Err(status_error(status, &headers, body));
        }

        serde_json::from_str(&body).map_err(|err| {
            GenerationError::InvalidResponse(format!("unreadable messages response: {err}"))
        })
    }
}

impl core::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}
