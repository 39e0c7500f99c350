//! Scripted providers for exercising model consumers without a network.

use super::error::GenerationError;
use super::provider::LlmProvider;
use super::types::{GenerationRequest, GenerationResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

type Responder =
    Box<dyn Fn(&GenerationRequest) -> Result<GenerationResponse, GenerationError> + Send + Sync>;

/// Replays a fixed script of responses, then falls back to a responder.
///
/// Every received request is recorded for later inspection.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<GenerationResponse, GenerationError>>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    /// Replays `script` in order. Further calls fail with
    /// [`GenerationError::InvalidResponse`].
    #[must_use]
    pub fn new(script: Vec<Result<GenerationResponse, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            responder: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with `responder`.
    #[must_use]
    pub fn repeating<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<GenerationResponse, GenerationError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(responder)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    /// Number of generate calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(
        &self,
        _model: &str,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let next = self.script.lock().pop_front();
        let result = match (next, &self.responder) {
            (Some(scripted), _) => scripted,
            (None, Some(responder)) => responder(&request),
            (None, None) => Err(GenerationError::InvalidResponse(
                "script exhausted".to_string(),
            )),
        };
        self.requests.lock().push(request);
        result
    }
}
