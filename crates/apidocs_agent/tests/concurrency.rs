mod common;

use apidocs_agent::{AgentConfig, QueryRequest};
use apidocs_models::llm::{GenerationError, GenerationRequest, GenerationResponse, LlmProvider};
use async_trait::async_trait;
use common::assistant;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Records the highest number of overlapping generate calls.
#[derive(Default)]
struct OverlapProbe {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl LlmProvider for OverlapProbe {
    async fn generate(
        &self,
        _model: &str,
        _request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(GenerationResponse::from_text("ok"))
    }
}

#[tokio::test]
async fn requests_for_one_session_do_not_interleave() {
    let probe = Arc::new(OverlapProbe::default());
    let assistant = assistant(probe.clone(), AgentConfig::default()).await;

    let (a, b, c) = tokio::join!(
        assistant.ask(QueryRequest::new("first").in_session("shared")),
        assistant.ask(QueryRequest::new("second").in_session("shared")),
        assistant.ask(QueryRequest::new("third").in_session("shared")),
    );
    assert!([a, b, c].iter().all(|response| response.session_id == "shared"));
    assert_eq!(probe.peak.load(Ordering::SeqCst), 1);

    let session = assistant.sessions().get("shared").await.expect("session kept");
    assert_eq!(session.query_count(), 3);
    assert_eq!(session.turn_count(), 3);
    assert!(session.check_integrity().is_ok());
}

#[tokio::test]
async fn different_sessions_run_side_by_side() {
    let probe = Arc::new(OverlapProbe::default());
    let assistant = assistant(probe.clone(), AgentConfig::default()).await;

    let (a, b) = tokio::join!(
        assistant.ask(QueryRequest::new("first").in_session("one")),
        assistant.ask(QueryRequest::new("second").in_session("two")),
    );
    assert_ne!(a.session_id, b.session_id);
    assert_eq!(probe.peak.load(Ordering::SeqCst), 2);
    assert_eq!(assistant.sessions().len(), 2);
}
