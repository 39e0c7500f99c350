//! The query endpoint: classification, session bookkeeping and the tool loop.

use crate::classifier::{Classification, IntentType, QueryClassifier, SessionFactors};
use crate::config::AgentConfig;
use crate::orchestrator::{Conversation, OutcomeKind, ToolOrchestrator};
use crate::prompt::{PromptContext, system_prompt};
use crate::session::{SessionStats, SessionStore, Turn};
use crate::tools::{DocTool, documentation_tools};
use apidocs_catalog::{CatalogError, DocHit, DocSearch, DocsService, HttpMethod};
use apidocs_core::Clock;
use apidocs_models::llm::{Llm, ToolDefinition};
use apidocs_tools::{RegistrationError, ToolRegistry};
use core::fmt::Write;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Catalog matches listed in a fallback answer.
const FALLBACK_RESULTS: i64 = 3;

/// The assistant could not be assembled.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Reading providers for the tool schemas failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A tool definition was rejected.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Optional caller context for a query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryContext {
    /// Provider the caller is asking about.
    pub provider: Option<String>,
    /// HTTP method the caller is interested in.
    pub http_method: Option<HttpMethod>,
}

/// Input of [`Assistant::ask`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRequest {
    /// Free-text question.
    pub query: String,
    /// Optional caller context.
    #[serde(default)]
    pub context: Option<QueryContext>,
    /// Session to continue. A new session is created when absent.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl QueryRequest {
    /// A query with no context that starts a new session.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Continues `session_id`.
    #[must_use]
    pub fn in_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attaches caller context.
    #[must_use]
    pub fn with_context(mut self, context: QueryContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// Intent summary in a [`QueryResponse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentSummary {
    /// Detected intent.
    #[serde(rename = "type")]
    pub intent_type: IntentType,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f64,
    /// Tools preferred for this intent.
    pub tools: Vec<DocTool>,
}

/// Output of [`Assistant::ask`].
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// The question as asked.
    pub query: String,
    /// Classifier output.
    pub intent: IntentSummary,
    /// Answer text.
    pub response: String,
    /// Session the query was recorded in.
    pub session_id: String,
    /// Whether `response` is the deterministic fallback rather than a model
    /// answer.
    pub fallback: bool,
    /// Whether the tool round limit cut the answer short.
    pub truncated: bool,
    /// Tools called while answering.
    pub tools_used: Vec<String>,
}

/// Snapshot for health and status views.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantStatus {
    /// Whether a model is available.
    pub model_configured: bool,
    /// Model name, when configured.
    pub model: Option<String>,
    /// Registered tool names.
    pub tools: Vec<String>,
    /// Session totals.
    pub sessions: SessionStats,
}

#[derive(Debug, Clone, Copy)]
enum FallbackReason {
    NotConfigured,
    Unavailable,
}

impl FallbackReason {
    fn notice(self) -> &'static str {
        match self {
            Self::NotConfigured => {
                "[fallback] The AI assistant is not configured, so this answer comes from a \
                 plain documentation search."
            }
            Self::Unavailable => {
                "[fallback] The AI assistant is unavailable right now, so this answer comes \
                 from a plain documentation search."
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for [`Assistant`].
#[derive(Debug)]
pub struct AssistantBuilder {
    service: DocsService,
    model: Option<Llm>,
    config: AgentConfig,
    clock: Clock,
}

impl AssistantBuilder {
    /// Sets the model. Without one the assistant answers with fallbacks.
    #[must_use]
    pub fn model(mut self, model: Option<Llm>) -> Self {
        self.model = model;
        self
    }

    /// Sets loop and session limits.
    #[must_use]
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the time source for session expiry.
    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Registers the documentation tools and assembles the assistant.
    ///
    /// # Errors
    ///
    /// [`AgentError`] when providers cannot be read or a tool is rejected.
    pub async fn build(self) -> Result<Assistant, AgentError> {
        let providers: Vec<String> = self
            .service
            .store()
            .providers()
            .await?
            .into_iter()
            .filter(|provider| provider.active)
            .map(|provider| provider.name)
            .collect();
        let tools = Arc::new(documentation_tools(&self.service, &providers)?);

        let orchestrator = self.model.map(|llm| {
            ToolOrchestrator::new(llm, Arc::clone(&tools), self.config.orchestrator.clone())
        });
        if orchestrator.is_none() {
            tracing::warn!("no model configured, answers will use the search fallback");
        }

        Ok(Assistant {
            service: self.service,
            tools,
            orchestrator,
            classifier: QueryClassifier::new(),
            sessions: SessionStore::new(self.config.sessions, self.clock),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Assistant
// ─────────────────────────────────────────────────────────────────────────────

/// Answers documentation questions.
///
/// Requests for different sessions run concurrently; requests for one
/// session are serialized by the session lock for their whole duration.
#[derive(Debug)]
pub struct Assistant {
    service: DocsService,
    tools: Arc<ToolRegistry>,
    orchestrator: Option<ToolOrchestrator>,
    classifier: QueryClassifier,
    sessions: SessionStore,
}

impl Assistant {
    /// Starts building an assistant over `service`.
    #[must_use]
    pub fn builder(service: DocsService) -> AssistantBuilder {
        AssistantBuilder {
            service,
            model: None,
            config: AgentConfig::default(),
            clock: Clock::system(),
        }
    }

    /// Session store.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Registered documentation tools.
    #[must_use]
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Classifies `query` in light of the session's history. An unknown or
    /// absent session classifies as a first query.
    pub async fn classify(&self, query: &str, session_id: Option<&str>) -> Classification {
        let factors = match session_id {
            Some(id) => self
                .sessions
                .get(id)
                .await
                .map_or_else(|_| SessionFactors::default(), |session| session.factors()),
            None => SessionFactors::default(),
        };
        self.classifier.classify(query, factors)
    }

    /// Answers one query and records it in its session.
    pub async fn ask(&self, request: QueryRequest) -> QueryResponse {
        let QueryRequest {
            query,
            context,
            session_id,
        } = request;
        let context = context.unwrap_or_default();

        let (session_id, mut session) = self.sessions.acquire(session_id.as_deref()).await;
        if let Err(err) = session.check_integrity() {
            tracing::warn!(error = %err, "discarding corrupted session history");
            session.reset_history();
        }

        let classification = self.classifier.classify(&query, session.factors());
        session.record_query(classification.intent_type);
        tracing::info!(
            session = %session_id,
            intent = classification.intent_type.as_str(),
            provider = classification.provider_hint.as_deref().unwrap_or("none"),
            "query classified"
        );

        let intent = IntentSummary {
            intent_type: classification.intent_type,
            confidence: classification.confidence,
            tools: classification.tool_set.clone(),
        };

        let Some(orchestrator) = &self.orchestrator else {
            let response = self
                .fallback(FallbackReason::NotConfigured, &classification, &context)
                .await;
            return QueryResponse {
                query,
                intent,
                response,
                session_id,
                fallback: true,
                truncated: false,
                tools_used: Vec::new(),
            };
        };

        let loaded = self.service.cache().loaded();
        let system = system_prompt(PromptContext {
            classification: &classification,
            provider: context.provider.as_deref(),
            loaded: &loaded,
        });
        let outcome = orchestrator
            .run(Conversation {
                system,
                history: session.history(),
                query: query.clone(),
                tools: self.ordered_definitions(&classification.tool_set),
            })
            .await;

        if outcome.kind == OutcomeKind::Failed {
            let response = self
                .fallback(FallbackReason::Unavailable, &classification, &context)
                .await;
            return QueryResponse {
                query,
                intent,
                response,
                session_id,
                fallback: true,
                truncated: false,
                tools_used: outcome.tools_used,
            };
        }

        let mut turn = Turn::new(query.clone());
        for message in outcome.messages {
            turn.push(message);
        }
        session.push_turn(turn, self.sessions.config().max_history_turns);
        tracing::info!(
            session = %session_id,
            rounds = outcome.rounds,
            tools = outcome.tools_used.len(),
            "query answered"
        );

        QueryResponse {
            query,
            intent,
            response: outcome.text,
            session_id,
            fallback: false,
            truncated: outcome.kind == OutcomeKind::RoundLimit,
            tools_used: outcome.tools_used,
        }
    }

    /// Model, tool and session overview. Does not wait for in-flight
    /// requests.
    #[must_use]
    pub fn status(&self) -> AssistantStatus {
        AssistantStatus {
            model_configured: self.orchestrator.is_some(),
            model: self
                .orchestrator
                .as_ref()
                .map(|orchestrator| orchestrator.llm().model_name().to_owned()),
            tools: self.tools.names().into_iter().map(str::to_owned).collect(),
            sessions: self.sessions.stats(),
        }
    }

    /// Tool definitions with the preferred tools first, the rest in their
    /// usual order.
    fn ordered_definitions(&self, preferred: &[DocTool]) -> Vec<ToolDefinition> {
        let rest = DocTool::ALL.into_iter().filter(|tool| !preferred.contains(tool));
        preferred
            .iter()
            .copied()
            .chain(rest)
            .filter_map(|tool| self.tools.get(tool.name()))
            .map(|tool| tool.definition())
            .collect()
    }

    /// Deterministic answer built from a catalog search.
    async fn fallback(
        &self,
        reason: FallbackReason,
        classification: &Classification,
        context: &QueryContext,
    ) -> String {
        let search = DocSearch {
            query: classification.cleaned_query.clone(),
            provider: context
                .provider
                .clone()
                .or_else(|| classification.provider_hint.clone()),
            http_method: context.http_method,
            limit: Some(FALLBACK_RESULTS),
        };
        let hits = match self.service.search_documentation(&search).await {
            Ok(results) => results.results,
            Err(err) => {
                tracing::debug!(error = %err, "fallback search failed");
                Vec::new()
            }
        };
        fallback_text(reason, &classification.cleaned_query, &hits)
    }
}

fn fallback_text(reason: FallbackReason, query: &str, hits: &[DocHit]) -> String {
    let mut text = String::from(reason.notice());
    if hits.is_empty() {
        let _ = write!(text, "\n\nNo documented endpoints matched \"{query}\".");
        return text;
    }
    text.push_str("\n\nClosest documented endpoints:");
    for hit in hits {
        let _ = write!(
            text,
            "\n- {} {} ({}): {} [{}]",
            hit.http_method, hit.endpoint_path, hit.provider, hit.title, hit.id
        );
    }
    text
}
