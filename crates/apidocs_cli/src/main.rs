//! `apidocs` command-line front end.
//!
//! The persisted catalog lives in memory, so commands that read it ingest
//! the configured providers first.
//!
//! ```bash
//! apidocs ingest --provider kubernetes
//! apidocs load petstore https://petstore3.swagger.io/api/v3/openapi.json --query pet
//! apidocs search "create issue" --provider atlassian --method post
//! apidocs ask "How do I list pods in a namespace?"
//! ```

#![expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "command output goes to the terminal"
)]

use apidocs_agent::{AgentConfig, AgentError, Assistant, QueryRequest};
use apidocs_catalog::{
    CatalogError, CatalogStore, DocSearch, DocsService, DynamicSpecCache, FetchConfig,
    HttpMethod, HttpSpecFetcher, Ingestor, MemoryCatalog, SpecFetcher, SpecSearch,
    default_providers,
};
use apidocs_core::{ConfigError, Settings, TracingSetup};
use apidocs_model_providers::{ProviderKeys, register_providers};
use apidocs_models::ModelRegistry;
use apidocs_models::error::CreateModelError;
use apidocs_models::llm::Llm;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "apidocs")]
#[command(about = "Search API documentation and ask questions about it")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Fetch and index provider specifications
    Ingest {
        /// Only this provider
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Load an OpenAPI document from a URL without persisting it
    Load {
        /// Name to file the endpoints under
        provider: String,
        /// Specification URL
        url: String,
        /// Search the loaded endpoints right away
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Keyword search over the indexed documentation
    Search {
        /// Search text
        query: String,
        /// Restrict to one provider
        #[arg(short, long)]
        provider: Option<String>,
        /// Restrict to one HTTP method
        #[arg(short, long, value_parser = parse_method)]
        method: Option<HttpMethod>,
        /// Maximum results [default: 5]
        #[arg(short = 'n', long)]
        limit: Option<i64>,
    },

    /// Ask the assistant a question
    Ask {
        /// The question
        query: String,
        /// Session to continue
        #[arg(short, long)]
        session: Option<String>,
    },
}

fn parse_method(s: &str) -> Result<HttpMethod, String> {
    s.parse()
}

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("model: {0}")]
    Model(#[from] CreateModelError),

    #[error("output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Process-wide wiring shared by every command.
struct App {
    settings: Settings,
    store: Arc<MemoryCatalog>,
    fetcher: Arc<dyn SpecFetcher>,
    service: DocsService,
}

impl App {
    fn new(settings: Settings) -> Self {
        let fetcher: Arc<dyn SpecFetcher> = Arc::new(HttpSpecFetcher::new(FetchConfig {
            timeout: settings.fetch_timeout,
            max_bytes: settings.fetch_max_bytes,
        }));
        let store = Arc::new(MemoryCatalog::with_providers(default_providers()));
        let service = DocsService::new(
            Arc::clone(&store) as Arc<dyn CatalogStore>,
            Arc::new(DynamicSpecCache::new(Arc::clone(&fetcher))),
        );
        Self {
            settings,
            store,
            fetcher,
            service,
        }
    }

    /// Ingestor whose runs land in the service's ingestion history.
    fn ingestor(&self) -> Ingestor {
        Ingestor::new(
            Arc::clone(&self.store) as Arc<dyn CatalogStore>,
            Arc::clone(&self.fetcher),
        )
        .with_history(Arc::clone(self.service.ingest_history()))
    }

    async fn ingest(&self, provider: Option<&str>) -> Result<(), CliError> {
        let ingestor = self.ingestor();
        match provider {
            Some(name) => {
                let outcome = ingestor.ingest_named(name).await?;
                print_json(&outcome)
            }
            None => {
                let report = ingestor.ingest_all().await?;
                tracing::info!(
                    succeeded = report.succeeded(),
                    failed = report.failed(),
                    endpoints = report.total_endpoints(),
                    "ingestion finished"
                );
                print_json(&report)
            }
        }
    }

    /// Ingests quietly before a read. Failures were already logged per
    /// provider, so only an unknown provider name stops the command.
    async fn prepare(&self, provider: Option<&str>) -> Result<(), CliError> {
        let ingestor = self.ingestor();
        match provider {
            Some(name) => {
                ingestor.ingest_named(name).await?;
            }
            None => {
                ingestor.ingest_all().await?;
            }
        }
        Ok(())
    }

    fn model(&self) -> Result<Option<Llm>, CliError> {
        if !self.settings.llm_credentials_present() {
            tracing::warn!(
                provider = self.settings.llm_provider(),
                "no credentials for the model provider"
            );
            return Ok(None);
        }
        let mut registry = ModelRegistry::new();
        register_providers(
            &mut registry,
            &ProviderKeys {
                anthropic: self.settings.anthropic_api_key.clone(),
                openai: self.settings.openai_api_key.clone(),
            },
        );
        Ok(Some(registry.llm(&self.settings.llm_model)?))
    }

    async fn run(self, command: Commands) -> Result<(), CliError> {
        match command {
            Commands::Ingest { provider } => self.ingest(provider.as_deref()).await,
            Commands::Load {
                provider,
                url,
                query,
            } => {
                let summary = self.service.load_openapi(&provider, &url).await?;
                print_json(&summary)?;
                if let Some(query) = query {
                    let results = self.service.search_openapi(&SpecSearch {
                        provider,
                        query,
                        http_method: None,
                        limit: None,
                    });
                    print_json(&results)?;
                }
                Ok(())
            }
            Commands::Search {
                query,
                provider,
                method,
                limit,
            } => {
                self.prepare(provider.as_deref()).await?;
                let results = self
                    .service
                    .search_documentation(&DocSearch {
                        query,
                        provider,
                        http_method: method,
                        limit,
                    })
                    .await?;
                print_json(&results)
            }
            Commands::Ask { query, session } => {
                self.prepare(None).await?;
                let assistant = Assistant::builder(self.service.clone())
                    .model(self.model()?)
                    .config(AgentConfig::from_settings(&self.settings))
                    .build()
                    .await?;
                let mut request = QueryRequest::new(query);
                if let Some(session) = session {
                    request = request.in_session(session);
                }
                let response = assistant.ask(request).await;
                eprintln!(
                    "intent: {} ({:.2}) | session: {}",
                    response.intent.intent_type.as_str(),
                    response.intent.confidence,
                    response.session_id
                );
                println!("{}", response.response);
                Ok(())
            }
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::from(2);
        }
    };

    let mut tracing = TracingSetup::new().with_format(settings.log_format);
    if let Some(filter) = &settings.log_filter {
        tracing = tracing.with_env_filter(filter);
    }
    tracing.init();

    match App::new(settings).run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
